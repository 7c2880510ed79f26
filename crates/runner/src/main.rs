//! Tickscript runner
//!
//! Loads a script, compiles it and drives the VM at a fixed tick rate.
//! Console output goes to stdout; draw requests are logged.

mod host;

use anyhow::{bail, Context};
use host::{Frame, ScriptHost};
use std::sync::Arc;
use tickscript_config::RunnerConfig;
use tickscript_scripting::{Builtins, Compiler, Program};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = RunnerConfig::load_default();

    // Initialize tracing; RUST_LOG wins over the configured level
    let level = loaded
        .as_ref()
        .map(|config| config.log_level.clone())
        .unwrap_or_else(|_| "info".into());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = loaded.context("failed to load tickscript.txt")?;
    if let Some(script) = std::env::args().nth(1) {
        config.script = script.into();
    }
    config.display();

    let source = tokio::fs::read_to_string(&config.script)
        .await
        .with_context(|| format!("failed to read {}", config.script.display()))?;

    let builtins = Arc::new(Builtins::standard());
    debug!("Builtins: {}", builtins.names().join(", "));
    let program = Program::load(&source)
        .with_context(|| format!("failed to load {}", config.script.display()))?;

    if config.dump_ast {
        println!("{}", serde_json::to_string_pretty(&program)?);
    }

    let function = Compiler::new(&builtins)
        .compile(&program)
        .with_context(|| format!("failed to compile {}", config.script.display()))?;

    for index in function.unresolved_jumps() {
        warn!("jump at {:04} has no target and will fault if taken", index);
    }

    if config.dump_bytecode {
        print!("{}", function.disassemble(&config.script.display().to_string()));
    }

    info!("Running {} ({} instructions)", config.script.display(), function.len());

    let mut host = ScriptHost::new(builtins);
    let mut ticker = tokio::time::interval(config.tick_interval());
    // The first tick completes immediately
    ticker.tick().await;

    let mut frame = host.start(function);
    loop {
        report(&frame);

        if let Some(fault) = &frame.fault {
            error!("Script aborted on tick {}: {}", frame.tick, fault);
            bail!("script aborted");
        }

        if frame.is_last() {
            info!("Script finished after {} ticks", frame.tick);
            break;
        }

        if config.max_ticks != 0 && host.ticks() >= config.max_ticks {
            info!("Tick limit reached ({}), stopping", config.max_ticks);
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}

            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping");
                break;
            }
        }

        frame = host.tick();
    }

    Ok(())
}

fn report(frame: &Frame) {
    for line in &frame.console {
        println!("{}", line);
    }

    for triangle in &frame.triangles {
        info!(tick = frame.tick, "draw {}", triangle);
        debug!(vertices = ?triangle.vertices(), "triangle corners");
    }

    debug!(tick = frame.tick, status = ?frame.status, "tick done");
}
