//! Tickscript Runner Configuration
//!
//! Loads runner settings from `tickscript.txt`, one `key = value` per line.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tickscript_core::TickError;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tickscript.txt";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for TickError {
    fn from(err: ConfigError) -> Self {
        TickError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Runner configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Program to run (from "script" option)
    pub script: PathBuf,
    /// Ticks per second (from "tickrate" option, default: 60)
    pub tick_rate: u32,
    /// Stop after this many ticks, 0 for no limit (from "maxticks" option)
    pub max_ticks: u64,
    /// Print the parsed tree as JSON before running (from "dumpast" option)
    pub dump_ast: bool,
    /// Print the disassembled bytecode before running (from "dumpbytecode" option)
    pub dump_bytecode: bool,
    /// Default log filter (from "loglevel" option)
    pub log_level: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from("main.tick"),
            tick_rate: 60,
            max_ticks: 0,
            dump_ast: false,
            dump_bytecode: false,
            log_level: "info".into(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `tickscript.txt` from the working directory, falling back to
    /// defaults when it doesn't exist
    pub fn load_default() -> Result<Self> {
        if !Path::new(DEFAULT_CONFIG_FILE).exists() {
            tracing::debug!("{} not found, using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }
        Self::load_from_file(DEFAULT_CONFIG_FILE)
    }

    /// Parse config file content
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();

                config.parse_option(key, value)?;
            } else {
                tracing::warn!("Ignoring config line without '=': {}", line);
            }
        }

        Ok(config)
    }

    fn parse_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "script" => self.script = PathBuf::from(value),
            "tickrate" => {
                self.tick_rate = parse_value(key, value)?;
                if self.tick_rate == 0 {
                    return Err(invalid(key, value));
                }
            }
            "maxticks" => self.max_ticks = parse_value(key, value)?,
            "dumpast" => self.dump_ast = parse_value(key, value)?,
            "dumpbytecode" => self.dump_bytecode = parse_value(key, value)?,
            "loglevel" => self.log_level = value.to_lowercase(),
            _ => {
                tracing::warn!("Unknown config option: {} = {}", key, value);
            }
        }
        Ok(())
    }

    /// Time between two ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Runner configuration:");
        tracing::info!("  Script: {}", self.script.display());
        tracing::info!("  Tick rate: {}/s ({:?} per tick)", self.tick_rate, self.tick_interval());
        if self.max_ticks == 0 {
            tracing::info!("  Max ticks: unlimited");
        } else {
            tracing::info!("  Max ticks: {}", self.max_ticks);
        }
        tracing::info!("  Dump AST: {}", self.dump_ast);
        tracing::info!("  Dump bytecode: {}", self.dump_bytecode);
        tracing::info!("  Log level: {}", self.log_level);
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
