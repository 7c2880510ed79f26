//! Frame-driven script host
//!
//! Owns the VM and drains the script's output once per tick.

use std::sync::Arc;
use tickscript_core::Triangle;
use tickscript_scripting::{Builtins, Function, ScriptContext, ScriptError, VmStatus, VM};

/// Everything a script produced during one tick
#[derive(Debug)]
pub struct Frame {
    pub tick: u64,
    pub status: VmStatus,
    pub console: Vec<String>,
    pub triangles: Vec<Triangle>,
    /// Set when the script aborted during this tick
    pub fault: Option<ScriptError>,
}

impl Frame {
    pub fn is_last(&self) -> bool {
        self.status == VmStatus::Finished
    }
}

pub struct ScriptHost {
    vm: VM,
    ctx: ScriptContext,
    ticks: u64,
}

impl ScriptHost {
    pub fn new(builtins: Arc<Builtins>) -> Self {
        let ctx = ScriptContext::new();
        Self {
            vm: VM::new(builtins, ctx.clone()),
            ctx,
            ticks: 0,
        }
    }

    /// Run `function` from the top as the first tick
    pub fn start(&mut self, function: Function) -> Frame {
        self.ticks = 0;
        self.ctx.clear();
        let result = self.vm.run(function);
        self.collect(result)
    }

    /// Resume the script for one tick
    pub fn tick(&mut self) -> Frame {
        let result = self.vm.resume();
        self.collect(result)
    }

    /// Ticks executed since `start`
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn collect(&mut self, result: Result<VmStatus, ScriptError>) -> Frame {
        self.ticks += 1;

        let (status, fault) = match result {
            Ok(status) => (status, None),
            Err(err) => (self.vm.status(), Some(err)),
        };

        Frame {
            tick: self.ticks,
            status,
            console: self.ctx.take_console(),
            triangles: self.ctx.take_triangles(),
            fault,
        }
    }
}
