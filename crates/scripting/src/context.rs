//! Script execution context
//!
//! Shared sink for everything a running script hands to its host: console
//! lines from `Print` and draw requests from `DrawTriangle`. Clones share
//! the same sink, so the host keeps one handle and drains it once per tick.

use parking_lot::Mutex;
use std::sync::Arc;
use tickscript_core::Triangle;

#[derive(Debug, Default)]
struct HostOutput {
    console: Vec<String>,
    triangles: Vec<Triangle>,
}

/// Script execution context
#[derive(Debug, Clone, Default)]
pub struct ScriptContext {
    output: Arc<Mutex<HostOutput>>,
}

impl ScriptContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a console line
    pub fn print(&self, line: impl Into<String>) {
        self.output.lock().console.push(line.into());
    }

    /// Queue a triangle for the host to draw
    pub fn draw_triangle(&self, triangle: Triangle) {
        self.output.lock().triangles.push(triangle);
    }

    /// Console lines written so far, without draining them
    pub fn console(&self) -> Vec<String> {
        self.output.lock().console.clone()
    }

    /// Drain pending console lines
    pub fn take_console(&self) -> Vec<String> {
        std::mem::take(&mut self.output.lock().console)
    }

    /// Drain pending draw requests
    pub fn take_triangles(&self) -> Vec<Triangle> {
        std::mem::take(&mut self.output.lock().triangles)
    }

    /// Forget all pending output
    pub fn clear(&self) {
        let mut output = self.output.lock();
        output.console.clear();
        output.triangles.clear();
    }
}
