//! # Tickscript Scripting System
//!
//! This crate handles the Tickscript language for frame-driven hosts.
//!
//! ## Features
//! - Line parser with precedence climbing
//! - Bytecode compiler with backpatched jumps
//! - Cooperative stack VM (`yield` suspends until the next tick)
//! - Built-in host and math functions
//!
//! ## Pipeline
//!
//! Source text is loaded into a `Program` tree, compiled against a
//! `Builtins` registry into a `Function`, then run by the `VM`. Host output
//! (console lines, triangles) collects in a shared `ScriptContext`.

pub mod error;
pub mod lang;
pub mod context;
pub mod builtins;

pub use error::{ScriptError, Result};
pub use lang::{Compiler, Function, Parser, Program, Stmt, Expr, Value, VmStatus, VM};
pub use context::ScriptContext;
pub use builtins::{Builtin, BuiltinFn, Builtins};

/// Load and compile source text in one step
pub fn compile_source(source: &str, builtins: &Builtins) -> Result<Function> {
    let program = Program::load(source)?;
    Compiler::new(builtins).compile(&program)
}
