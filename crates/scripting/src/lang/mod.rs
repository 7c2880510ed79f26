//! Tickscript language
//!
//! Line-oriented scripts compiled to a flat bytecode function and run on a
//! cooperative stack VM.

pub mod lexer;
pub mod ast;
pub mod parser;
pub mod program;
pub mod bytecode;
pub mod compiler;
pub mod vm;

pub use lexer::{tokenize, Lexer, Token};
pub use ast::*;
pub use parser::Parser;
pub use bytecode::{BuiltinDescriptor, Function, Instruction, OpCode, Operand, Value};
pub use compiler::Compiler;
pub use vm::{VmStatus, VM};
