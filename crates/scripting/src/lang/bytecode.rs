//! Tickscript Bytecode
//!
//! Instruction set, runtime values, and the compiled `Function`.
//! Jump targets are absolute instruction indices into the owning function.

use serde::Serialize;
use std::fmt;

/// Tickscript opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OpCode {
    // Builtins
    OpCall,        // Call a host builtin

    // Arithmetic
    OpAdd,         // Addition
    OpSub,         // Subtraction
    OpMul,         // Multiplication
    OpDiv,         // Division

    // Comparison
    OpLess,        // Less than
    OpGreater,     // Greater than

    // Constants
    OpConstNumber, // Push number literal
    OpConstBool,   // Push boolean literal

    // Variables
    OpSetLocal,    // Pop into local slot
    OpGetLocal,    // Push copy of local slot

    // Control flow
    OpIf,          // Pop boolean, jump when false
    OpGoto,        // Unconditional jump
    OpYield,       // Suspend until resumed
    OpReturn,      // End of program
}

/// Builtin call descriptor embedded in `OpCall` instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltinDescriptor {
    pub name: String,
    pub arity: usize,
    /// Push the builtin's result back onto the stack
    pub produces_value: bool,
}

/// Instruction operand. Its meaning depends on the opcode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    None,
    Jump(usize),
    Slot(usize),
    Number(f64),
    Bool(bool),
    Builtin(BuiltinDescriptor),
}

/// A single instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub op: OpCode,
    pub operand: Operand,
}

impl Instruction {
    /// Instruction without an operand
    pub fn new(op: OpCode) -> Self {
        Self {
            op,
            operand: Operand::None,
        }
    }

    pub fn with(op: OpCode, operand: Operand) -> Self {
        Self { op, operand }
    }

    /// Jump target, if this is a jump whose target has been resolved
    pub fn jump_target(&self) -> Option<usize> {
        match (self.op, &self.operand) {
            (OpCode::OpIf | OpCode::OpGoto, Operand::Jump(target)) => Some(*target),
            _ => None,
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(self.op, OpCode::OpIf | OpCode::OpGoto)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.op)?;
        match &self.operand {
            Operand::None if self.is_jump() => write!(f, " ?"),
            Operand::None => Ok(()),
            Operand::Jump(target) => write!(f, " -> {:04}", target),
            Operand::Slot(slot) => write!(f, " #{}", slot),
            Operand::Number(n) => write!(f, " {}", n),
            Operand::Bool(b) => write!(f, " {}", b),
            Operand::Builtin(desc) => write!(
                f,
                " {}/{}{}",
                desc.name,
                desc.arity,
                if desc.produces_value { " -> value" } else { "" }
            ),
        }
    }
}

/// Compiled program: a flat instruction list plus the number of local slots
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Function {
    pub instructions: Vec<Instruction>,
    pub local_count: usize,
}

impl Function {
    pub fn new(instructions: Vec<Instruction>, local_count: usize) -> Self {
        Self {
            instructions,
            local_count,
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Jumps whose target was never patched
    pub fn unresolved_jumps(&self) -> Vec<usize> {
        self.instructions
            .iter()
            .enumerate()
            .filter(|(_, inst)| inst.is_jump() && inst.jump_target().is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Disassemble the function for debugging
    pub fn disassemble(&self, name: &str) -> String {
        let mut output = format!("== {} ({} locals) ==\n", name, self.local_count);

        for (offset, instruction) in self.instructions.iter().enumerate() {
            output.push_str(&format!("{:04} {}\n", offset, instruction));
        }

        output
    }
}

/// Runtime value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(_) => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(0.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}
