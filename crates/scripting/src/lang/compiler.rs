//! Tickscript Bytecode Compiler
//!
//! Compiles a program tree to a single flat `Function` in one depth-first
//! walk. Forward jumps are emitted with no target and backpatched once the
//! destination index is known.

use crate::builtins::Builtins;
use crate::error::{Result, ScriptError};
use crate::lang::ast::*;
use crate::lang::bytecode::{Function, Instruction, OpCode, Operand};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Tickscript bytecode compiler
pub struct Compiler<'a> {
    builtins: &'a Builtins,
    instructions: Vec<Instruction>,

    /// Variable name to local slot. One flat scope for the whole program.
    locals: HashMap<String, usize>,

    /// The most recent `break` still waiting for its loop to end. Only one
    /// is tracked: an earlier unpatched `break` is overwritten and its
    /// `OpGoto` keeps an unresolved target.
    pending_break: Option<usize>,
}

impl<'a> Compiler<'a> {
    /// Create a new compiler resolving calls against `builtins`
    pub fn new(builtins: &'a Builtins) -> Self {
        Self {
            builtins,
            instructions: Vec::new(),
            locals: HashMap::new(),
            pending_break: None,
        }
    }

    /// Compile a whole program
    pub fn compile(&mut self, program: &Program) -> Result<Function> {
        self.reset();

        if let Err(err) = self.compile_block(&program.statements) {
            self.reset();
            return Err(err);
        }

        self.emit(Instruction::new(OpCode::OpReturn));

        let function = Function::new(std::mem::take(&mut self.instructions), self.locals.len());
        debug!(
            instructions = function.len(),
            locals = function.local_count,
            "compiled program"
        );

        Ok(function)
    }

    fn reset(&mut self) {
        self.instructions.clear();
        self.locals.clear();
        self.pending_break = None;
    }

    /// Index of the `break` left pending by the last successful compile, if any
    pub fn pending_break(&self) -> Option<usize> {
        self.pending_break
    }

    /// Slot assigned to a variable by the last successful compile
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.locals.get(name).copied()
    }

    /// Compile a statement
    fn compile_statement(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Var { name, initializer } => {
                self.compile_expression(initializer)?;

                if self.locals.contains_key(name) {
                    return Err(ScriptError::DuplicateVariable(name.clone()));
                }
                let slot = self.locals.len();
                self.locals.insert(name.clone(), slot);

                self.emit(Instruction::with(OpCode::OpSetLocal, Operand::Slot(slot)));
            }

            Stmt::Assign { name, value } => {
                self.compile_expression(value)?;
                let slot = self.resolve_local(name)?;
                self.emit(Instruction::with(OpCode::OpSetLocal, Operand::Slot(slot)));
            }

            Stmt::Call { name, args } => {
                self.compile_call(name, args, false)?;
            }

            Stmt::If { condition, body } => {
                self.compile_expression(condition)?;
                let exit_jump = self.emit(Instruction::new(OpCode::OpIf));

                self.compile_block(body)?;

                self.patch_jump(exit_jump, self.instructions.len());
            }

            Stmt::While { condition, body } => {
                let loop_start = self.instructions.len();

                self.compile_expression(condition)?;
                let exit_jump = self.emit(Instruction::new(OpCode::OpIf));

                self.compile_block(body)?;

                self.emit(Instruction::with(OpCode::OpGoto, Operand::Jump(loop_start)));

                let loop_end = self.instructions.len();
                self.patch_jump(exit_jump, loop_end);

                if let Some(break_jump) = self.pending_break.take() {
                    self.patch_jump(break_jump, loop_end);
                }
            }

            Stmt::Break => {
                let jump = self.emit(Instruction::new(OpCode::OpGoto));
                if let Some(previous) = self.pending_break.replace(jump) {
                    warn!(
                        index = previous,
                        "break superseded before its loop ended; target stays unresolved"
                    );
                }
            }

            Stmt::Yield => {
                self.emit(Instruction::new(OpCode::OpYield));
            }
        }

        Ok(())
    }

    fn compile_block(&mut self, body: &[Stmt]) -> Result<()> {
        for stmt in body {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    /// Compile an expression
    fn compile_expression(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Number(n) => {
                self.emit(Instruction::with(OpCode::OpConstNumber, Operand::Number(*n)));
            }

            Expr::Bool(b) => {
                self.emit(Instruction::with(OpCode::OpConstBool, Operand::Bool(*b)));
            }

            Expr::Variable(name) => {
                let slot = self.resolve_local(name)?;
                self.emit(Instruction::with(OpCode::OpGetLocal, Operand::Slot(slot)));
            }

            Expr::Binary { left, op, right } => {
                self.compile_expression(left)?;
                self.compile_expression(right)?;

                let opcode = match op {
                    BinaryOp::Add => OpCode::OpAdd,
                    BinaryOp::Sub => OpCode::OpSub,
                    BinaryOp::Mul => OpCode::OpMul,
                    BinaryOp::Div => OpCode::OpDiv,
                    BinaryOp::Less => OpCode::OpLess,
                    BinaryOp::Greater => OpCode::OpGreater,
                };
                self.emit(Instruction::new(opcode));
            }

            Expr::Call { name, args } => {
                self.compile_call(name, args, true)?;
            }
        }

        Ok(())
    }

    /// Push arguments left to right, then call
    fn compile_call(&mut self, name: &str, args: &[Expr], produces_value: bool) -> Result<()> {
        let descriptor = self.builtins.descriptor(name, args.len(), produces_value)?;

        for arg in args {
            self.compile_expression(arg)?;
        }

        self.emit(Instruction::with(OpCode::OpCall, Operand::Builtin(descriptor)));
        Ok(())
    }

    fn resolve_local(&self, name: &str) -> Result<usize> {
        self.locals
            .get(name)
            .copied()
            .ok_or_else(|| ScriptError::UndefinedVariable(name.to_string()))
    }

    /// Append an instruction and return its index
    fn emit(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    fn patch_jump(&mut self, index: usize, target: usize) {
        self.instructions[index].operand = Operand::Jump(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::bytecode::BuiltinDescriptor;

    fn compile(source: &str) -> Result<Function> {
        let builtins = Builtins::standard();
        let program = Program::load(source)?;
        Compiler::new(&builtins).compile(&program)
    }

    fn ops(function: &Function) -> Vec<OpCode> {
        function.instructions.iter().map(|inst| inst.op).collect()
    }

    #[test]
    fn test_compile_empty() {
        let function = compile("").unwrap();
        assert_eq!(ops(&function), vec![OpCode::OpReturn]);
        assert_eq!(function.local_count, 0);
    }

    #[test]
    fn test_compile_var_and_print() {
        let function = compile("var x = 1+2\nPrint(x)").unwrap();

        assert_eq!(
            function.instructions,
            vec![
                Instruction::with(OpCode::OpConstNumber, Operand::Number(1.0)),
                Instruction::with(OpCode::OpConstNumber, Operand::Number(2.0)),
                Instruction::new(OpCode::OpAdd),
                Instruction::with(OpCode::OpSetLocal, Operand::Slot(0)),
                Instruction::with(OpCode::OpGetLocal, Operand::Slot(0)),
                Instruction::with(
                    OpCode::OpCall,
                    Operand::Builtin(BuiltinDescriptor {
                        name: "Print".into(),
                        arity: 1,
                        produces_value: false,
                    })
                ),
                Instruction::new(OpCode::OpReturn),
            ]
        );
        assert_eq!(function.local_count, 1);
    }

    #[test]
    fn test_slots_in_declaration_order() {
        let builtins = Builtins::standard();
        let program = Program::load("var a = 1\nvar b = 2\nvar c = a").unwrap();
        let mut compiler = Compiler::new(&builtins);
        let function = compiler.compile(&program).unwrap();

        assert_eq!(function.local_count, 3);
        assert_eq!(compiler.slot_of("a"), Some(0));
        assert_eq!(compiler.slot_of("b"), Some(1));
        assert_eq!(compiler.slot_of("c"), Some(2));

        // Slots restart on every compile
        let function = compiler.compile(&Program::load("var c = 5").unwrap()).unwrap();
        assert_eq!(function.local_count, 1);
        assert_eq!(compiler.slot_of("c"), Some(0));
        assert_eq!(compiler.slot_of("a"), None);
    }

    #[test]
    fn test_if_backpatch() {
        let function = compile("if (true)\nPrint(1)\n}\nPrint(2)").unwrap();

        // 0 const, 1 if, 2 const, 3 call, 4 const, 5 call, 6 return
        assert_eq!(function.instructions[1].op, OpCode::OpIf);
        assert_eq!(function.instructions[1].jump_target(), Some(4));
        assert!(function.unresolved_jumps().is_empty());
    }

    #[test]
    fn test_while_backpatch() {
        let function = compile("var i = 0\nwhile (i < 3)\ni = i + 1\n}").unwrap();

        // 0 const 0, 1 setlocal
        // 2 getlocal, 3 const 3, 4 less, 5 if
        // 6 getlocal, 7 const 1, 8 add, 9 setlocal
        // 10 goto 2, 11 return
        assert_eq!(function.instructions[5].op, OpCode::OpIf);
        assert_eq!(function.instructions[5].jump_target(), Some(11));
        assert_eq!(function.instructions[10].op, OpCode::OpGoto);
        assert_eq!(function.instructions[10].jump_target(), Some(2));
        assert_eq!(function.instructions[11].op, OpCode::OpReturn);
    }

    #[test]
    fn test_single_break_patched() {
        let function = compile("while (true)\nbreak\n}").unwrap();

        // 0 const, 1 if, 2 goto (break), 3 goto 0, 4 return
        assert_eq!(function.instructions[2].jump_target(), Some(4));
        assert_eq!(function.instructions[1].jump_target(), Some(4));
        assert!(function.unresolved_jumps().is_empty());
    }

    #[test]
    fn test_two_breaks_leave_first_unresolved() {
        let builtins = Builtins::standard();
        let program = Program::load("while (true)\nbreak\nbreak\n}").unwrap();
        let mut compiler = Compiler::new(&builtins);
        let function = compiler.compile(&program).unwrap();

        // 0 const, 1 if, 2 goto (first break), 3 goto (second break), 4 goto 0, 5 return
        assert_eq!(function.instructions[2].op, OpCode::OpGoto);
        assert_eq!(function.instructions[2].jump_target(), None);
        assert_eq!(function.instructions[3].jump_target(), Some(5));
        assert_eq!(function.unresolved_jumps(), vec![2]);
        assert_eq!(compiler.pending_break(), None);
    }

    #[test]
    fn test_break_outside_loop_stays_pending() {
        let builtins = Builtins::standard();
        let program = Program::load("break").unwrap();
        let mut compiler = Compiler::new(&builtins);
        let function = compiler.compile(&program).unwrap();

        assert_eq!(compiler.pending_break(), Some(0));
        assert_eq!(function.unresolved_jumps(), vec![0]);
    }

    #[test]
    fn test_failed_compile_clears_state() {
        let builtins = Builtins::standard();
        let mut compiler = Compiler::new(&builtins);

        let program = Program::load("var a = 1\nwhile (true)\nbreak\nShout(a)\n}").unwrap();
        assert!(matches!(
            compiler.compile(&program),
            Err(ScriptError::UnknownFunction(_))
        ));
        assert_eq!(compiler.slot_of("a"), None);
        assert_eq!(compiler.pending_break(), None);

        // The compiler stays usable afterwards
        let function = compiler.compile(&Program::load("var b = 2").unwrap()).unwrap();
        assert_eq!(function.local_count, 1);
        assert_eq!(compiler.slot_of("b"), Some(0));
    }

    #[test]
    fn test_expression_call_produces_value() {
        let function = compile("var m = Max(1, 2)").unwrap();
        match &function.instructions[2].operand {
            Operand::Builtin(desc) => {
                assert_eq!(desc.name, "Max");
                assert!(desc.produces_value);
            }
            other => panic!("unexpected operand {:?}", other),
        }
    }

    #[test]
    fn test_yield() {
        let function = compile("yield").unwrap();
        assert_eq!(ops(&function), vec![OpCode::OpYield, OpCode::OpReturn]);
    }

    #[test]
    fn test_name_resolution_errors() {
        assert!(matches!(
            compile("x = 1"),
            Err(ScriptError::UndefinedVariable(name)) if name == "x"
        ));
        assert!(matches!(
            compile("var x = x"),
            Err(ScriptError::UndefinedVariable(_))
        ));
        assert!(matches!(
            compile("var x = 1\nvar x = 2"),
            Err(ScriptError::DuplicateVariable(name)) if name == "x"
        ));
        assert!(matches!(
            compile("Shout(1)"),
            Err(ScriptError::UnknownFunction(name)) if name == "Shout"
        ));
        assert!(matches!(
            compile("Print(1, 2)"),
            Err(ScriptError::ArityMismatch { .. })
        ));
        assert!(matches!(
            compile("var x = Print(1)"),
            Err(ScriptError::NoReturnValue(_))
        ));
    }
}
