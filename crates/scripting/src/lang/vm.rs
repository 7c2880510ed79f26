//! Tickscript Bytecode VM
//!
//! Stack machine that runs a compiled `Function` cooperatively. Execution
//! stops at `OpYield` with the VM suspended and picks up where it left off
//! on the next `resume`, so a host can drive a script once per frame.
//!
//! There is no step limit: a loop that never yields keeps the current
//! `run`/`resume` call busy until it ends.

use crate::builtins::Builtins;
use crate::context::ScriptContext;
use crate::error::{Result, ScriptError};
use crate::lang::bytecode::{Function, Instruction, OpCode, Operand, Value};
use std::sync::Arc;
use tracing::{trace, warn};

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmStatus {
    /// Nothing has been run yet
    Idle,
    /// Inside a `run`/`resume` call
    Running,
    /// Stopped at a `yield`, waiting for `resume`
    Suspended,
    /// Returned or faulted. Only a new `run` leaves this state.
    Finished,
}

/// Tickscript bytecode VM
pub struct VM {
    builtins: Arc<Builtins>,
    ctx: ScriptContext,

    /// Program being executed
    function: Arc<Function>,

    /// Instruction pointer
    ip: usize,

    /// Value stack
    stack: Vec<Value>,

    /// Local variable slots
    locals: Vec<Value>,

    status: VmStatus,
}

impl VM {
    /// Create an idle VM calling into `builtins` and writing to `ctx`
    pub fn new(builtins: Arc<Builtins>, ctx: ScriptContext) -> Self {
        Self {
            builtins,
            ctx,
            function: Arc::new(Function::default()),
            ip: 0,
            stack: Vec::new(),
            locals: Vec::new(),
            status: VmStatus::Idle,
        }
    }

    /// Start `function` from the top, discarding any program in progress
    pub fn run(&mut self, function: Function) -> Result<VmStatus> {
        if self.status == VmStatus::Suspended {
            trace!(ip = self.ip, "discarding suspended program");
        }

        self.locals = vec![Value::default(); function.local_count];
        self.function = Arc::new(function);
        self.stack.clear();
        self.ip = 0;
        self.status = VmStatus::Running;

        self.execute()
    }

    /// Continue a suspended program. Does nothing when idle or finished.
    pub fn resume(&mut self) -> Result<VmStatus> {
        match self.status {
            VmStatus::Idle | VmStatus::Finished => return Ok(self.status),
            VmStatus::Running | VmStatus::Suspended => {}
        }

        self.status = VmStatus::Running;
        self.execute()
    }

    pub fn status(&self) -> VmStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == VmStatus::Finished
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn locals(&self) -> &[Value] {
        &self.locals
    }

    pub fn context(&self) -> &ScriptContext {
        &self.ctx
    }

    fn execute(&mut self) -> Result<VmStatus> {
        match self.interpret() {
            Ok(status) => {
                trace!(?status, ip = self.ip, "vm stopped");
                Ok(status)
            }
            Err(err) => {
                self.status = VmStatus::Finished;
                warn!(ip = self.ip, "script aborted: {}", err);
                Err(err)
            }
        }
    }

    /// Fetch-execute loop
    fn interpret(&mut self) -> Result<VmStatus> {
        let function = Arc::clone(&self.function);

        loop {
            let instruction = function.instructions.get(self.ip).ok_or_else(|| {
                fault(format!("instruction pointer {} is past the end", self.ip))
            })?;

            match instruction.op {
                OpCode::OpCall => {
                    let desc = match &instruction.operand {
                        Operand::Builtin(desc) => desc,
                        _ => return Err(malformed(instruction)),
                    };

                    if self.stack.len() < desc.arity {
                        return Err(fault(format!("stack underflow calling {}", desc.name)));
                    }
                    let args = self.stack.split_off(self.stack.len() - desc.arity);

                    let result = self
                        .builtins
                        .call(&self.ctx, &desc.name, &args)
                        .map_err(|err| match err {
                            ScriptError::RuntimeFault(_) => err,
                            other => fault(other.to_string()),
                        })?;

                    if desc.produces_value {
                        let value = result
                            .ok_or_else(|| fault(format!("{} returned no value", desc.name)))?;
                        self.push(value);
                    }
                    self.ip += 1;
                }

                OpCode::OpAdd => self.arithmetic_op(|a, b| a + b)?,
                OpCode::OpSub => self.arithmetic_op(|a, b| a - b)?,
                OpCode::OpMul => self.arithmetic_op(|a, b| a * b)?,
                OpCode::OpDiv => self.arithmetic_op(|a, b| a / b)?,

                OpCode::OpLess => self.comparison_op(|a, b| a < b)?,
                OpCode::OpGreater => self.comparison_op(|a, b| a > b)?,

                OpCode::OpConstNumber => match instruction.operand {
                    Operand::Number(n) => {
                        self.push(Value::Number(n));
                        self.ip += 1;
                    }
                    _ => return Err(malformed(instruction)),
                },

                OpCode::OpConstBool => match instruction.operand {
                    Operand::Bool(b) => {
                        self.push(Value::Bool(b));
                        self.ip += 1;
                    }
                    _ => return Err(malformed(instruction)),
                },

                OpCode::OpSetLocal => {
                    let slot = self.slot(instruction)?;
                    let value = self.pop()?;
                    self.locals[slot] = value;
                    self.ip += 1;
                }

                OpCode::OpGetLocal => {
                    let slot = self.slot(instruction)?;
                    let value = self.locals[slot];
                    self.push(value);
                    self.ip += 1;
                }

                OpCode::OpIf => {
                    let condition = self.pop()?;
                    match condition {
                        Value::Bool(true) => self.ip += 1,
                        Value::Bool(false) => self.ip = jump_target(instruction)?,
                        other => {
                            return Err(fault(format!(
                                "condition must be a bool, got {}",
                                other.kind_name()
                            )))
                        }
                    }
                }

                OpCode::OpGoto => {
                    self.ip = jump_target(instruction)?;
                }

                OpCode::OpYield => {
                    self.ip += 1;
                    self.status = VmStatus::Suspended;
                    return Ok(self.status);
                }

                OpCode::OpReturn => {
                    self.status = VmStatus::Finished;
                    return Ok(self.status);
                }
            }
        }
    }

    /// Push a value onto the stack
    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop a value from the stack
    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or_else(|| fault("stack underflow"))
    }

    fn pop_number(&mut self) -> Result<f64> {
        let value = self.pop()?;
        value.as_number().ok_or_else(|| {
            fault(format!("expected a number, got {}", value.kind_name()))
        })
    }

    /// Pop right then left operand
    fn pop_operands(&mut self) -> Result<(f64, f64)> {
        let b = self.pop_number()?;
        let a = self.pop_number()?;
        Ok((a, b))
    }

    /// Perform arithmetic operation
    fn arithmetic_op<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(f64, f64) -> f64,
    {
        let (a, b) = self.pop_operands()?;
        self.push(Value::Number(op(a, b)));
        self.ip += 1;
        Ok(())
    }

    /// Perform comparison operation
    fn comparison_op<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(f64, f64) -> bool,
    {
        let (a, b) = self.pop_operands()?;
        self.push(Value::Bool(op(a, b)));
        self.ip += 1;
        Ok(())
    }

    fn slot(&self, instruction: &Instruction) -> Result<usize> {
        match instruction.operand {
            Operand::Slot(slot) if slot < self.locals.len() => Ok(slot),
            Operand::Slot(slot) => Err(fault(format!(
                "local slot {} out of range ({} locals)",
                slot,
                self.locals.len()
            ))),
            _ => Err(malformed(instruction)),
        }
    }
}

fn jump_target(instruction: &Instruction) -> Result<usize> {
    match instruction.operand {
        Operand::Jump(target) => Ok(target),
        Operand::None => Err(fault(format!("{:?} has no resolved jump target", instruction.op))),
        _ => Err(malformed(instruction)),
    }
}

fn fault(message: impl Into<String>) -> ScriptError {
    ScriptError::RuntimeFault(message.into())
}

fn malformed(instruction: &Instruction) -> ScriptError {
    fault(format!("malformed instruction: {}", instruction))
}
