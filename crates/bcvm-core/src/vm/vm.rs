//! Virtual Machine Core
//!
//! Defines the virtual machine structure and execution loop. The program
//! counter walks physical positions; jumps name logical indices, which are
//! resolved through the loaded program's index table.

use std::io::{self, Stdout, Write};

use crate::bytecode::op::Op;
use crate::config::BcvmConfig;
use crate::error::{BcvmError, BcvmResult, RuntimeError};
use crate::loader::Program;

use super::builtins::Builtin;
use super::memory::Environment;
use super::operators;
use super::stack::Stack;
use super::value::{ListRef, Value};

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advanced to the next physical position
    Advanced,
    /// Jumped to the given physical position
    Jumped(usize),
    /// Reached a terminal state
    Halted,
}

/// Where execution goes after an instruction
#[derive(Debug)]
enum Control {
    Next,
    Jump(usize),
    Halt,
}

/// Mutable execution state touched by opcode handlers
#[derive(Debug)]
struct Context<W> {
    stack: Stack,
    env: Environment,
    out: W,
}

impl<W: Write> Context<W> {
    fn execute(&mut self, op: &Op) -> Result<Control, RuntimeError> {
        match op {
            Op::LoadConst(value) => self.stack.push(value.clone())?,
            Op::LoadFast(name) => {
                let value = self.env.load(name)?;
                self.stack.push(value)?;
            }
            Op::StoreFast(name) => {
                let value = self.stack.pop()?;
                self.env.store(name, value);
            }
            Op::LoadGlobal(name) => self.stack.push(Value::Function(name.clone()))?,

            Op::CallFunction(argc) => {
                let args = self.stack.pop_n(*argc)?;
                let callee = self.stack.pop()?;
                let Value::Function(name) = &callee else {
                    return Err(RuntimeError::ExpectedFunction(callee.kind_name()));
                };
                let builtin = Builtin::resolve(name)
                    .ok_or_else(|| RuntimeError::UnsupportedFunction(name.clone()))?;
                if let Some(result) = builtin.call(&args, &mut self.out)? {
                    self.stack.push(result)?;
                }
            }

            Op::Compare(cmp) => {
                let (left, right) = self.stack.pop_pair()?;
                let result = left.compare(*cmp, &right)?;
                self.stack.push(Value::Bool(result))?;
            }
            Op::Binary(bin) => {
                let (left, right) = self.stack.pop_pair()?;
                let result = operators::binary(*bin, &left, &right)?;
                self.stack.push(result)?;
            }
            Op::Logical(logic) => {
                let (left, right) = self.stack.pop_pair()?;
                let result = operators::logical(*logic, &left, &right)?;
                self.stack.push(result)?;
            }

            Op::BuildList(count) => {
                let items = self.stack.pop_n(*count)?;
                self.stack.push(Value::list(items))?;
            }
            Op::BinarySubscr => {
                let index = self.stack.pop()?;
                let list = self.stack.pop()?;
                let items = expect_list(&list)?;
                let element = {
                    let items = items.borrow();
                    items[slot(&index, items.len())?].clone()
                };
                self.stack.push(element)?;
            }
            Op::StoreSubscr => {
                let value = self.stack.pop()?;
                let list = self.stack.pop()?;
                let index = self.stack.pop()?;
                let items = expect_list(&list)?;
                if value.contains_list(items) {
                    return Err(RuntimeError::SelfReference);
                }
                let mut items = items.borrow_mut();
                let position = slot(&index, items.len())?;
                items[position] = value;
            }

            Op::Jump(target) => return Ok(Control::Jump(*target)),
            Op::JumpIf { when, target } => {
                let condition = self.stack.pop()?.as_bool()?;
                if condition == *when {
                    return Ok(Control::Jump(*target));
                }
            }
            Op::End => return Ok(Control::Halt),

            Op::Fault(err) => return Err(err.clone()),
        }
        Ok(Control::Next)
    }
}

fn expect_list(value: &Value) -> Result<&ListRef, RuntimeError> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(RuntimeError::ExpectedList(other.kind_name())),
    }
}

fn slot(index: &Value, len: usize) -> Result<usize, RuntimeError> {
    let i = index.as_int().map_err(|_| RuntimeError::InvalidIndex)?;
    usize::try_from(i)
        .ok()
        .filter(|&i| i < len)
        .ok_or(RuntimeError::InvalidIndex)
}

/// Text bytecode virtual machine
#[derive(Debug)]
pub struct VirtualMachine<W: Write = Stdout> {
    config: BcvmConfig,
    program: Program,
    context: Context<W>,
    pc: usize,
    halted: bool,
}

impl VirtualMachine<Stdout> {
    /// Create a VM whose `print` output goes to stdout
    pub fn new(config: BcvmConfig, program: Program) -> Self {
        Self::with_output(config, program, io::stdout())
    }
}

impl<W: Write> VirtualMachine<W> {
    /// Create a VM writing `print` output to `out`
    pub fn with_output(config: BcvmConfig, program: Program, out: W) -> Self {
        VirtualMachine {
            context: Context {
                stack: Stack::new(config.max_stack_size),
                env: Environment::new(),
                out,
            },
            program,
            pc: 0,
            halted: false,
            config,
        }
    }

    /// Execute until END, the end of the program, or the first error
    pub fn run(&mut self) -> BcvmResult<()> {
        while self.step()? != Flow::Halted {}
        Ok(())
    }

    /// Execute a single instruction
    pub fn step(&mut self) -> BcvmResult<Flow> {
        if self.halted {
            return Ok(Flow::Halted);
        }
        let Some(op) = self.program.ops().get(self.pc) else {
            self.halt();
            return Ok(Flow::Halted);
        };
        let instruction = &self.program.instructions()[self.pc];
        tracing::trace!(pc = self.pc, index = instruction.index, %op, "step");

        let control = match self.context.execute(op) {
            Ok(Control::Jump(target)) => self
                .program
                .position_of(target)
                .map(Control::Jump)
                .ok_or(RuntimeError::UnknownJumpTarget(target)),
            other => other,
        };

        match control {
            Ok(Control::Next) => {
                self.pc += 1;
                Ok(Flow::Advanced)
            }
            Ok(Control::Jump(position)) => {
                self.pc = position;
                Ok(Flow::Jumped(position))
            }
            Ok(Control::Halt) => {
                self.halt();
                Ok(Flow::Halted)
            }
            Err(source) => {
                self.halted = true;
                Err(BcvmError::Runtime {
                    index: instruction.index,
                    opcode: instruction
                        .opcode()
                        .map(|opcode| opcode.keyword().to_string())
                        .unwrap_or_else(|| instruction.opcode.clone()),
                    source,
                })
            }
        }
    }

    fn halt(&mut self) {
        self.halted = true;
        tracing::debug!(
            pc = self.pc,
            stack = self.context.stack.size(),
            variables = self.context.env.count(),
            "halted"
        );
    }

    /// Operand stack contents, bottom first
    pub fn stack(&self) -> &[Value] {
        self.context.stack.values()
    }

    /// Top of the operand stack
    pub fn peek_top(&self) -> Option<&Value> {
        self.context.stack.peek().ok()
    }

    /// Current value of a variable
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.context.env.get(name)
    }

    pub fn environment(&self) -> &Environment {
        &self.context.env
    }

    /// Physical position of the next instruction
    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn config(&self) -> &BcvmConfig {
        &self.config
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn output(&self) -> &W {
        &self.context.out
    }

    pub fn into_output(self) -> W {
        self.context.out
    }
}
