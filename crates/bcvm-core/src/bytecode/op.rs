//! Decoded Operations
//!
//! Each raw instruction is decoded once at load time into an `Op` carrying a
//! typed payload. Decoding never rejects a program: unknown opcodes and
//! arguments that do not fit their opcode become `Op::Fault`, raised only if
//! the instruction is reached.

use std::fmt;
use std::str::FromStr;

use super::instruction::Instruction;
use super::opcode::OpCode;
use crate::error::RuntimeError;
use crate::vm::value::Value;

/// Comparison operator of COMPARE_OP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    /// Evaluate `left op right`
    pub fn eval<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
        }
    }
}

impl FromStr for CompareOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            _ => Err(()),
        }
    }
}

/// Arithmetic operator of the BINARY_* family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

/// Logical operator of BINARY_AND / BINARY_OR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Decoded operation
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    LoadConst(Value),
    LoadFast(String),
    StoreFast(String),
    LoadGlobal(String),
    CallFunction(usize),
    Compare(CompareOp),
    Binary(BinaryOp),
    Logical(LogicalOp),
    BuildList(usize),
    BinarySubscr,
    StoreSubscr,
    /// Unconditional jump to a logical index
    Jump(usize),
    /// Pop a condition and jump to the logical index when it equals `when`
    JumpIf { when: bool, target: usize },
    End,
    /// Deferred failure, raised when executed
    Fault(RuntimeError),
}

impl Op {
    /// Decode a raw instruction
    pub fn decode(instruction: &Instruction) -> Op {
        let Some(opcode) = instruction.opcode() else {
            return Op::Fault(RuntimeError::UnsupportedOpcode(
                instruction.opcode.trim().to_string(),
            ));
        };
        let arg = instruction.arg.trim();

        let decoded = match opcode {
            OpCode::LoadConst => Value::from_literal(arg).map(Op::LoadConst),
            OpCode::LoadFast => Ok(Op::LoadFast(arg.to_string())),
            OpCode::StoreFast => Ok(Op::StoreFast(arg.to_string())),
            OpCode::LoadGlobal => Ok(Op::LoadGlobal(arg.to_string())),
            OpCode::CallFunction => count(opcode, arg, "argument count").map(Op::CallFunction),
            OpCode::CompareOp => arg
                .parse::<CompareOp>()
                .map(Op::Compare)
                .map_err(|_| invalid(opcode, arg, "comparison operator")),

            OpCode::BinaryAdd => Ok(Op::Binary(BinaryOp::Add)),
            OpCode::BinarySubtract => Ok(Op::Binary(BinaryOp::Subtract)),
            OpCode::BinaryMultiply => Ok(Op::Binary(BinaryOp::Multiply)),
            OpCode::BinaryDivide => Ok(Op::Binary(BinaryOp::Divide)),
            OpCode::BinaryModulo => Ok(Op::Binary(BinaryOp::Modulo)),
            OpCode::BinaryAnd => Ok(Op::Logical(LogicalOp::And)),
            OpCode::BinaryOr => Ok(Op::Logical(LogicalOp::Or)),

            OpCode::BuildList => count(opcode, arg, "element count").map(Op::BuildList),
            OpCode::BinarySubscr => Ok(Op::BinarySubscr),
            OpCode::StoreSubscr => Ok(Op::StoreSubscr),

            OpCode::JumpAbsolute => count(opcode, arg, "jump target").map(Op::Jump),
            OpCode::JumpIfTrue => {
                count(opcode, arg, "jump target").map(|target| Op::JumpIf { when: true, target })
            }
            OpCode::JumpIfFalse => {
                count(opcode, arg, "jump target").map(|target| Op::JumpIf { when: false, target })
            }
            OpCode::End => Ok(Op::End),
        };

        decoded.unwrap_or_else(Op::Fault)
    }
}

fn count(opcode: OpCode, arg: &str, expected: &'static str) -> Result<usize, RuntimeError> {
    arg.parse::<usize>()
        .map_err(|_| invalid(opcode, arg, expected))
}

fn invalid(opcode: OpCode, arg: &str, expected: &'static str) -> RuntimeError {
    RuntimeError::InvalidArgument {
        opcode: opcode.keyword().to_string(),
        arg: arg.to_string(),
        expected,
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::LoadConst(Value::Str(s)) => write!(f, "LOAD_CONST {:?}", s),
            Op::LoadConst(Value::Char(c)) => write!(f, "LOAD_CONST {:?}", c),
            Op::LoadConst(v) => write!(f, "LOAD_CONST {}", v),
            Op::LoadFast(name) => write!(f, "LOAD_FAST {}", name),
            Op::StoreFast(name) => write!(f, "STORE_FAST {}", name),
            Op::LoadGlobal(name) => write!(f, "LOAD_GLOBAL {}", name),
            Op::CallFunction(n) => write!(f, "CALL_FUNCTION {}", n),
            Op::Compare(op) => write!(f, "COMPARE_OP {}", op.symbol()),
            Op::Binary(BinaryOp::Add) => f.write_str("BINARY_ADD"),
            Op::Binary(BinaryOp::Subtract) => f.write_str("BINARY_SUBTRACT"),
            Op::Binary(BinaryOp::Multiply) => f.write_str("BINARY_MULTIPLY"),
            Op::Binary(BinaryOp::Divide) => f.write_str("BINARY_DIVIDE"),
            Op::Binary(BinaryOp::Modulo) => f.write_str("BINARY_MODULO"),
            Op::Logical(LogicalOp::And) => f.write_str("BINARY_AND"),
            Op::Logical(LogicalOp::Or) => f.write_str("BINARY_OR"),
            Op::BuildList(n) => write!(f, "BUILD_LIST {}", n),
            Op::BinarySubscr => f.write_str("BINARY_SUBSCR"),
            Op::StoreSubscr => f.write_str("STORE_SUBSCR"),
            Op::Jump(target) => write!(f, "JUMP_ABSOLUTE {}", target),
            Op::JumpIf { when: true, target } => write!(f, "JUMP_IF_TRUE {}", target),
            Op::JumpIf { when: false, target } => write!(f, "JUMP_IF_FALSE {}", target),
            Op::End => f.write_str("END"),
            Op::Fault(err) => write!(f, "<fault: {}>", err),
        }
    }
}
