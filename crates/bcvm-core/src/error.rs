//! BCVM Error Types
//!
//! Defines the two terminal error kinds of the interpreter: load-time
//! `ParseError` and execution-time `RuntimeError`, wrapped by `BcvmError`.

use std::io;

use thiserror::Error;

/// Malformed program text, detected while loading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected numeric index, found {found:?}")]
    ExpectedIndex { line: usize, found: String },

    #[error("line {line}: missing opcode after index {index}")]
    MissingOpcode { line: usize, index: usize },

    #[error("line {line}: missing argument for {opcode} at index {index}")]
    MissingArgument {
        line: usize,
        index: usize,
        opcode: String,
    },

    #[error("line {line}: expected argument for {opcode} at index {index}, found opcode {found:?}")]
    ArgumentIsOpcode {
        line: usize,
        index: usize,
        opcode: String,
        found: String,
    },

    #[error("line {line}: duplicate index {index} (first defined on line {first_line})")]
    DuplicateIndex {
        line: usize,
        index: usize,
        first_line: usize,
    },
}

/// Execution failure raised by an opcode handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    // Stack discipline
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow (limit {0})")]
    StackOverflow(usize),

    // Operand decoding
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("invalid argument for {opcode}: {arg:?} (expected {expected})")]
    InvalidArgument {
        opcode: String,
        arg: String,
        expected: &'static str,
    },
    #[error("unsupported opcode: {0}")]
    UnsupportedOpcode(String),

    // Environment
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    // Calls
    #[error("expected function reference, found {0}")]
    ExpectedFunction(&'static str),
    #[error("unsupported function: {0}")]
    UnsupportedFunction(String),

    // Operand kinds
    #[error("unsupported comparison: {left} {op} {right}")]
    UnsupportedComparison {
        left: &'static str,
        op: &'static str,
        right: &'static str,
    },
    #[error("{0} is not convertible to integer")]
    NotConvertibleToInt(&'static str),
    #[error("{0} is not convertible to boolean")]
    NotConvertibleToBool(&'static str),

    // Arithmetic
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("integer overflow")]
    IntegerOverflow,

    // Lists
    #[error("expected list, found {0}")]
    ExpectedList(&'static str),
    #[error("invalid index")]
    InvalidIndex,
    #[error("list cannot contain itself")]
    SelfReference,

    // Control flow
    #[error("unknown jump target: {0}")]
    UnknownJumpTarget(usize),

    // IO boundary
    #[error("output error: {0}")]
    Output(String),
}

/// Top-level error surfaced to the embedding program
#[derive(Debug, Error)]
pub enum BcvmError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("runtime error at index {index} ({opcode}): {source}")]
    Runtime {
        index: usize,
        opcode: String,
        #[source]
        source: RuntimeError,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl BcvmError {
    /// The runtime cause, if this is an execution failure
    pub fn runtime(&self) -> Option<&RuntimeError> {
        match self {
            BcvmError::Runtime { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type BcvmResult<T> = Result<T, BcvmError>;
