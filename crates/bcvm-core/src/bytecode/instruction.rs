//! Bytecode Instruction Representation
//!
//! Defines the raw instruction record produced by the loader.
//! This layer contains no execution semantics.

use super::opcode::OpCode;

/// Raw bytecode instruction, as written in the program text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Logical index used as jump target
    pub index: usize,
    /// Opcode keyword as written (case preserved)
    pub opcode: String,
    /// Unparsed argument, empty when the opcode takes none
    pub arg: String,
    /// 1-based source line of the index
    pub line: usize,
}

impl Instruction {
    /// Create an instruction with no argument
    pub fn new(index: usize, opcode: impl Into<String>) -> Self {
        Instruction {
            index,
            opcode: opcode.into(),
            arg: String::new(),
            line: 0,
        }
    }

    /// Create an instruction with a raw argument
    pub fn with_arg(index: usize, opcode: impl Into<String>, arg: impl Into<String>) -> Self {
        Instruction {
            index,
            opcode: opcode.into(),
            arg: arg.into(),
            line: 0,
        }
    }

    /// Attach the source line the instruction was read from
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Recognised opcode, if the keyword is known
    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::from_keyword(&self.opcode)
    }
}
