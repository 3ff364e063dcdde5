//! Program Loader
//!
//! Turns line-oriented program text into an indexed instruction sequence.
//! This layer performs structural validation only; opcodes and arguments are
//! decoded here but their faults surface at execution time.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::bytecode::instruction::Instruction;
use crate::bytecode::op::Op;
use crate::bytecode::opcode::OpCode;
use crate::error::{BcvmResult, ParseError};

/// A normalised, non-blank source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the original text
    pub number: usize,
    pub text: String,
}

/// Loaded program: raw records, decoded ops and the jump table
#[derive(Debug)]
pub struct Program {
    instructions: Vec<Instruction>,
    ops: Vec<Op>,
    positions: HashMap<usize, usize>,
}

impl Program {
    /// Decode instructions and build the logical index table
    pub fn new(instructions: Vec<Instruction>) -> Result<Self, ParseError> {
        let mut positions = HashMap::with_capacity(instructions.len());

        for (position, instruction) in instructions.iter().enumerate() {
            if let Some(first) = positions.insert(instruction.index, position) {
                return Err(ParseError::DuplicateIndex {
                    line: instruction.line,
                    index: instruction.index,
                    first_line: instructions[first].line,
                });
            }
        }

        let ops = instructions.iter().map(Op::decode).collect();

        Ok(Program {
            instructions,
            ops,
            positions,
        })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Physical position of a logical index
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.positions.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Program loader
pub struct ProgramLoader;

impl ProgramLoader {
    /// Load a program from its text
    pub fn load_str(source: &str) -> BcvmResult<Program> {
        let lines = Self::normalize(source);
        let instructions = Self::parse_lines(&lines)?;
        let program = Program::new(instructions)?;

        tracing::debug!(
            lines = lines.len(),
            instructions = program.len(),
            "program loaded"
        );
        Ok(program)
    }

    /// Load a program from a file
    pub fn load_file(path: impl AsRef<Path>) -> BcvmResult<Program> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "reading program");
        let source = fs::read_to_string(path)?;
        Self::load_str(&source)
    }

    /// Convert tabs to spaces, trim, and drop blank lines
    pub fn normalize(source: &str) -> Vec<SourceLine> {
        source
            .lines()
            .enumerate()
            .filter_map(|(i, raw)| {
                let text = raw.replace('\t', " ").trim().to_string();
                (!text.is_empty()).then(|| SourceLine { number: i + 1, text })
            })
            .collect()
    }

    /// Group normalised lines into index/opcode/argument records
    pub fn parse_lines(lines: &[SourceLine]) -> Result<Vec<Instruction>, ParseError> {
        let mut instructions = Vec::new();
        let mut cursor = 0;

        while cursor < lines.len() {
            let index_line = &lines[cursor];
            let index = index_line
                .text
                .parse::<usize>()
                .map_err(|_| ParseError::ExpectedIndex {
                    line: index_line.number,
                    found: index_line.text.clone(),
                })?;
            cursor += 1;

            let opcode_line = lines.get(cursor).ok_or(ParseError::MissingOpcode {
                line: index_line.number,
                index,
            })?;
            cursor += 1;

            let mut instruction =
                Instruction::new(index, opcode_line.text.clone()).at_line(index_line.number);

            if let Some(opcode) = instruction.opcode().filter(|op| op.takes_argument()) {
                let arg_line = lines.get(cursor).ok_or_else(|| ParseError::MissingArgument {
                    line: opcode_line.number,
                    index,
                    opcode: opcode.keyword().to_string(),
                })?;

                // an opcode here means the file is misaligned
                if OpCode::from_keyword(&arg_line.text).is_some() {
                    return Err(ParseError::ArgumentIsOpcode {
                        line: arg_line.number,
                        index,
                        opcode: opcode.keyword().to_string(),
                        found: arg_line.text.clone(),
                    });
                }

                instruction.arg = arg_line.text.clone();
                cursor += 1;
            }

            instructions.push(instruction);
        }

        Ok(instructions)
    }
}
