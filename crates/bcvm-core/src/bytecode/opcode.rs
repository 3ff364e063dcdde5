//! Bytecode Opcode Definitions
//!
//! Defines the recognised opcode keywords of the text bytecode format.
//! This file contains no execution semantics.

use std::fmt;

/// Recognised opcode keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    // Constants and variables
    LoadConst,
    LoadFast,
    StoreFast,
    LoadGlobal,

    // Calls
    CallFunction,

    // Comparison
    CompareOp,

    // Arithmetic
    BinaryAdd,
    BinarySubtract,
    BinaryMultiply,
    BinaryDivide,
    BinaryModulo,

    // Logic
    BinaryAnd,
    BinaryOr,

    // Lists
    BuildList,
    BinarySubscr,
    StoreSubscr,

    // Control flow
    JumpAbsolute,
    JumpIfTrue,
    JumpIfFalse,
    End,
}

impl OpCode {
    pub const ALL: [OpCode; 20] = [
        OpCode::LoadConst,
        OpCode::LoadFast,
        OpCode::StoreFast,
        OpCode::LoadGlobal,
        OpCode::CallFunction,
        OpCode::CompareOp,
        OpCode::BinaryAdd,
        OpCode::BinarySubtract,
        OpCode::BinaryMultiply,
        OpCode::BinaryDivide,
        OpCode::BinaryModulo,
        OpCode::BinaryAnd,
        OpCode::BinaryOr,
        OpCode::BuildList,
        OpCode::BinarySubscr,
        OpCode::StoreSubscr,
        OpCode::JumpAbsolute,
        OpCode::JumpIfTrue,
        OpCode::JumpIfFalse,
        OpCode::End,
    ];

    /// Resolve a keyword, ignoring case and surrounding whitespace
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let upper = keyword.trim().to_ascii_uppercase();
        match upper.as_str() {
            "LOAD_CONST" => Some(OpCode::LoadConst),
            "LOAD_FAST" => Some(OpCode::LoadFast),
            "STORE_FAST" => Some(OpCode::StoreFast),
            "LOAD_GLOBAL" => Some(OpCode::LoadGlobal),

            "CALL_FUNCTION" => Some(OpCode::CallFunction),
            "COMPARE_OP" => Some(OpCode::CompareOp),

            "BINARY_ADD" => Some(OpCode::BinaryAdd),
            // the misspelling is accepted as an alias
            "BINARY_SUBTRACT" | "BINARY_SUBSTRACT" => Some(OpCode::BinarySubtract),
            "BINARY_MULTIPLY" => Some(OpCode::BinaryMultiply),
            "BINARY_DIVIDE" => Some(OpCode::BinaryDivide),
            "BINARY_MODULO" => Some(OpCode::BinaryModulo),

            "BINARY_AND" => Some(OpCode::BinaryAnd),
            "BINARY_OR" => Some(OpCode::BinaryOr),

            "BUILD_LIST" => Some(OpCode::BuildList),
            "BINARY_SUBSCR" => Some(OpCode::BinarySubscr),
            "STORE_SUBSCR" => Some(OpCode::StoreSubscr),

            "JUMP_ABSOLUTE" => Some(OpCode::JumpAbsolute),
            "JUMP_IF_TRUE" => Some(OpCode::JumpIfTrue),
            "JUMP_IF_FALSE" => Some(OpCode::JumpIfFalse),
            "END" => Some(OpCode::End),

            _ => None,
        }
    }

    /// Canonical keyword
    pub fn keyword(self) -> &'static str {
        match self {
            OpCode::LoadConst => "LOAD_CONST",
            OpCode::LoadFast => "LOAD_FAST",
            OpCode::StoreFast => "STORE_FAST",
            OpCode::LoadGlobal => "LOAD_GLOBAL",
            OpCode::CallFunction => "CALL_FUNCTION",
            OpCode::CompareOp => "COMPARE_OP",
            OpCode::BinaryAdd => "BINARY_ADD",
            OpCode::BinarySubtract => "BINARY_SUBTRACT",
            OpCode::BinaryMultiply => "BINARY_MULTIPLY",
            OpCode::BinaryDivide => "BINARY_DIVIDE",
            OpCode::BinaryModulo => "BINARY_MODULO",
            OpCode::BinaryAnd => "BINARY_AND",
            OpCode::BinaryOr => "BINARY_OR",
            OpCode::BuildList => "BUILD_LIST",
            OpCode::BinarySubscr => "BINARY_SUBSCR",
            OpCode::StoreSubscr => "STORE_SUBSCR",
            OpCode::JumpAbsolute => "JUMP_ABSOLUTE",
            OpCode::JumpIfTrue => "JUMP_IF_TRUE",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::End => "END",
        }
    }

    /// Whether the loader must consume an argument line after this keyword
    pub fn takes_argument(self) -> bool {
        matches!(
            self,
            OpCode::LoadConst
                | OpCode::LoadFast
                | OpCode::StoreFast
                | OpCode::LoadGlobal
                | OpCode::CallFunction
                | OpCode::CompareOp
                | OpCode::JumpAbsolute
                | OpCode::JumpIfTrue
                | OpCode::JumpIfFalse
                | OpCode::BuildList
        )
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
