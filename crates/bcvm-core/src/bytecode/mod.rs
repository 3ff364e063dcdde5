pub mod instruction;
pub mod op;
pub mod opcode;

pub use instruction::Instruction;
pub use op::{BinaryOp, CompareOp, LogicalOp, Op};
pub use opcode::OpCode;
