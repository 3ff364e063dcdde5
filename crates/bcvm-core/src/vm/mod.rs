pub mod builtins;
pub mod memory;
pub mod operators;
pub mod stack;
pub mod value;
pub mod vm;

pub use vm::{Flow, VirtualMachine};
pub use value::Value;
