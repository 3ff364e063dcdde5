//! BCVM - Core Library
//!
//! Public API surface for the text bytecode virtual machine: the program
//! loader, the value model and the execution loop.

pub mod error;
pub mod config;
pub mod bytecode;
pub mod vm;
pub mod loader;

use std::io::Write;

// Re-export commonly used types
pub use error::{BcvmError, BcvmResult, ParseError, RuntimeError};
pub use config::BcvmConfig;
pub use bytecode::{Instruction, Op, OpCode};
pub use vm::{Flow, Value, VirtualMachine};
pub use loader::{Program, ProgramLoader};

/// Load program text and run it to completion, writing `print` output to `out`.
///
/// The finished machine is returned so callers can inspect the final stack
/// and variables.
pub fn run_source<W: Write>(config: BcvmConfig, source: &str, out: W) -> BcvmResult<VirtualMachine<W>> {
    let program = ProgramLoader::load_str(source)?;
    let mut vm = VirtualMachine::with_output(config, program, out);
    vm.run()?;
    Ok(vm)
}
