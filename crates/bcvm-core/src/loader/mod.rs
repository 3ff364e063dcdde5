pub mod loader;

pub use loader::{Program, ProgramLoader, SourceLine};
