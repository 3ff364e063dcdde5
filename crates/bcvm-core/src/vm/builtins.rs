//! Built-in Callables
//!
//! Functions reachable through LOAD_GLOBAL / CALL_FUNCTION. Names are
//! resolved only at call time, case-insensitively.

use std::io::Write;

use crate::error::RuntimeError;
use super::value::Value;

/// Known built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
}

impl Builtin {
    /// Resolve a function name
    pub fn resolve(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case("print") {
            Some(Builtin::Print)
        } else {
            None
        }
    }

    /// Invoke with arguments in call order. Returns the value to push, if any.
    pub fn call<W: Write>(self, args: &[Value], out: &mut W) -> Result<Option<Value>, RuntimeError> {
        match self {
            Builtin::Print => {
                let line = args
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(out, "{}", line).map_err(|e| RuntimeError::Output(e.to_string()))?;
                Ok(None)
            }
        }
    }
}
