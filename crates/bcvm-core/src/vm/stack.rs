//! VM Stack Implementation
//!
//! Operand stack for VM execution.
//! No execution semantics.

use crate::error::RuntimeError;
use super::value::Value;

/// VM operand stack
#[derive(Debug)]
pub struct Stack {
    values: Vec<Value>,
    max_size: Option<usize>,
}

impl Stack {
    /// Create new stack, optionally bounded
    pub fn new(max_size: Option<usize>) -> Self {
        Stack {
            values: Vec::with_capacity(max_size.unwrap_or(64).min(64)),
            max_size,
        }
    }

    /// Push value onto stack
    pub fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if let Some(max) = self.max_size {
            if self.values.len() >= max {
                return Err(RuntimeError::StackOverflow(max));
            }
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop value from stack
    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Pop the top `n` values, returned in push order
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, RuntimeError> {
        if n > self.values.len() {
            return Err(RuntimeError::StackUnderflow);
        }
        let split = self.values.len() - n;
        Ok(self.values.split_off(split))
    }

    /// Pop `(left, right)` operands, where `right` was pushed last
    pub fn pop_pair(&mut self) -> Result<(Value, Value), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        Ok((left, right))
    }

    /// Peek at top of stack without removing
    pub fn peek(&self) -> Result<&Value, RuntimeError> {
        self.values.last().ok_or(RuntimeError::StackUnderflow)
    }

    /// Current contents, bottom first
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get current stack size
    pub fn size(&self) -> usize {
        self.values.len()
    }
}
