//! BCVM Configuration
//!
//! Defines runtime limits for the virtual machine.
//! Configuration specifies constraints only; enforcement is handled by the VM.

/// VM Configuration
#[derive(Debug, Clone)]
pub struct BcvmConfig {
    /// Maximum operand stack depth, unbounded when `None`
    pub max_stack_size: Option<usize>,
}

impl Default for BcvmConfig {
    fn default() -> Self {
        BcvmConfig {
            max_stack_size: None,
        }
    }
}

impl BcvmConfig {
    /// Create a new configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the operand stack depth
    pub fn with_max_stack_size(mut self, max_stack_size: usize) -> Self {
        self.max_stack_size = Some(max_stack_size);
        self
    }
}
