//! Error types for the stack algebra

use thiserror::Error;

/// Errors raised by protocol stack manipulation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("Stack overflow: capacity {capacity} reached")]
    Overflow { capacity: usize },

    #[error("Stack underflow: stack is empty")]
    Underflow,

    #[error("Too many protocols for stack: {len} > capacity {capacity}")]
    TooLong { len: usize, capacity: usize },

    #[error("Function {function} is not applicable to stack {stack}")]
    NotApplicable { function: String, stack: String },
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;
