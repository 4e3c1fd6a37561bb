//! Error type for the embedded VM
//!
//! Any of these aborts the evaluation; the stepper surfaces the message to
//! the caller as an execution failure and discards partial steps.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    /// Lex or parse error in the guest source.
    Syntax { message: String, line: usize },

    /// Reference to an undefined variable.
    UndefinedVariable { name: String, line: usize },

    /// Call of something that is not callable or not defined.
    NotCallable { name: String, line: usize },

    /// Operand types do not fit the operator.
    Type { message: String, line: usize },
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::Syntax { message, line } => {
                write!(f, "SyntaxError: {} (line {})", message, line)
            }
            VmError::UndefinedVariable { name, line } => {
                write!(f, "ReferenceError: {} is not defined (line {})", name, line)
            }
            VmError::NotCallable { name, line } => {
                write!(f, "TypeError: {} is not a function (line {})", name, line)
            }
            VmError::Type { message, line } => {
                write!(f, "TypeError: {} (line {})", message, line)
            }
        }
    }
}

impl std::error::Error for VmError {}
