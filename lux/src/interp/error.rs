//! Runtime errors for the symbol table and the interpreter

use crate::symbol::{Handle, RangeKind};
use std::fmt;

/// Runtime error during symbol manipulation or interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// A handle sub-range has no free slot
    AllocationExhausted(RangeKind),
    /// Handle outside the arena, or of the wrong class for the operation
    InvalidHandle,
    /// Attempt to delete or modify a constant
    ProtectedHandle,
    /// In-place conversion of a named value
    NotTemporary,
    UndefinedVariable,
    UndefinedFunction,
    TypeError,
    DivisionByZero,
    ArityMismatch,
    IndexOutOfBounds,
    IoError,
    /// Nested compile of a source that failed to lex or parse
    Syntax,
    /// Control flow: leave the innermost loop
    Break,
    /// Control flow: next loop iteration
    Continue,
    /// Control flow: leave the current routine (with optional value)
    Return(Option<Handle>),
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        // Discriminants only; the payloads are context, not identity
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl RuntimeError {
    pub fn allocation_exhausted(range: RangeKind) -> Self {
        RuntimeError {
            kind: ErrorKind::AllocationExhausted(range),
            message: format!("no free {range} slots"),
        }
    }

    pub fn invalid_handle(handle: Handle) -> Self {
        RuntimeError {
            kind: ErrorKind::InvalidHandle,
            message: format!("invalid symbol {handle}"),
        }
    }

    pub fn protected_handle(handle: Handle) -> Self {
        RuntimeError {
            kind: ErrorKind::ProtectedHandle,
            message: format!("symbol {handle} is protected"),
        }
    }

    pub fn not_temporary(handle: Handle) -> Self {
        RuntimeError {
            kind: ErrorKind::NotTemporary,
            message: format!("symbol {handle} is not a temporary"),
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedVariable,
            message: format!("undefined variable: {name}"),
        }
    }

    pub fn undefined_function(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedFunction,
            message: format!("undefined routine: {name}"),
        }
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeError,
            message: format!("type error: expected {expected}, got {got}"),
        }
    }

    pub fn division_by_zero() -> Self {
        RuntimeError {
            kind: ErrorKind::DivisionByZero,
            message: "division by zero".to_string(),
        }
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ArityMismatch,
            message: format!("{name} expects at most {expected} argument(s), got {got}"),
        }
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::IndexOutOfBounds,
            message: format!("index {index} out of bounds for length {len}"),
        }
    }

    pub fn io_error(msg: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::IoError,
            message: format!("IO error: {msg}"),
        }
    }

    pub fn syntax(msg: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::Syntax,
            message: msg.to_string(),
        }
    }

    pub fn break_loop() -> Self {
        RuntimeError {
            kind: ErrorKind::Break,
            message: "break outside loop".to_string(),
        }
    }

    pub fn continue_loop() -> Self {
        RuntimeError {
            kind: ErrorKind::Continue,
            message: "continue outside loop".to_string(),
        }
    }

    pub fn return_value(value: Option<Handle>) -> Self {
        RuntimeError {
            kind: ErrorKind::Return(value),
            message: "return outside routine".to_string(),
        }
    }

    /// True for the control-flow kinds, which are not reported to the user
    pub fn is_control_flow(&self) -> bool {
        matches!(self.kind, ErrorKind::Break | ErrorKind::Continue | ErrorKind::Return(_))
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for symbol table and interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
