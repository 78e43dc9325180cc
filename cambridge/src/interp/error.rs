//! Runtime errors for the interpreter

use crate::ast::Position;
use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Position of the innermost statement that was executing
    pub position: Option<Position>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// Identifier bound nowhere in the scope chain or builtin registry
    NameNotFound,
    /// Write to a CONSTANT
    ConstantViolation,
    /// Operand or argument of the wrong type
    TypeMismatch,
    /// Builtin called with the wrong number of arguments
    ArityMismatch,
    /// Division by zero
    DivisionByZero,
    /// Argument outside the domain of a builtin
    DomainError,
    /// Bad array index or index out of declared bounds
    IndexError,
    /// File or console I/O failure
    IoError,
    /// Unknown class, NEW on a non-class, unknown member
    ClassError,
    /// Call depth exceeded the configured limit
    StackOverflow,
    /// Control flow: RETURN unwinding to the enclosing call
    Return(Box<crate::interp::Value>),
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
            position: None,
        }
    }

    pub fn name_not_found(name: &str) -> Self {
        Self::new(ErrorKind::NameNotFound, format!("identifier not found: {name}"))
    }

    pub fn constant_violation(name: &str) -> Self {
        Self::new(
            ErrorKind::ConstantViolation,
            format!("cannot modify constant: {name}"),
        )
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, message)
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::ArityMismatch,
            format!("{name} requires {expected} argument(s), got {got}"),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero")
    }

    pub fn domain_error(name: &str, message: &str) -> Self {
        Self::new(ErrorKind::DomainError, format!("{name}: {message}"))
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexError, message)
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoError, message)
    }

    pub fn class_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClassError, message)
    }

    pub fn stack_overflow(limit: usize) -> Self {
        Self::new(
            ErrorKind::StackOverflow,
            format!("stack overflow: call depth exceeded {limit}"),
        )
    }

    /// Wrap a RETURN value so it unwinds through `?`
    pub fn return_signal(value: crate::interp::Value) -> Self {
        Self::new(ErrorKind::Return(Box::new(value)), "RETURN outside of a routine")
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, ErrorKind::Return(_))
    }

    /// Record `position` unless a more specific one is already set
    pub fn at(mut self, position: Position) -> Self {
        if self.position.is_none() && !self.is_return() {
            self.position = Some(position);
        }
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(
                f,
                "ERROR at line {}, column {}: {}",
                pos.line, pos.column, self.message
            ),
            None => write!(f, "ERROR: {}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
