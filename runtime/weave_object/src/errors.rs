//! Error types for method dispatch and graph composition.
//!
//! # Structured Error Categories
//!
//! `DispatchErrorKind` carries the typed data for each failure. Factory
//! functions (e.g., `undefined_method()`) are the public way to build errors;
//! they populate both `kind` and `message`.
//!
//! The engine never catches its own errors: every failure propagates to the
//! caller with `?`, and nothing is retried.

use std::fmt;

use crate::value::Value;

/// Result of invoking a method.
pub type EvalResult = Result<Value, DispatchError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// Raised by the default message-not-understood handler.
    UndefinedMethod { method: String, receiver: String },
    /// `call_next` ran past the end of the chain and no custom handler
    /// intercepted it.
    NoSuperMethod { method: String, receiver: String },
    /// A higher layer refused to redefine a named unit.
    DuplicateDefinition { name: String },
    /// A native method received the wrong number of arguments.
    ArityMismatch {
        method: String,
        expected: usize,
        got: usize,
    },
    /// A native method received an argument of the wrong kind.
    TypeMismatch { expected: String, got: String },
    /// Failure raised by user method bodies.
    Custom { message: String },
}

impl fmt::Display for DispatchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedMethod { method, receiver } => {
                write!(f, "undefined method `{method}' for {receiver}")
            }
            Self::NoSuperMethod { method, receiver } => {
                write!(f, "no superclass method `{method}' for {receiver}")
            }
            Self::DuplicateDefinition { name } => write!(f, "`{name}' is already defined"),
            Self::ArityMismatch {
                method,
                expected,
                got,
            } => {
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                write!(f, "{method} expects {expected} {arg_word}, got {got}")
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Dispatch error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchError {
    /// Structured error category.
    pub kind: DispatchErrorKind,
    /// Human-readable error message; equals `kind.to_string()` for
    /// factory-created errors.
    pub message: String,
}

impl DispatchError {
    /// Create an error with just a message.
    ///
    /// Uses `Custom` kind. Method bodies use this to fail with their own text.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: DispatchErrorKind::Custom {
                message: message.clone(),
            },
            message,
        }
    }

    fn from_kind(kind: DispatchErrorKind) -> Self {
        let message = kind.to_string();
        Self { kind, message }
    }

    /// Check whether this is an `UndefinedMethod` error.
    pub fn is_undefined_method(&self) -> bool {
        matches!(self.kind, DispatchErrorKind::UndefinedMethod { .. })
    }

    /// Check whether this is a `NoSuperMethod` error.
    pub fn is_no_super_method(&self) -> bool {
        matches!(self.kind, DispatchErrorKind::NoSuperMethod { .. })
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DispatchError {}

/// The receiver does not understand `method`.
#[cold]
pub fn undefined_method(method: &str, receiver: &str) -> DispatchError {
    DispatchError::from_kind(DispatchErrorKind::UndefinedMethod {
        method: method.to_string(),
        receiver: receiver.to_string(),
    })
}

/// The super-call chain for `method` is exhausted.
#[cold]
pub fn no_super_method(method: &str, receiver: &str) -> DispatchError {
    DispatchError::from_kind(DispatchErrorKind::NoSuperMethod {
        method: method.to_string(),
        receiver: receiver.to_string(),
    })
}

/// A named unit already exists where redefinition is disallowed.
#[cold]
pub fn duplicate_definition(name: &str) -> DispatchError {
    DispatchError::from_kind(DispatchErrorKind::DuplicateDefinition {
        name: name.to_string(),
    })
}

/// Wrong number of arguments passed to a native method.
#[cold]
pub fn wrong_arg_count(method: &str, expected: usize, got: usize) -> DispatchError {
    DispatchError::from_kind(DispatchErrorKind::ArityMismatch {
        method: method.to_string(),
        expected,
        got,
    })
}

/// Argument of the wrong kind passed to a native method.
#[cold]
pub fn wrong_arg_type(expected: &str, got: &Value) -> DispatchError {
    DispatchError::from_kind(DispatchErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    })
}
