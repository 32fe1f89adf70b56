//! Structured error values shared by all engine layers.
//!
//! Acceptor *rejection* is never an error: a rejecting acceptor simply
//! pushes nothing into its spectrum. The error type below is reserved for
//! genuine failures — bad casts, division by zero, left recursion, pool
//! exhaustion and the like — and carries an optional grammar source
//! location so embeddings can point at the offending construct.

use crate::span::SourceLoc;
use std::fmt;

/// Classification of an engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value could not be coerced to the requested type.
    BadCast,
    /// Division or modulus where the right side coerced to zero.
    DivByZero,
    /// A strict-mode read of a variable with no definition.
    UndefinedVariable,
    /// The recursion guard re-entered the same arc at the same range
    /// more often than the configured tolerance.
    LeftRecursion,
    /// The state pool is exhausted.
    PoolOverflow,
    /// The search queue exceeded its configured bound.
    QueueOverflow,
    /// Malformed grammar: unresolved rule reference, duplicate definition,
    /// or an inconsistent compiled network.
    Grammar,
    /// An operation was invoked in the wrong engine state.
    Logic,
    /// Any other runtime failure (regex engine, observer abort, ...).
    Runtime,
}

impl ErrorKind {
    /// Short lowercase tag used in rendered messages.
    pub fn tag(self) -> &'static str {
        match self {
            ErrorKind::BadCast => "bad cast",
            ErrorKind::DivByZero => "division by zero",
            ErrorKind::UndefinedVariable => "undefined variable",
            ErrorKind::LeftRecursion => "left recursion",
            ErrorKind::PoolOverflow => "pool overflow",
            ErrorKind::QueueOverflow => "queue overflow",
            ErrorKind::Grammar => "grammar error",
            ErrorKind::Logic => "logic error",
            ErrorKind::Runtime => "runtime error",
        }
    }
}

/// An engine failure: kind, human-readable message, optional originating
/// function or rule name, optional grammar source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub function: Option<String>,
    pub location: Option<SourceLoc>,
}

impl Error {
    /// Creates an error with no attached context.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            function: None,
            location: None,
        }
    }

    /// Attaches the name of the rule or function that raised the error.
    pub fn in_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Attaches a grammar source location, keeping an earlier one if set.
    pub fn at(mut self, location: SourceLoc) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.tag(), self.message)?;
        if let Some(function) = &self.function {
            write!(f, " in {}", function)?;
        }
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Runtime, err.to_string())
    }
}

/// Alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
