//! The error type for this crate.
//!
//! The engine surfaces exactly two externally observable error kinds:
//! value-domain failures and protocol violations. Every fallible
//! operation in the crate reports through [`CivilError`].

use alloc::borrow::Cow;
use core::fmt;

/// The kinds of errors the engine can surface.
///
/// - [`ErrorKind::Value`]: the input was syntactically or semantically
///   present but outside the accepted value space (a bad ISO string, a
///   leap second inside a bracketed annotation, day 32, an undefined
///   nested calendar property, an unresolvable calendar identity).
/// - [`ErrorKind::Protocol`]: the input had the wrong shape or
///   capability entirely (a symbol-like value, a plain object lacking
///   `dateFromFields`, a mismatched capability check).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value-domain error.
    #[default]
    Value,
    /// A protocol violation error.
    Protocol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => "ValueDomainError".fmt(f),
            Self::Protocol => "ProtocolViolationError".fmt(f),
        }
    }
}

/// The error returned by fallible operations in this crate.
///
/// Errors raised by a caller-supplied calendar or time zone propagate
/// through the engine unchanged; the engine never wraps, retries, or
/// falls back to a default collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivilError {
    kind: ErrorKind,
    msg: Cow<'static, str>,
}

impl fmt::Display for CivilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)?;
        if !self.msg.is_empty() {
            write!(f, ": {}", self.msg)?;
        }
        Ok(())
    }
}

impl CivilError {
    #[inline]
    #[must_use]
    const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            msg: Cow::Borrowed(""),
        }
    }

    /// Creates a value-domain error.
    #[inline]
    #[must_use]
    pub const fn value() -> Self {
        Self::new(ErrorKind::Value)
    }

    /// Creates a protocol violation error.
    #[inline]
    #[must_use]
    pub const fn protocol() -> Self {
        Self::new(ErrorKind::Protocol)
    }

    /// Creates an internal assertion error.
    #[inline]
    #[must_use]
    pub(crate) const fn assert() -> Self {
        Self {
            kind: ErrorKind::Protocol,
            msg: Cow::Borrowed("internal engine invariant violated"),
        }
    }

    /// Attaches a message to the error.
    #[inline]
    #[must_use]
    pub fn with_message<S>(mut self, message: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        self.msg = message.into();
        self
    }

    /// Returns this error's kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns whether this is a value-domain error.
    #[inline]
    #[must_use]
    pub const fn is_value_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Value)
    }

    /// Returns whether this is a protocol violation error.
    #[inline]
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Protocol)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CivilError {}
