//! Error types for trace-context operations
//!
//! Two disjoint philosophies apply across this crate:
//!
//! - **Parsing is total and silent.** Malformed or absent header input to
//!   [`TraceParent::try_parse`](crate::TraceParent::try_parse),
//!   [`TraceState::from_header`](crate::TraceState::from_header) or the
//!   lenient entry cursor yields `None` or skips the offending list member.
//!   The wire protocol explicitly tolerates foreign or malformed trace data.
//! - **Mutation-site validation is strict.** Building a new `tracestate`
//!   entry from caller-supplied key/value raises a typed error with a fixed
//!   message. Nothing is retried; every operation is a pure in-memory
//!   transform, so failures surface immediately.
//!
//! Each variant has a stable error code (e.g. `INVALID_KEY`) for logging and
//! client-side handling.

use thiserror::Error;

/// Result type alias for trace-context operations
pub type Result<T> = std::result::Result<T, TraceContextError>;

/// Errors raised by strict construction-site validation
///
/// The rendered messages are part of the contract and never change.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceContextError {
    /// A `tracestate` update carried a key that fails the key grammar
    #[error("Key is invalid.")]
    InvalidKey,

    /// A `tracestate` update carried a value that fails the value grammar
    #[error("Value is invalid.")]
    InvalidValue,

    /// `Entries::try_next` was called past exhaustion
    #[error("Iterator has no more elements.")]
    EntriesExhausted,
}

impl TraceContextError {
    /// Returns the stable error code for this error
    ///
    /// Codes are uppercase, underscore-separated identifiers that remain
    /// stable across versions.
    pub fn error_code(&self) -> &'static str {
        match self {
            TraceContextError::InvalidKey => "INVALID_KEY",
            TraceContextError::InvalidValue => "INVALID_VALUE",
            TraceContextError::EntriesExhausted => "ENTRIES_EXHAUSTED",
        }
    }

    /// Returns true if this error indicates caller-supplied update data
    /// that fails the `tracestate` grammar
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TraceContextError::InvalidKey | TraceContextError::InvalidValue
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_fixed() {
        assert_eq!(TraceContextError::InvalidKey.to_string(), "Key is invalid.");
        assert_eq!(
            TraceContextError::InvalidValue.to_string(),
            "Value is invalid."
        );
        assert_eq!(
            TraceContextError::EntriesExhausted.to_string(),
            "Iterator has no more elements."
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TraceContextError::InvalidKey.error_code(), "INVALID_KEY");
        assert_eq!(
            TraceContextError::InvalidValue.error_code(),
            "INVALID_VALUE"
        );
        assert_eq!(
            TraceContextError::EntriesExhausted.error_code(),
            "ENTRIES_EXHAUSTED"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(TraceContextError::InvalidKey.is_validation());
        assert!(TraceContextError::InvalidValue.is_validation());
        assert!(!TraceContextError::EntriesExhausted.is_validation());
    }
}
