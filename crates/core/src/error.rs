//! Messaging error model.

use thiserror::Error;

/// Result type used across the messaging layer.
pub type MessagingResult<T> = Result<T, MessagingError>;

/// Messaging-level error.
///
/// Only setup paths (constructing sources, subscribing, installing the
/// process-wide service) return these. Dispatch never fails: handler failures
/// are reported inside the notify response instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// A value failed validation (e.g. an empty cross-cut subject).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The registry lock was poisoned by a panic while it was held.
    #[error("message registry lock poisoned")]
    Poisoned,

    /// The process-wide message service was already installed.
    #[error("message service already installed")]
    AlreadyInstalled,

    /// A lifecycle transition was requested from a state that does not allow it.
    #[error("invalid lifecycle transition: {0}")]
    Lifecycle(String),
}

impl MessagingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn lifecycle(msg: impl Into<String>) -> Self {
        Self::Lifecycle(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = MessagingError::validation("subject must not be empty");
        assert_eq!(err.to_string(), "validation failed: subject must not be empty");

        let err = MessagingError::lifecycle("already released");
        assert_eq!(err.to_string(), "invalid lifecycle transition: already released");
    }
}
