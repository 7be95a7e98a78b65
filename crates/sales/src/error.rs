use thiserror::Error;

use ledgerbus_core::MessagingError;

pub type SalesResult<T> = Result<T, SalesError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SalesError {
    /// A value failed validation (e.g. blank customer account).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The order is not in a state that allows the operation.
    #[error("invalid order state: {0}")]
    InvalidState(String),

    /// Setting up a message source or subscription failed.
    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

impl SalesError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
