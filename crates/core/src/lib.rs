//! Shared building blocks for the messaging crates.
//!
//! No IO, no dispatch logic: just identifiers, the error model and the
//! value-object marker.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{MessagingError, MessagingResult};
pub use id::SubscriptionId;
pub use value_object::ValueObject;
