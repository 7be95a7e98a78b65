//! In-process publish/subscribe message routing.
//!
//! Publishers raise an event with [`MessageService::notify`]; every handler
//! subscribed to that [`MessageSource`] runs synchronously, in subscription
//! order, and their outputs are aggregated into one [`Response`].
//!
//! Publishers and subscribers are decoupled: notifying a source nobody listens
//! to is normal and yields an empty response.

pub mod handler;
pub mod initiator;
pub mod lifecycle;
pub mod payload;
pub mod registry;
pub mod service;
pub mod source;

pub use handler::{FnHandler, HandlerRef, HandlerResult, MessageHandler};
pub use initiator::{SubscriptionSet, SubscriptionState};
pub use lifecycle::{ApplicationExit, ExitGuard};
pub use payload::{
    ArgValue, DomainObject, HandlerFailure, MessageArgs, PropertyBag, Response, ResponseArgs,
    Sender,
};
pub use registry::{DuplicatePolicy, MessageRegistry, Subscription};
pub use service::MessageService;
pub use source::{CrossCutSource, MessageSource, ProcessPoint, WellKnownSource};

pub use ledgerbus_core::{MessagingError, MessagingResult, SubscriptionId};
