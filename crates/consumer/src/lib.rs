//! Client-side integration with the message service.
//!
//! [`ClientInitiator`] is created once at application start: it subscribes the
//! order handlers and arranges for them to be unsubscribed when the
//! application exits. Handlers write to a [`ConsoleSink`].

pub mod handlers;
pub mod initiator;
pub mod sink;

pub use handlers::{OrderCreatedHandler, OrderSavedHandler, RESPONSE_DOCUMENT_NO};
pub use initiator::ClientInitiator;
pub use sink::{AnsiConsole, ConsoleSink, MemorySink, Severity, format_line};
