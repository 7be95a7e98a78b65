//! Sales order collaborator for the message routing layer.
//!
//! A deliberately small model of the accounting system's sales order
//! processing: enough to raise the host's well-known "order saved" message and
//! the integration's cross-cut "order created" message. Pricing, lines, stock
//! and persistence belong to the accounting system and are not modelled.

pub mod despatch;
pub mod error;
pub mod ledger;
pub mod order;
pub mod sources;
pub mod workflow;

pub use despatch::{DespatchDetails, DespatchInstructions};
pub use error::{SalesError, SalesResult};
pub use ledger::SalesLedger;
pub use order::{CustomerAccount, DocumentNo, SalesOrder, SalesOrderStatus};
pub use sources::{SiconMessageSource, SopLedgerMessageSource};
pub use workflow::{CreatedOrder, OrderWorkflow};
