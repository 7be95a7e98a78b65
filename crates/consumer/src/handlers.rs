//! Handler bodies bound by the client initiator.
//!
//! Each handler matches on the sender, pulls out what it needs, writes one
//! highlighted console line and returns the document number it saw. Senders
//! they do not understand produce no output.

use std::sync::Arc;

use anyhow::Context;
use ledgerbus_events::{HandlerResult, MessageArgs, MessageHandler, ResponseArgs, Sender};
use ledgerbus_sales::{DespatchInstructions, SalesOrder};

use crate::sink::{ConsoleSink, Severity};

/// Response key carrying the document number the handler processed.
pub const RESPONSE_DOCUMENT_NO: &str = "document_no";

fn acknowledged(order: &SalesOrder) -> ResponseArgs {
    ResponseArgs::new().with(RESPONSE_DOCUMENT_NO, order.document_no().as_str())
}

/// Reacts to the host's `sop.order.saved` message.
pub struct OrderSavedHandler {
    sink: Arc<dyn ConsoleSink>,
}

impl OrderSavedHandler {
    pub const NAME: &'static str = "sop_order_saved";

    pub fn new(sink: Arc<dyn ConsoleSink>) -> Self {
        Self { sink }
    }
}

impl MessageHandler for OrderSavedHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, sender: &Sender, _args: &MessageArgs) -> HandlerResult {
        let Some(order) = sender.downcast_ref::<SalesOrder>() else {
            tracing::debug!(sender = sender.describe(), "order saved: ignoring sender");
            return Ok(None);
        };

        self.sink.write(
            Severity::Highlight,
            &format!("SOP Order '{}' saved.", order.document_no()),
        );
        Ok(Some(acknowledged(order)))
    }
}

/// Reacts to the cross-cut `SiconSalesOrder.Created` message.
///
/// Accepts either the order itself or a despatch-instructions bag.
pub struct OrderCreatedHandler {
    sink: Arc<dyn ConsoleSink>,
}

impl OrderCreatedHandler {
    pub const NAME: &'static str = "sicon_order_created";

    pub fn new(sink: Arc<dyn ConsoleSink>) -> Self {
        Self { sink }
    }
}

impl MessageHandler for OrderCreatedHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, sender: &Sender, _args: &MessageArgs) -> HandlerResult {
        match sender {
            Sender::Typed(_) => {
                let Some(order) = sender.downcast_ref::<SalesOrder>() else {
                    tracing::debug!(sender = sender.describe(), "order created: ignoring sender");
                    return Ok(None);
                };
                self.sink.write(
                    Severity::Highlight,
                    &format!("Sales Order '{}' created.", order.document_no()),
                );
                Ok(Some(acknowledged(order)))
            }
            Sender::Bag(bag) => {
                tracing::debug!(bag = %bag.to_json(), "order created with despatch bag");
                let instructions =
                    DespatchInstructions::from_bag(bag).context("decoding despatch instructions")?;
                let details = &instructions.details;

                let mut line = format!(
                    "Sales Order '{}' created for despatch via {} ({}).",
                    instructions.order.document_no(),
                    details.courier_service,
                    details.courier_service_description,
                );
                if let (Some(number), Some(header)) =
                    (&details.project_number, &details.project_header_number)
                {
                    line.push_str(&format!(" Project {number}/{header}."));
                }
                if details.signature_required {
                    line.push_str(" Signature required.");
                }

                self.sink.write(Severity::Highlight, &line);
                Ok(Some(acknowledged(&instructions.order)))
            }
        }
    }
}
