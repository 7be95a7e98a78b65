//! Order-creation workflow that publishes the cross-cut "order created" event.
//!
//! Each scenario creates an order for a customer, saves it (raising
//! `sop.order.saved`), posts it, then notifies `SiconSalesOrder.Created`:
//!
//! - [`OrderWorkflow::create_sales_order`] sends the order itself;
//! - [`OrderWorkflow::create_sales_order_advanced`] sends a property bag with
//!   the order and its despatch details.

use std::sync::Arc;

use ledgerbus_events::{MessageArgs, MessageService, MessageSource, Response, Sender};

use crate::despatch::{DespatchDetails, DespatchInstructions};
use crate::error::SalesResult;
use crate::ledger::SalesLedger;
use crate::order::{CustomerAccount, SalesOrder};
use crate::sources::SiconMessageSource;

/// Outcome of one workflow run.
#[derive(Debug)]
pub struct CreatedOrder {
    pub order: SalesOrder,
    /// Responses to `sop.order.saved`.
    pub saved: Response,
    /// Responses to `SiconSalesOrder.Created`.
    pub created: Response,
}

#[derive(Debug)]
pub struct OrderWorkflow {
    service: Arc<MessageService>,
    ledger: SalesLedger,
    order_created: MessageSource,
}

impl OrderWorkflow {
    pub fn new(service: Arc<MessageService>) -> SalesResult<Self> {
        Ok(Self {
            ledger: SalesLedger::new(service.clone()),
            order_created: SiconMessageSource::order_created()?,
            service,
        })
    }

    pub fn create_sales_order(&self, customer: &CustomerAccount) -> SalesResult<CreatedOrder> {
        let (order, saved) = self.create_and_post(customer)?;

        let created = self.service.notify(
            &self.order_created,
            &Sender::typed(order.clone()),
            &MessageArgs::new(),
        );
        tracing::info!(document_no = %order.document_no(), "sales order posted");

        Ok(CreatedOrder {
            order,
            saved,
            created,
        })
    }

    pub fn create_sales_order_advanced(
        &self,
        customer: &CustomerAccount,
        details: DespatchDetails,
    ) -> SalesResult<CreatedOrder> {
        let (order, saved) = self.create_and_post(customer)?;

        let bag = DespatchInstructions::new(order.clone(), details).into_bag();
        let created = self
            .service
            .notify(&self.order_created, &Sender::bag(bag), &MessageArgs::new());
        tracing::info!(
            document_no = %order.document_no(),
            "sales order posted with despatch instructions"
        );

        Ok(CreatedOrder {
            order,
            saved,
            created,
        })
    }

    fn create_and_post(&self, customer: &CustomerAccount) -> SalesResult<(SalesOrder, Response)> {
        let mut order = self.ledger.new_order(customer.clone());
        let saved = self.ledger.save(&mut order)?;
        self.ledger.post(&mut order)?;
        Ok((order, saved))
    }
}
