//! Sales ledger stand-in: issues document numbers and raises the host's
//! well-known "order saved" message.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use ledgerbus_events::{MessageArgs, MessageService, Response, Sender};

use crate::error::SalesResult;
use crate::order::{CustomerAccount, DocumentNo, SalesOrder};
use crate::sources::SopLedgerMessageSource;

#[derive(Debug)]
pub struct SalesLedger {
    service: Arc<MessageService>,
    last_issued: AtomicU64,
}

impl SalesLedger {
    pub fn new(service: Arc<MessageService>) -> Self {
        Self::starting_after(service, 0)
    }

    /// Ledger whose next document number follows `last_issued`.
    pub fn starting_after(service: Arc<MessageService>, last_issued: u64) -> Self {
        Self {
            service,
            last_issued: AtomicU64::new(last_issued),
        }
    }

    /// New draft order with the next document number.
    pub fn new_order(&self, customer: CustomerAccount) -> SalesOrder {
        let n = self.last_issued.fetch_add(1, Ordering::SeqCst) + 1;
        SalesOrder::new(DocumentNo::from_sequence(n), customer)
    }

    /// Save the order and notify `sop.order.saved` subscribers.
    pub fn save(&self, order: &mut SalesOrder) -> SalesResult<Response> {
        order.mark_saved()?;
        tracing::debug!(document_no = %order.document_no(), "sales order saved");

        Ok(self.service.notify(
            &SopLedgerMessageSource::ORDER_SAVED,
            &Sender::typed(order.clone()),
            &MessageArgs::new(),
        ))
    }

    pub fn post(&self, order: &mut SalesOrder) -> SalesResult<()> {
        order.mark_posted(Utc::now())?;
        tracing::debug!(document_no = %order.document_no(), "sales order posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use ledgerbus_events::{HandlerRef, ResponseArgs};

    use crate::error::SalesError;

    fn customer() -> CustomerAccount {
        CustomerAccount::new("ABB001").unwrap()
    }

    #[test]
    fn issues_sequential_document_numbers() {
        let ledger = SalesLedger::new(Arc::new(MessageService::new()));
        assert_eq!(ledger.new_order(customer()).document_no().as_str(), "SO00001");
        assert_eq!(ledger.new_order(customer()).document_no().as_str(), "SO00002");

        let ledger = SalesLedger::starting_after(Arc::new(MessageService::new()), 99);
        assert_eq!(ledger.new_order(customer()).document_no().as_str(), "SO00100");
    }

    #[test]
    fn save_notifies_order_saved_subscribers() {
        let service = Arc::new(MessageService::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        service
            .subscribe(
                SopLedgerMessageSource::ORDER_SAVED,
                HandlerRef::from_fn("capture", move |sender, _| {
                    let order = sender.downcast_ref::<SalesOrder>().unwrap();
                    s.lock().unwrap().push(order.document_no().to_string());
                    Ok(Some(ResponseArgs::new()))
                }),
            )
            .unwrap();

        let ledger = SalesLedger::new(service);
        let mut order = ledger.new_order(customer());
        let response = ledger.save(&mut order).unwrap();

        assert_eq!(*seen.lock().unwrap(), ["SO00001"]);
        assert_eq!(response.args().len(), 1);
    }

    #[test]
    fn save_without_subscribers_still_succeeds() {
        let ledger = SalesLedger::new(Arc::new(MessageService::new()));
        let mut order = ledger.new_order(customer());
        assert!(ledger.save(&mut order).unwrap().is_empty());
    }

    #[test]
    fn posting_requires_a_saved_order() {
        let ledger = SalesLedger::new(Arc::new(MessageService::new()));
        let mut order = ledger.new_order(customer());
        assert!(matches!(ledger.post(&mut order), Err(SalesError::InvalidState(_))));

        ledger.save(&mut order).unwrap();
        ledger.post(&mut order).unwrap();
        assert!(order.is_posted());
    }
}
