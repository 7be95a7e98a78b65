//! Message sources raised by the sales ledger and the order workflow.

use ledgerbus_core::MessagingResult;
use ledgerbus_events::{MessageSource, ProcessPoint};

/// Sources the host accounting platform raises for sales order processing.
#[derive(Debug)]
pub struct SopLedgerMessageSource;

impl SopLedgerMessageSource {
    /// Raised every time a sales order is saved.
    pub const ORDER_SAVED: MessageSource = MessageSource::well_known("sop.order.saved");
}

/// Cross-cut sources defined by this integration.
#[derive(Debug)]
pub struct SiconMessageSource;

impl SiconMessageSource {
    pub const SALES_ORDER_SUBJECT: &'static str = "SiconSalesOrder";
    pub const CREATED_ACTION: &'static str = "Created";

    /// Raised after a sales order has been created and posted.
    pub fn order_created() -> MessagingResult<MessageSource> {
        MessageSource::cross_cut(
            Self::SALES_ORDER_SUBJECT,
            Self::CREATED_ACTION,
            ProcessPoint::PostMethod,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_created_is_a_post_method_cross_cut() {
        match SiconMessageSource::order_created().unwrap() {
            MessageSource::CrossCut(s) => {
                assert_eq!(s.subject(), "SiconSalesOrder");
                assert_eq!(s.action(), "Created");
                assert_eq!(s.process_point(), ProcessPoint::PostMethod);
            }
            other => panic!("expected cross-cut source, got {other}"),
        }
    }

    #[test]
    fn sources_are_distinct() {
        assert_ne!(
            SopLedgerMessageSource::ORDER_SAVED,
            SiconMessageSource::order_created().unwrap()
        );
    }
}
