use std::sync::Arc;

use ledgerbus_core::MessagingResult;
use ledgerbus_events::{
    ApplicationExit, HandlerRef, MessageService, SubscriptionSet, SubscriptionState,
};
use ledgerbus_sales::{SiconMessageSource, SopLedgerMessageSource};

use crate::handlers::{OrderCreatedHandler, OrderSavedHandler};
use crate::sink::ConsoleSink;

/// Subscribes this integration's handlers at startup and unsubscribes them at exit.
///
/// Construction registers:
/// - [`OrderSavedHandler`] on `sop.order.saved`;
/// - [`OrderCreatedHandler`] on `SiconSalesOrder.Created` (post-method).
///
/// Setup failures are returned to the caller, who decides whether the
/// application can run without these subscriptions.
#[derive(Debug)]
pub struct ClientInitiator {
    subscriptions: Arc<SubscriptionSet>,
}

impl ClientInitiator {
    /// Subscribe against `service` and hook unsubscription to `exit`.
    pub fn new(
        service: Arc<MessageService>,
        exit: &ApplicationExit,
        sink: Arc<dyn ConsoleSink>,
    ) -> MessagingResult<Self> {
        let subscriptions = Arc::new(SubscriptionSet::new(service));

        subscriptions.bind(
            SopLedgerMessageSource::ORDER_SAVED,
            HandlerRef::new(OrderSavedHandler::new(sink.clone())),
        )?;
        subscriptions.bind(
            SiconMessageSource::order_created()?,
            HandlerRef::new(OrderCreatedHandler::new(sink)),
        )?;

        subscriptions.subscribe_all()?;
        subscriptions.attach_to(exit);

        Ok(Self { subscriptions })
    }

    /// Same as [`new`](Self::new), against the process-wide service and exit hook.
    pub fn with_global(sink: Arc<dyn ConsoleSink>) -> MessagingResult<Self> {
        Self::new(MessageService::instance(), ApplicationExit::global(), sink)
    }

    pub fn state(&self) -> SubscriptionState {
        self.subscriptions.state()
    }

    /// Unsubscribe now instead of waiting for the exit hook.
    ///
    /// Returns the number of subscriptions removed; later calls return 0.
    pub fn shutdown(&self) -> MessagingResult<usize> {
        self.subscriptions.unsubscribe_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn subscribes_both_handlers() {
        let service = Arc::new(MessageService::new());
        let exit = ApplicationExit::new();
        let initiator =
            ClientInitiator::new(service.clone(), &exit, Arc::new(MemorySink::new())).unwrap();

        assert_eq!(initiator.state(), SubscriptionState::Subscribed);
        assert_eq!(service.subscription_count(), 2);

        let saved = service.handlers_for(&SopLedgerMessageSource::ORDER_SAVED);
        assert_eq!(saved[0].handler().name(), OrderSavedHandler::NAME);
        let created = service.handlers_for(&SiconMessageSource::order_created().unwrap());
        assert_eq!(created[0].handler().name(), OrderCreatedHandler::NAME);
    }

    #[test]
    fn shutdown_then_exit_is_safe() {
        let service = Arc::new(MessageService::new());
        let exit = ApplicationExit::new();
        let initiator =
            ClientInitiator::new(service.clone(), &exit, Arc::new(MemorySink::new())).unwrap();

        assert_eq!(initiator.shutdown().unwrap(), 2);
        exit.fire();
        assert_eq!(initiator.shutdown().unwrap(), 0);
        assert_eq!(initiator.state(), SubscriptionState::Released);
        assert_eq!(service.subscription_count(), 0);
    }

    // The only test in this crate touching the process-wide service and exit hook.
    #[test]
    fn with_global_uses_the_installed_service() {
        MessageService::reset();
        let service = Arc::new(MessageService::new());
        MessageService::install(service.clone()).unwrap();

        let initiator = ClientInitiator::with_global(Arc::new(MemorySink::new())).unwrap();
        assert_eq!(initiator.state(), SubscriptionState::Subscribed);
        assert_eq!(service.subscription_count(), 2);

        ApplicationExit::global().fire();
        assert_eq!(initiator.state(), SubscriptionState::Released);
        assert_eq!(service.subscription_count(), 0);

        MessageService::reset();
    }
}
