//! Subscription lifecycle for integration shims.
//!
//! A [`SubscriptionSet`] owns a fixed list of `(source, handler)` bindings and
//! moves through `Idle → Subscribed → Released`:
//!
//! - `subscribe_all` registers every binding once. Repeating it while
//!   subscribed is a no-op, so nothing is ever registered twice. If one
//!   registration fails, the ones already made are rolled back and the set
//!   stays `Idle`.
//! - `unsubscribe_all` removes exactly the subscriptions made at startup,
//!   never one the duplicate policy reused from another subscriber,
//!   drops the handler references and makes the set `Released` (terminal).
//!   Repeating it is a no-op, so shutdown paths are safe after partial setup.
//! - `attach_to` ties `unsubscribe_all` to the process-exit hook.
//! - Dropping the set also unsubscribes, so a set that goes away before exit
//!   leaves nothing behind in the service.

use std::sync::{Arc, Mutex, Weak};

use ledgerbus_core::{MessagingError, MessagingResult, SubscriptionId};

use crate::handler::HandlerRef;
use crate::lifecycle::ApplicationExit;
use crate::service::MessageService;
use crate::source::MessageSource;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Bindings declared, nothing registered yet.
    Idle,
    /// Every binding is registered with the service.
    Subscribed,
    /// Unsubscribed and handler references dropped; cannot be reused.
    Released,
}

#[derive(Debug)]
struct Binding {
    source: MessageSource,
    handler: HandlerRef,
    subscription: Option<SubscriptionId>,
}

#[derive(Debug)]
struct Inner {
    state: SubscriptionState,
    bindings: Vec<Binding>,
}

#[derive(Debug)]
pub struct SubscriptionSet {
    service: Arc<MessageService>,
    inner: Mutex<Inner>,
}

impl SubscriptionSet {
    pub fn new(service: Arc<MessageService>) -> Self {
        Self {
            service,
            inner: Mutex::new(Inner {
                state: SubscriptionState::Idle,
                bindings: Vec::new(),
            }),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.lock().state
    }

    /// Number of declared bindings (zero once released).
    pub fn len(&self) -> usize {
        self.lock().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declare a binding. Only allowed before `subscribe_all`.
    pub fn bind(&self, source: MessageSource, handler: HandlerRef) -> MessagingResult<()> {
        let mut inner = self.lock();
        if inner.state != SubscriptionState::Idle {
            return Err(MessagingError::lifecycle(format!(
                "cannot bind handler '{}' in state {:?}",
                handler.name(),
                inner.state
            )));
        }
        inner.bindings.push(Binding {
            source,
            handler,
            subscription: None,
        });
        Ok(())
    }

    /// Register every binding with the service.
    pub fn subscribe_all(&self) -> MessagingResult<()> {
        let mut inner = self.lock();
        match inner.state {
            SubscriptionState::Subscribed => return Ok(()),
            SubscriptionState::Released => {
                return Err(MessagingError::lifecycle(
                    "subscription set was released and cannot subscribe again",
                ));
            }
            SubscriptionState::Idle => {}
        }

        for i in 0..inner.bindings.len() {
            let binding = &inner.bindings[i];
            match self
                .service
                .subscribe_new(binding.source.clone(), binding.handler.clone())
            {
                Ok(created) => inner.bindings[i].subscription = created,
                Err(err) => {
                    tracing::error!(error = %err, "subscribe failed; rolling back");
                    self.roll_back(&mut inner.bindings);
                    return Err(err);
                }
            }
        }

        inner.state = SubscriptionState::Subscribed;
        tracing::info!(bindings = inner.bindings.len(), "subscribed");
        Ok(())
    }

    /// Remove every subscription made by `subscribe_all` and release the handlers.
    ///
    /// Returns the number of subscriptions removed. Every binding is attempted
    /// even if one fails; the first error is returned.
    pub fn unsubscribe_all(&self) -> MessagingResult<usize> {
        let mut inner = self.lock();
        if inner.state == SubscriptionState::Released {
            return Ok(0);
        }

        let mut removed = 0;
        let mut first_err = None;
        for binding in inner.bindings.drain(..) {
            let Some(id) = binding.subscription else {
                continue;
            };
            match self.service.unsubscribe_id(id) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        source = %binding.source,
                        handler = binding.handler.name(),
                        "unsubscribe failed"
                    );
                    first_err.get_or_insert(err);
                }
            }
        }
        inner.state = SubscriptionState::Released;
        tracing::info!(removed, "unsubscribed");

        match first_err {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }

    // Undo the registrations made by a failed `subscribe_all`.
    fn roll_back(&self, bindings: &mut [Binding]) {
        for binding in bindings.iter_mut() {
            let Some(id) = binding.subscription.take() else {
                continue;
            };
            if let Err(err) = self.service.unsubscribe_id(id) {
                tracing::warn!(
                    error = %err,
                    source = %binding.source,
                    handler = binding.handler.name(),
                    "rollback unsubscribe failed"
                );
            }
        }
    }

    /// Run `unsubscribe_all` when `exit` fires.
    ///
    /// The hook holds only a weak reference; dropping the set first is fine.
    pub fn attach_to(self: &Arc<Self>, exit: &ApplicationExit) {
        let weak: Weak<Self> = Arc::downgrade(self);
        exit.on_exit(move || {
            if let Some(set) = weak.upgrade() {
                if let Err(err) = set.unsubscribe_all() {
                    tracing::warn!(error = %err, "unsubscribe on exit failed");
                }
            }
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        if let Err(err) = self.unsubscribe_all() {
            tracing::warn!(error = %err, "unsubscribe on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{MessageArgs, PropertyBag, Sender};
    use crate::registry::DuplicatePolicy;
    use crate::source::ProcessPoint;

    fn order_saved() -> MessageSource {
        MessageSource::well_known("sop.order.saved")
    }

    fn order_created() -> MessageSource {
        MessageSource::cross_cut("SiconSalesOrder", "Created", ProcessPoint::PostMethod).unwrap()
    }

    fn handler(name: &str) -> HandlerRef {
        HandlerRef::from_fn(name, |_, _| Ok(None))
    }

    fn set_with_two_bindings(service: &Arc<MessageService>) -> SubscriptionSet {
        let set = SubscriptionSet::new(service.clone());
        set.bind(order_saved(), handler("saved")).unwrap();
        set.bind(order_created(), handler("created")).unwrap();
        set
    }

    #[test]
    fn subscribe_registers_every_binding() {
        let service = Arc::new(MessageService::new());
        let set = set_with_two_bindings(&service);

        set.subscribe_all().unwrap();

        assert_eq!(set.state(), SubscriptionState::Subscribed);
        assert_eq!(service.handlers_for(&order_saved()).len(), 1);
        assert_eq!(service.handlers_for(&order_created()).len(), 1);
    }

    #[test]
    fn subscribe_twice_does_not_double_register() {
        let service = Arc::new(MessageService::new());
        let set = set_with_two_bindings(&service);

        set.subscribe_all().unwrap();
        set.subscribe_all().unwrap();

        assert_eq!(service.subscription_count(), 2);
    }

    #[test]
    fn unsubscribe_releases_everything() {
        let service = Arc::new(MessageService::new());
        let set = set_with_two_bindings(&service);
        set.subscribe_all().unwrap();

        assert_eq!(set.unsubscribe_all().unwrap(), 2);
        assert_eq!(set.state(), SubscriptionState::Released);
        assert!(set.is_empty());
        assert_eq!(service.subscription_count(), 0);

        let response = service.notify(
            &order_saved(),
            &Sender::bag(PropertyBag::new()),
            &MessageArgs::new(),
        );
        assert_eq!(response.invoked(), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent_and_safe_before_subscribe() {
        let service = Arc::new(MessageService::new());
        let set = set_with_two_bindings(&service);

        assert_eq!(set.unsubscribe_all().unwrap(), 0);
        assert_eq!(set.unsubscribe_all().unwrap(), 0);
        assert_eq!(set.state(), SubscriptionState::Released);
    }

    #[test]
    fn released_set_cannot_be_reused() {
        let service = Arc::new(MessageService::new());
        let set = set_with_two_bindings(&service);
        set.subscribe_all().unwrap();
        set.unsubscribe_all().unwrap();

        assert!(matches!(set.subscribe_all(), Err(MessagingError::Lifecycle(_))));
        assert!(matches!(
            set.bind(order_saved(), handler("late")),
            Err(MessagingError::Lifecycle(_))
        ));
        assert_eq!(service.subscription_count(), 0);
    }

    #[test]
    fn leaves_foreign_subscriptions_alone() {
        let service = Arc::new(MessageService::new());
        let shared = handler("shared");
        service.subscribe(order_saved(), shared.clone()).unwrap();

        let set = SubscriptionSet::new(service.clone());
        set.bind(order_saved(), shared).unwrap();
        set.subscribe_all().unwrap();
        assert_eq!(service.subscription_count(), 2);

        set.unsubscribe_all().unwrap();
        assert_eq!(service.subscription_count(), 1);
    }

    #[test]
    fn leaves_foreign_subscriptions_alone_when_duplicates_are_ignored() {
        let service = Arc::new(MessageService::with_policy(DuplicatePolicy::Ignore));
        let shared = handler("shared");
        let foreign = service.subscribe(order_saved(), shared.clone()).unwrap();

        let set = SubscriptionSet::new(service.clone());
        set.bind(order_saved(), shared).unwrap();
        set.bind(order_created(), handler("own")).unwrap();
        set.subscribe_all().unwrap();
        assert_eq!(service.subscription_count(), 2);

        assert_eq!(set.unsubscribe_all().unwrap(), 1);
        let remaining = service.handlers_for(&order_saved());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), foreign);
        assert!(service.handlers_for(&order_created()).is_empty());
    }

    #[test]
    fn failed_subscribe_leaves_set_idle_and_registers_nothing() {
        let service = Arc::new(MessageService::new());
        let set = set_with_two_bindings(&service);
        service.poison_registry();

        assert!(matches!(set.subscribe_all(), Err(MessagingError::Poisoned)));
        assert_eq!(set.state(), SubscriptionState::Idle);
        assert_eq!(set.len(), 2);
        assert_eq!(service.subscription_count(), 0);
    }

    #[test]
    fn roll_back_removes_only_recorded_subscriptions() {
        let service = Arc::new(MessageService::new());
        let foreign = service.subscribe(order_created(), handler("foreign")).unwrap();
        let set = set_with_two_bindings(&service);

        {
            let mut inner = set.lock();
            let first = &inner.bindings[0];
            let id = service
                .subscribe_new(first.source.clone(), first.handler.clone())
                .unwrap();
            inner.bindings[0].subscription = id;
            assert_eq!(service.subscription_count(), 2);

            set.roll_back(&mut inner.bindings);
            assert!(inner.bindings.iter().all(|b| b.subscription.is_none()));
        }

        assert_eq!(set.state(), SubscriptionState::Idle);
        let remaining = service.handlers_for(&order_created());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), foreign);
        assert!(service.handlers_for(&order_saved()).is_empty());
    }

    #[test]
    fn exit_hook_unsubscribes() {
        let service = Arc::new(MessageService::new());
        let set = Arc::new(set_with_two_bindings(&service));
        set.subscribe_all().unwrap();

        let exit = ApplicationExit::new();
        set.attach_to(&exit);
        exit.fire();

        assert_eq!(set.state(), SubscriptionState::Released);
        assert_eq!(service.subscription_count(), 0);
    }

    #[test]
    fn dropping_the_set_unsubscribes_and_exit_still_fires() {
        let service = Arc::new(MessageService::new());
        let exit = ApplicationExit::new();
        {
            let set = Arc::new(set_with_two_bindings(&service));
            set.subscribe_all().unwrap();
            set.attach_to(&exit);
            assert_eq!(service.subscription_count(), 2);
        }
        assert_eq!(service.subscription_count(), 0);
        assert_eq!(exit.fire(), 1);
    }
}
