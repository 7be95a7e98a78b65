//! Message service: the publish/subscribe façade.
//!
//! ```text
//! publisher ──notify(source, sender, args)──► MessageService
//!                                                │ snapshot handlers (read lock)
//!                                                ├──► handler 1 ──► ResponseArgs
//!                                                ├──► handler 2 ──► error  → HandlerFailure
//!                                                └──► handler 3 ──► panic  → HandlerFailure
//!                                                ▼
//!                                             Response
//! ```
//!
//! ## Rules
//! - **Synchronous**: `notify` returns after every handler has returned.
//! - **Ordered**: handlers run in subscription order.
//! - **Snapshot dispatch**: the handler list is copied before dispatch and the
//!   lock released, so handlers may subscribe/unsubscribe without deadlocking;
//!   a handler removed after the snapshot may still run for that notify.
//! - **Fail loud at setup**: `subscribe`/`unsubscribe` return errors.
//! - **Fail soft at dispatch**: `notify` never errors. No subscribers yields an
//!   empty response; a handler error or panic is logged, recorded in the
//!   response, and the remaining handlers still run.
//!
//! ## Ownership
//! Construct a service explicitly and pass `Arc<MessageService>` to
//! collaborators. For call sites that cannot be handed one, a single
//! process-wide instance is reachable through [`MessageService::instance`],
//! with explicit [`install`](MessageService::install) and
//! [`reset`](MessageService::reset).

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use ledgerbus_core::{MessagingError, MessagingResult, SubscriptionId};

use crate::handler::HandlerRef;
use crate::payload::{HandlerFailure, MessageArgs, Response, Sender};
use crate::registry::{DuplicatePolicy, MessageRegistry, Subscription};
use crate::source::MessageSource;

static GLOBAL: RwLock<Option<Arc<MessageService>>> = RwLock::new(None);

#[derive(Debug, Default)]
pub struct MessageService {
    registry: RwLock<MessageRegistry>,
}

impl MessageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            registry: RwLock::new(MessageRegistry::with_policy(policy)),
        }
    }

    /// Process-wide instance, created on first access.
    pub fn instance() -> Arc<MessageService> {
        if let Some(existing) = Self::installed() {
            return existing;
        }

        let mut slot = GLOBAL.write().unwrap_or_else(|p| p.into_inner());
        // Another caller may have won the race between the read and the write.
        slot.get_or_insert_with(|| {
            tracing::debug!("creating process-wide message service");
            Arc::new(MessageService::new())
        })
        .clone()
    }

    /// Install `service` as the process-wide instance.
    ///
    /// Fails if one is already installed (or was lazily created).
    pub fn install(service: Arc<MessageService>) -> MessagingResult<()> {
        let mut slot = GLOBAL.write().map_err(|_| MessagingError::Poisoned)?;
        if slot.is_some() {
            return Err(MessagingError::AlreadyInstalled);
        }
        *slot = Some(service);
        Ok(())
    }

    /// The process-wide instance, if one exists. Never creates one.
    pub fn installed() -> Option<Arc<MessageService>> {
        GLOBAL.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Drop the process-wide instance, returning it.
    ///
    /// Holders of a previously obtained `Arc` keep a working service; the next
    /// [`instance`](Self::instance) call creates a fresh one.
    pub fn reset() -> Option<Arc<MessageService>> {
        GLOBAL.write().unwrap_or_else(|p| p.into_inner()).take()
    }

    pub fn subscribe(
        &self,
        source: MessageSource,
        handler: HandlerRef,
    ) -> MessagingResult<SubscriptionId> {
        self.subscribe_entry(source, handler).map(|(id, _)| id)
    }

    /// Like [`subscribe`](Self::subscribe), but returns `None` when the
    /// duplicate policy reused a subscription somebody else made.
    ///
    /// Callers that later remove by id must only remove ids returned here.
    pub fn subscribe_new(
        &self,
        source: MessageSource,
        handler: HandlerRef,
    ) -> MessagingResult<Option<SubscriptionId>> {
        self.subscribe_entry(source, handler)
            .map(|(id, created)| created.then_some(id))
    }

    fn subscribe_entry(
        &self,
        source: MessageSource,
        handler: HandlerRef,
    ) -> MessagingResult<(SubscriptionId, bool)> {
        let mut registry = self.registry.write().map_err(|_| MessagingError::Poisoned)?;
        let (id, created) = registry.subscribe(source.clone(), handler.clone());
        tracing::debug!(source = %source, handler = handler.name(), created, "subscribe");
        Ok((id, created))
    }

    /// Remove the first subscription of `handler` to `source`.
    ///
    /// Unknown sources or handlers are not an error; the result says whether
    /// anything was removed.
    pub fn unsubscribe(
        &self,
        source: &MessageSource,
        handler: &HandlerRef,
    ) -> MessagingResult<bool> {
        let mut registry = self.registry.write().map_err(|_| MessagingError::Poisoned)?;
        let removed = registry.unsubscribe(source, handler);
        tracing::debug!(source = %source, handler = handler.name(), removed, "unsubscribe");
        Ok(removed)
    }

    /// Remove one subscription by the id returned from [`subscribe`](Self::subscribe).
    pub fn unsubscribe_id(&self, id: SubscriptionId) -> MessagingResult<bool> {
        let mut registry = self.registry.write().map_err(|_| MessagingError::Poisoned)?;
        let removed = registry.remove(id);
        tracing::debug!(subscription_id = %id, removed, "unsubscribe by id");
        Ok(removed)
    }

    /// Ordered snapshot of the handlers currently bound to `source`.
    pub fn handlers_for(&self, source: &MessageSource) -> Vec<Subscription> {
        self.registry
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .handlers_for(source)
    }

    /// Total number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.registry.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Publish an event to every handler subscribed to `source`.
    pub fn notify(&self, source: &MessageSource, sender: &Sender, args: &MessageArgs) -> Response {
        let subscriptions = self.handlers_for(source);

        if subscriptions.is_empty() {
            tracing::trace!(source = %source, "notify: no subscribers");
            return Response::empty();
        }

        let mut response = Response::empty();
        for subscription in &subscriptions {
            response.record_invocation();
            let handler = subscription.handler();

            let outcome =
                std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(sender, args)));

            let reason = match outcome {
                Ok(Ok(Some(out))) => {
                    response.push_args(out);
                    continue;
                }
                Ok(Ok(None)) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
            };

            tracing::warn!(
                source = %source,
                subscription_id = %subscription.id(),
                handler = handler.name(),
                sender = sender.describe(),
                reason = %reason,
                "message handler failed; continuing dispatch"
            );
            response.push_failure(HandlerFailure {
                source: source.clone(),
                subscription_id: subscription.id(),
                handler: handler.name().to_string(),
                reason,
            });
        }

        tracing::debug!(
            source = %source,
            invoked = response.invoked(),
            responses = response.args().len(),
            failures = response.failures().len(),
            "notify complete"
        );
        response
    }
}

#[cfg(test)]
impl MessageService {
    /// Poison the registry lock the way a panicking writer would.
    pub(crate) fn poison_registry(&self) {
        let _ = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let _registry = self.registry.write();
            panic!("registry writer panicked");
        }));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
