//! Source → ordered handler list mapping.
//!
//! The registry is plain data with no locking of its own; [`MessageService`]
//! wraps it in an `RwLock`.
//!
//! ## Rules
//! - Handlers for a source are kept in subscription order.
//! - No deduplication by default: subscribing a handler twice makes it run
//!   twice per notify. [`DuplicatePolicy::Ignore`] turns that into a no-op.
//! - Unsubscribing removes the **first** occurrence, matched by handler
//!   identity. Unknown sources and handlers are a no-op.
//! - A source's entry is dropped as soon as its last handler is removed.
//!
//! [`MessageService`]: crate::service::MessageService

use std::collections::HashMap;

use ledgerbus_core::SubscriptionId;

use crate::handler::HandlerRef;
use crate::source::MessageSource;

/// What to do when a handler is subscribed to a source it is already bound to.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Add another entry; the handler runs once per entry.
    #[default]
    Allow,
    /// Keep the existing entry and return its id.
    Ignore,
}

/// One handler bound to one source.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    handler: HandlerRef,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }
}

#[derive(Debug, Default)]
pub struct MessageRegistry {
    entries: HashMap<MessageSource, Vec<Subscription>>,
    policy: DuplicatePolicy,
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
        }
    }

    /// Append `handler` to the list for `source`, creating the list if needed.
    ///
    /// Returns the subscription id and whether a new entry was created. Under
    /// [`DuplicatePolicy::Ignore`] an existing binding is reused and reported
    /// with `false`; that entry still belongs to whoever created it.
    pub fn subscribe(
        &mut self,
        source: MessageSource,
        handler: HandlerRef,
    ) -> (SubscriptionId, bool) {
        let list = self.entries.entry(source).or_default();

        if self.policy == DuplicatePolicy::Ignore
            && let Some(existing) = list.iter().find(|s| s.handler.same_as(&handler))
        {
            return (existing.id, false);
        }

        let id = SubscriptionId::new();
        list.push(Subscription { id, handler });
        (id, true)
    }

    /// Remove the first occurrence of `handler` from `source`.
    ///
    /// Returns whether anything was removed.
    pub fn unsubscribe(&mut self, source: &MessageSource, handler: &HandlerRef) -> bool {
        let Some(list) = self.entries.get_mut(source) else {
            return false;
        };

        let Some(pos) = list.iter().position(|s| s.handler.same_as(handler)) else {
            return false;
        };

        list.remove(pos);
        if list.is_empty() {
            self.entries.remove(source);
        }
        true
    }

    /// Remove the subscription with the given id, wherever it is.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let found = self.entries.iter().find_map(|(source, list)| {
            list.iter()
                .position(|s| s.id == id)
                .map(|pos| (source.clone(), pos))
        });

        let Some((source, pos)) = found else {
            return false;
        };

        if let Some(list) = self.entries.get_mut(&source) {
            list.remove(pos);
            if list.is_empty() {
                self.entries.remove(&source);
            }
        }
        true
    }

    /// Ordered snapshot of the subscriptions for `source` (empty if unknown).
    pub fn handlers_for(&self, source: &MessageSource) -> Vec<Subscription> {
        self.entries.get(source).cloned().unwrap_or_default()
    }

    /// Sources that currently have at least one handler.
    pub fn sources(&self) -> Vec<MessageSource> {
        self.entries.keys().cloned().collect()
    }

    /// Total number of subscriptions across all sources.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

}
