use std::sync::Arc;

use crate::payload::{MessageArgs, ResponseArgs, Sender};

/// Result returned by a handler.
///
/// `Ok(None)` means the handler had nothing to contribute for this sender; it
/// is left out of the aggregated response. Errors never abort dispatch: the
/// service records them and moves on to the next handler.
pub type HandlerResult = anyhow::Result<Option<ResponseArgs>>;

/// Subscriber logic invoked when a matching event is notified.
///
/// Handlers receive the sender and arguments by reference and must not rely on
/// being able to mutate them. They run synchronously on the publisher's call
/// stack, in subscription order.
pub trait MessageHandler: Send + Sync {
    /// Stable, human-readable name used in logs and failure reports.
    fn name(&self) -> &str;

    fn handle(&self, sender: &Sender, args: &MessageArgs) -> HandlerResult;
}

/// Handler built from a closure.
pub struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F> MessageHandler for FnHandler<F>
where
    F: Fn(&Sender, &MessageArgs) -> HandlerResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, sender: &Sender, args: &MessageArgs) -> HandlerResult {
        (self.f)(sender, args)
    }
}

/// Shared handle to a subscribed handler.
///
/// Identity is the handle's allocation: clones of one `HandlerRef` are the same
/// handler, while two handles built from identical closures are not. The
/// subscriber keeps its `HandlerRef` to unsubscribe that exact handler later.
#[derive(Clone)]
pub struct HandlerRef(Arc<dyn MessageHandler>);

impl HandlerRef {
    pub fn new<H: MessageHandler + 'static>(handler: H) -> Self {
        Self(Arc::new(handler))
    }

    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Sender, &MessageArgs) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(FnHandler {
            name: name.into(),
            f,
        })
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// True when both handles point at the same handler.
    pub fn same_as(&self, other: &HandlerRef) -> bool {
        // Compare data pointers only; vtable pointers may differ across codegen units.
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    pub fn handle(&self, sender: &Sender, args: &MessageArgs) -> HandlerResult {
        self.0.handle(sender, args)
    }
}

impl core::fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> HandlerRef {
        HandlerRef::from_fn(name, |_, _| Ok(None))
    }

    #[test]
    fn clones_share_identity() {
        let h = noop("h");
        let clone = h.clone();
        assert!(h.same_as(&clone));
    }

    #[test]
    fn identical_closures_are_distinct_handlers() {
        let a = noop("same");
        let b = noop("same");
        assert!(!a.same_as(&b));
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn invokes_the_wrapped_closure() {
        let h = HandlerRef::from_fn("echo", |sender, _| {
            Ok(Some(ResponseArgs::new().with("sender", sender.describe())))
        });

        let out = h
            .handle(&Sender::bag(Default::default()), &MessageArgs::new())
            .unwrap()
            .unwrap();
        assert_eq!(out.properties().text("sender"), Some("property bag"));
    }
}
