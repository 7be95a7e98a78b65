//! Payload containers routed through a notify call.
//!
//! The router never interprets these; it only carries them from the publisher
//! to each handler and collects what handlers hand back.
//!
//! - [`Sender`] replaces runtime type inspection of "the object that raised the
//!   event" with an explicit union: a typed domain object or a key/value bag.
//! - [`PropertyBag`] maps string keys to a closed set of value kinds
//!   ([`ArgValue`]), so heterogeneous metadata (an order, a courier name, a
//!   flag) travels without an untyped object map.
//! - [`MessageArgs`] / [`ResponseArgs`] are the extensible argument and result
//!   containers; [`Response`] aggregates one notify call.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map as JsonMap, Value as JsonValue};

use ledgerbus_core::SubscriptionId;

use crate::source::MessageSource;

/// A domain object routed by reference.
///
/// Implemented for every `Any + Debug + Send + Sync` type; handlers recover the
/// concrete type with `downcast_ref`.
pub trait DomainObject: Any + core::fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Type name, for logs.
    fn type_name(&self) -> &'static str;
}

impl<T> DomainObject for T
where
    T: Any + core::fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn DomainObject {
    pub fn downcast_ref<T: DomainObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A single property value.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Flag(bool),
    Object(Arc<dyn DomainObject>),
}

impl ArgValue {
    /// Wrap a domain object.
    pub fn object<T: DomainObject>(value: T) -> Self {
        ArgValue::Object(Arc::new(value))
    }

    /// JSON rendering for logs. Objects render as their `Debug` form.
    pub fn to_json(&self) -> JsonValue {
        match self {
            ArgValue::Text(s) => JsonValue::String(s.clone()),
            ArgValue::Integer(i) => JsonValue::from(*i),
            ArgValue::Decimal(d) => JsonValue::from(*d),
            ArgValue::Flag(b) => JsonValue::Bool(*b),
            ArgValue::Object(o) => JsonValue::String(format!("{o:?}")),
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgValue::Text(a), ArgValue::Text(b)) => a == b,
            (ArgValue::Integer(a), ArgValue::Integer(b)) => a == b,
            (ArgValue::Decimal(a), ArgValue::Decimal(b)) => a == b,
            (ArgValue::Flag(a), ArgValue::Flag(b)) => a == b,
            // Objects are references: equal only when they are the same object.
            (ArgValue::Object(a), ArgValue::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_owned())
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Integer(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Decimal(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Flag(value)
    }
}

impl From<Arc<dyn DomainObject>> for ArgValue {
    fn from(value: Arc<dyn DomainObject>) -> Self {
        ArgValue::Object(value)
    }
}

/// Ordered string-keyed property map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: BTreeMap<String, ArgValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ArgValue>,
    ) -> Option<ArgValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.entries.get(key)? {
            ArgValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn decimal(&self, key: &str) -> Option<f64> {
        match self.entries.get(key)? {
            ArgValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.entries.get(key)? {
            ArgValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Shared handle to an object property, if present.
    pub fn object_ref(&self, key: &str) -> Option<&Arc<dyn DomainObject>> {
        match self.entries.get(key)? {
            ArgValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Object property downcast to `T`; `None` if absent or of another type.
    pub fn object<T: DomainObject>(&self, key: &str) -> Option<&T> {
        self.object_ref(key)?.downcast_ref::<T>()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// JSON object rendering for logs.
    pub fn to_json(&self) -> JsonValue {
        let map: JsonMap<String, JsonValue> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyBag
where
    K: Into<String>,
    V: Into<ArgValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

/// The object that raised an event.
#[derive(Debug, Clone)]
pub enum Sender {
    /// A domain object (e.g. a sales order).
    Typed(Arc<dyn DomainObject>),
    /// A key/value bag of loosely related values.
    Bag(PropertyBag),
}

impl Sender {
    pub fn typed<T: DomainObject>(value: T) -> Self {
        Sender::Typed(Arc::new(value))
    }

    pub fn bag(bag: PropertyBag) -> Self {
        Sender::Bag(bag)
    }

    /// Typed sender downcast to `T`; `None` for bags or other types.
    pub fn downcast_ref<T: DomainObject>(&self) -> Option<&T> {
        match self {
            Sender::Typed(o) => o.downcast_ref::<T>(),
            Sender::Bag(_) => None,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> &'static str {
        match self {
            Sender::Typed(o) => o.as_ref().type_name(),
            Sender::Bag(_) => "property bag",
        }
    }
}

/// Arguments passed alongside the sender.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageArgs {
    raised_at: DateTime<Utc>,
    properties: PropertyBag,
}

impl MessageArgs {
    pub fn new() -> Self {
        Self::with_properties(PropertyBag::new())
    }

    pub fn with_properties(properties: PropertyBag) -> Self {
        Self {
            raised_at: Utc::now(),
            properties,
        }
    }

    pub fn raised_at(&self) -> DateTime<Utc> {
        self.raised_at
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }
}

impl Default for MessageArgs {
    fn default() -> Self {
        Self::new()
    }
}

/// Output contributed by one handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseArgs {
    properties: PropertyBag,
}

impl ResponseArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.properties.insert(key, value);
        self
    }

    pub fn from_properties(properties: PropertyBag) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }
}

/// A handler that returned an error or panicked during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub source: MessageSource,
    pub subscription_id: SubscriptionId,
    pub handler: String,
    pub reason: String,
}

/// Aggregate result of a notify call.
///
/// `args` holds one entry per handler that produced output, in invocation
/// order. `failures` is non-empty when some handlers failed; the others still
/// ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    args: Vec<ResponseArgs>,
    failures: Vec<HandlerFailure>,
    invoked: usize,
}

impl Response {
    /// Response of a notify that reached no handler.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn record_invocation(&mut self) {
        self.invoked += 1;
    }

    pub(crate) fn push_args(&mut self, args: ResponseArgs) {
        self.args.push(args);
    }

    pub(crate) fn push_failure(&mut self, failure: HandlerFailure) {
        self.failures.push(failure);
    }

    pub fn args(&self) -> &[ResponseArgs] {
        &self.args
    }

    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    /// Number of handlers invoked, including failed ones.
    pub fn invoked(&self) -> usize {
        self.invoked
    }

    /// True when no handler contributed output and none failed.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.failures.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
