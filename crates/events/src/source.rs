//! Message sources: the identity of a class of event.
//!
//! A source is either **well-known** (a fixed identifier supplied by the host
//! platform, e.g. "order saved") or **cross-cut** (defined by the integrator and
//! keyed by subject, action and process point).
//!
//! Sources are plain values: immutable, cheap to clone, compared and hashed
//! structurally. The registry uses them as map keys, so two sources built
//! independently from the same fields address the same handler list.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use ledgerbus_core::{MessagingError, MessagingResult, ValueObject};

/// When a cross-cut event fires relative to the domain operation it instruments.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessPoint {
    /// Raised before the instrumented operation runs.
    PreMethod,
    /// Raised after the instrumented operation completed.
    PostMethod,
}

impl ProcessPoint {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessPoint::PreMethod => "pre_method",
            ProcessPoint::PostMethod => "post_method",
        }
    }
}

impl core::fmt::Display for ProcessPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-supplied event identifier (e.g. `"sop.order.saved"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WellKnownSource(Cow<'static, str>);

impl WellKnownSource {
    /// Declare a well-known source in `const` context.
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Integrator-defined source keyed by `(subject, action, process point)`.
///
/// Subject and action are never empty; construction and deserialization both
/// validate this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CrossCutSourceRepr")]
pub struct CrossCutSource {
    subject: String,
    action: String,
    process_point: ProcessPoint,
}

impl CrossCutSource {
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        process_point: ProcessPoint,
    ) -> MessagingResult<Self> {
        let subject = subject.into();
        let action = action.into();

        if subject.trim().is_empty() {
            return Err(MessagingError::validation("cross-cut subject must not be empty"));
        }
        if action.trim().is_empty() {
            return Err(MessagingError::validation("cross-cut action must not be empty"));
        }

        Ok(Self {
            subject,
            action,
            process_point,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn process_point(&self) -> ProcessPoint {
        self.process_point
    }
}

#[derive(Deserialize)]
struct CrossCutSourceRepr {
    subject: String,
    action: String,
    process_point: ProcessPoint,
}

impl TryFrom<CrossCutSourceRepr> for CrossCutSource {
    type Error = MessagingError;

    fn try_from(repr: CrossCutSourceRepr) -> MessagingResult<Self> {
        CrossCutSource::new(repr.subject, repr.action, repr.process_point)
    }
}

/// Identifier naming a class of event a publisher raises and subscribers listen for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "source", rename_all = "snake_case")]
pub enum MessageSource {
    WellKnown(WellKnownSource),
    CrossCut(CrossCutSource),
}

impl MessageSource {
    /// Well-known source from a static identifier.
    pub const fn well_known(id: &'static str) -> Self {
        MessageSource::WellKnown(WellKnownSource::from_static(id))
    }

    /// Cross-cut source; fails if subject or action is empty.
    pub fn cross_cut(
        subject: impl Into<String>,
        action: impl Into<String>,
        process_point: ProcessPoint,
    ) -> MessagingResult<Self> {
        CrossCutSource::new(subject, action, process_point).map(MessageSource::CrossCut)
    }

}

impl From<WellKnownSource> for MessageSource {
    fn from(value: WellKnownSource) -> Self {
        MessageSource::WellKnown(value)
    }
}

impl From<CrossCutSource> for MessageSource {
    fn from(value: CrossCutSource) -> Self {
        MessageSource::CrossCut(value)
    }
}

impl core::fmt::Display for MessageSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MessageSource::WellKnown(s) => write!(f, "well-known:{}", s.id()),
            MessageSource::CrossCut(s) => {
                write!(f, "cross-cut:{}.{}@{}", s.subject, s.action, s.process_point)
            }
        }
    }
}

impl ValueObject for WellKnownSource {}
impl ValueObject for CrossCutSource {}
impl ValueObject for MessageSource {}
