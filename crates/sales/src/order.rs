use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SalesError, SalesResult};

/// Sales order document number, e.g. `SO00001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentNo(String);

impl DocumentNo {
    pub const PREFIX: &'static str = "SO";

    /// Document number for the n-th order (1-based), zero-padded to five digits.
    pub fn from_sequence(n: u64) -> Self {
        Self(format!("{}{:05}", Self::PREFIX, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for DocumentNo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer account reference (normalised to upper case).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerAccount(String);

impl CustomerAccount {
    pub fn new(reference: impl AsRef<str>) -> SalesResult<Self> {
        let reference = reference.as_ref().trim();
        if reference.is_empty() {
            return Err(SalesError::validation("customer account must not be empty"));
        }
        Ok(Self(reference.to_ascii_uppercase()))
    }

    /// Account for a literal reference known to be valid.
    pub fn from_static(reference: &'static str) -> Self {
        debug_assert!(!reference.trim().is_empty(), "empty customer account literal");
        Self(reference.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CustomerAccount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesOrderStatus {
    Draft,
    Saved,
    Posted,
}

/// A sales order as seen by the messaging layer.
///
/// Only what handlers and the demo workflow need: pricing, lines and stock
/// live in the accounting system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrder {
    document_no: DocumentNo,
    customer: CustomerAccount,
    status: SalesOrderStatus,
    posted_at: Option<DateTime<Utc>>,
}

impl SalesOrder {
    pub fn new(document_no: DocumentNo, customer: CustomerAccount) -> Self {
        Self {
            document_no,
            customer,
            status: SalesOrderStatus::Draft,
            posted_at: None,
        }
    }

    pub fn document_no(&self) -> &DocumentNo {
        &self.document_no
    }

    pub fn customer(&self) -> &CustomerAccount {
        &self.customer
    }

    pub fn status(&self) -> SalesOrderStatus {
        self.status
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }

    pub fn is_posted(&self) -> bool {
        matches!(self.status, SalesOrderStatus::Posted)
    }

    /// Draft/Saved → Saved. Posted orders are read-only.
    pub(crate) fn mark_saved(&mut self) -> SalesResult<()> {
        if self.is_posted() {
            return Err(SalesError::invalid_state(format!(
                "order {} is posted and cannot be saved again",
                self.document_no
            )));
        }
        self.status = SalesOrderStatus::Saved;
        Ok(())
    }

    /// Saved → Posted.
    pub(crate) fn mark_posted(&mut self, at: DateTime<Utc>) -> SalesResult<()> {
        match self.status {
            SalesOrderStatus::Saved => {
                self.status = SalesOrderStatus::Posted;
                self.posted_at = Some(at);
                Ok(())
            }
            SalesOrderStatus::Draft => Err(SalesError::invalid_state(format!(
                "order {} must be saved before posting",
                self.document_no
            ))),
            SalesOrderStatus::Posted => Err(SalesError::invalid_state(format!(
                "order {} is already posted",
                self.document_no
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn order() -> SalesOrder {
        SalesOrder::new(
            DocumentNo::from_sequence(1),
            CustomerAccount::new("abb001").unwrap(),
        )
    }

    #[test]
    fn document_numbers_are_zero_padded() {
        assert_eq!(DocumentNo::from_sequence(1).as_str(), "SO00001");
        assert_eq!(DocumentNo::from_sequence(42).as_str(), "SO00042");
    }

    #[test]
    fn customer_account_is_normalised() {
        assert_eq!(CustomerAccount::new(" abb001 ").unwrap().as_str(), "ABB001");
        assert!(matches!(
            CustomerAccount::new("   "),
            Err(SalesError::Validation(_))
        ));
    }

    #[test]
    fn save_then_post() {
        let mut o = order();
        o.mark_saved().unwrap();
        assert_eq!(o.status(), SalesOrderStatus::Saved);

        let at = Utc::now();
        o.mark_posted(at).unwrap();
        assert!(o.is_posted());
        assert_eq!(o.posted_at(), Some(at));
    }

    #[test]
    fn cannot_post_a_draft() {
        let mut o = order();
        assert!(matches!(o.mark_posted(Utc::now()), Err(SalesError::InvalidState(_))));
    }

    #[test]
    fn posted_orders_are_read_only() {
        let mut o = order();
        o.mark_saved().unwrap();
        o.mark_posted(Utc::now()).unwrap();

        assert!(matches!(o.mark_saved(), Err(SalesError::InvalidState(_))));
        assert!(matches!(o.mark_posted(Utc::now()), Err(SalesError::InvalidState(_))));
    }

    #[test]
    fn serializes_status_in_lowercase() {
        let json = serde_json::to_value(order()).unwrap();
        assert_eq!(json["status"], "draft");
        assert_eq!(json["document_no"], "SO00001");
    }

    proptest! {
        #[test]
        fn document_numbers_sort_in_sequence_order(a in 1u64..99_999, b in 1u64..99_999) {
            let (da, db) = (DocumentNo::from_sequence(a), DocumentNo::from_sequence(b));
            prop_assert_eq!(a.cmp(&b), da.cmp(&db));
        }
    }
}
