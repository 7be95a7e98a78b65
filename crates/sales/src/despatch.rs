//! Typed payload for the "order created with despatch instructions" event.
//!
//! On the wire the event carries a [`PropertyBag`] so that subscribers written
//! against other integrations can read individual keys. Publishers and
//! subscribers in this crate go through [`DespatchInstructions`] instead of
//! touching keys by hand.

use ledgerbus_events::{ArgValue, PropertyBag};

use crate::error::{SalesError, SalesResult};
use crate::order::SalesOrder;

pub const KEY_SALES_ORDER: &str = "SalesOrder";
pub const KEY_COURIER_SERVICE: &str = "CourierService";
pub const KEY_COURIER_SERVICE_DESCRIPTION: &str = "CourierServiceDescription";
pub const KEY_PROJECT_NUMBER: &str = "ProjectNumber";
pub const KEY_PROJECT_HEADER_NUMBER: &str = "ProjectHeaderNumber";
pub const KEY_SIGNATURE_REQUIRED: &str = "SignatureRequired";

/// Courier and project details supplied when an order is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DespatchDetails {
    pub courier_service: String,
    pub courier_service_description: String,
    pub project_number: Option<String>,
    pub project_header_number: Option<String>,
    pub signature_required: bool,
}

impl DespatchDetails {
    pub fn courier(service: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            courier_service: service.into(),
            courier_service_description: description.into(),
            project_number: None,
            project_header_number: None,
            signature_required: false,
        }
    }

    pub fn with_project(mut self, number: impl Into<String>, header: impl Into<String>) -> Self {
        self.project_number = Some(number.into());
        self.project_header_number = Some(header.into());
        self
    }

    pub fn with_signature_required(mut self, required: bool) -> Self {
        self.signature_required = required;
        self
    }
}

/// An order together with its despatch details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DespatchInstructions {
    pub order: SalesOrder,
    pub details: DespatchDetails,
}

impl DespatchInstructions {
    pub fn new(order: SalesOrder, details: DespatchDetails) -> Self {
        Self { order, details }
    }

    pub fn into_bag(self) -> PropertyBag {
        let DespatchInstructions { order, details } = self;

        let mut bag = PropertyBag::new()
            .with(KEY_SALES_ORDER, ArgValue::object(order))
            .with(KEY_COURIER_SERVICE, details.courier_service)
            .with(KEY_COURIER_SERVICE_DESCRIPTION, details.courier_service_description)
            .with(KEY_SIGNATURE_REQUIRED, details.signature_required);

        if let Some(number) = details.project_number {
            bag.insert(KEY_PROJECT_NUMBER, number);
        }
        if let Some(header) = details.project_header_number {
            bag.insert(KEY_PROJECT_HEADER_NUMBER, header);
        }
        bag
    }

    /// Decode a bag; fails if the order or courier service is missing.
    pub fn from_bag(bag: &PropertyBag) -> SalesResult<Self> {
        let order = bag
            .object::<SalesOrder>(KEY_SALES_ORDER)
            .cloned()
            .ok_or_else(|| SalesError::validation(format!("missing '{KEY_SALES_ORDER}'")))?;
        let courier_service = bag
            .text(KEY_COURIER_SERVICE)
            .ok_or_else(|| SalesError::validation(format!("missing '{KEY_COURIER_SERVICE}'")))?
            .to_string();

        Ok(Self {
            order,
            details: DespatchDetails {
                courier_service,
                courier_service_description: bag
                    .text(KEY_COURIER_SERVICE_DESCRIPTION)
                    .unwrap_or_default()
                    .to_string(),
                project_number: bag.text(KEY_PROJECT_NUMBER).map(str::to_string),
                project_header_number: bag.text(KEY_PROJECT_HEADER_NUMBER).map(str::to_string),
                signature_required: bag.flag(KEY_SIGNATURE_REQUIRED).unwrap_or(false),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{CustomerAccount, DocumentNo};

    fn order() -> SalesOrder {
        SalesOrder::new(
            DocumentNo::from_sequence(7),
            CustomerAccount::new("ABB001").unwrap(),
        )
    }

    #[test]
    fn bag_carries_every_field() {
        let details = DespatchDetails::courier("DHL", "Special Delivery Instructions")
            .with_project("J00000001", "Revenue")
            .with_signature_required(true);
        let bag = DespatchInstructions::new(order(), details).into_bag();

        assert_eq!(bag.text(KEY_COURIER_SERVICE), Some("DHL"));
        assert_eq!(bag.text(KEY_PROJECT_NUMBER), Some("J00000001"));
        assert_eq!(bag.flag(KEY_SIGNATURE_REQUIRED), Some(true));
        assert_eq!(
            bag.object::<SalesOrder>(KEY_SALES_ORDER).unwrap().document_no().as_str(),
            "SO00007"
        );
    }

    #[test]
    fn optional_project_keys_are_omitted() {
        let bag =
            DespatchInstructions::new(order(), DespatchDetails::courier("UPS", "")).into_bag();
        assert!(!bag.contains_key(KEY_PROJECT_NUMBER));

        let decoded = DespatchInstructions::from_bag(&bag).unwrap();
        assert_eq!(decoded.details.project_number, None);
        assert!(!decoded.details.signature_required);
    }

    #[test]
    fn decoding_requires_order_and_courier() {
        let bag = PropertyBag::new().with(KEY_COURIER_SERVICE, "DHL");
        assert!(matches!(
            DespatchInstructions::from_bag(&bag),
            Err(SalesError::Validation(msg)) if msg.contains(KEY_SALES_ORDER)
        ));

        let bag = PropertyBag::new().with(KEY_SALES_ORDER, ArgValue::object(order()));
        assert!(matches!(
            DespatchInstructions::from_bag(&bag),
            Err(SalesError::Validation(msg)) if msg.contains(KEY_COURIER_SERVICE)
        ));
    }
}
