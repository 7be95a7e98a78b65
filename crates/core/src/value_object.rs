//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two message
/// sources built from the same fields are the same source, wherever they were
/// constructed. This is what lets them serve as registry keys.
///
/// ```ignore
/// let a = CrossCutSource::new("SiconSalesOrder", "Created", ProcessPoint::PostMethod)?;
/// let b = CrossCutSource::new("SiconSalesOrder", "Created", ProcessPoint::PostMethod)?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
