//! Domain types for the lesson shop.
//!
//! Value objects (`LessonId`, `Money`), the catalog item (`Lesson`), the cart
//! snapshot (`CartEntry`), sort criteria and the order payload.

use crate::error::ParseSortError;
use crate::validation::CustomerDetails;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque lesson identifier
///
/// Backends hand out either numeric ids or document ids. Both are kept as
/// text so they compare, hash and render uniformly.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LessonId(String);

impl LessonId {
    /// Create an id from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LessonId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for LessonId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

// ============================================================================
// Money
// ============================================================================

/// Non-negative amount of money in pence
///
/// On the wire prices are decimal pounds (`75`, `92.5`). Internally they are
/// whole pence so cart totals are exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero pounds
    pub const ZERO: Self = Self(0);

    /// Create from pence
    #[must_use]
    pub const fn from_pence(pence: u64) -> Self {
        Self(pence)
    }

    /// Create from whole pounds
    #[must_use]
    pub const fn from_pounds(pounds: u64) -> Self {
        Self(pounds * 100)
    }

    /// Amount in pence
    #[must_use]
    pub const fn pence(self) -> u64 {
        self.0
    }

    /// Amount in pounds as a wire number
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // prices are far below 2^52 pence
    pub fn as_pounds(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Convert a wire number of pounds, rounding to the nearest penny
    ///
    /// Returns `None` for negative, NaN or infinite input.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
    pub fn try_from_pounds(pounds: f64) -> Option<Self> {
        if !pounds.is_finite() || pounds < 0.0 {
            return None;
        }
        Some(Self((pounds * 100.0).round() as u64))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "£{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_u64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_pounds())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pounds = f64::deserialize(deserializer)?;
        Self::try_from_pounds(pounds).ok_or_else(|| {
            serde::de::Error::custom(format!("price must be a non-negative number, got {pounds}"))
        })
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A purchasable lesson slot
///
/// Only `spaces` changes after load, and only through the capacity ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson identifier
    #[serde(alias = "_id")]
    pub id: LessonId,
    /// Subject taught (e.g. "Math")
    pub subject: String,
    /// Where the lesson takes place
    pub location: String,
    /// Price per seat
    pub price: Money,
    /// Remaining seats
    pub spaces: u32,
}

impl Lesson {
    /// Creates a lesson
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        location: impl Into<String>,
        price: Money,
        spaces: u32,
    ) -> Self {
        Self {
            id: LessonId::new(id),
            subject: subject.into(),
            location: location.into(),
            price,
            spaces,
        }
    }
}

/// A lesson as it was when the customer selected it
///
/// Copied, never linked: refreshing the catalog does not touch cart entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Lesson identifier
    pub id: LessonId,
    /// Subject at selection time
    pub subject: String,
    /// Location at selection time
    pub location: String,
    /// Price at selection time
    pub price: Money,
    /// Remaining seats at selection time
    pub spaces: u32,
}

impl From<&Lesson> for CartEntry {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id.clone(),
            subject: lesson.subject.clone(),
            location: lesson.location.clone(),
            price: lesson.price,
            spaces: lesson.spaces,
        }
    }
}

// ============================================================================
// Sorting
// ============================================================================

/// Field the catalog view is sorted by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Alphabetical by subject
    #[default]
    Subject,
    /// Numeric by price
    Price,
    /// Numeric by remaining spaces
    Spaces,
    /// Alphabetical by location
    Location,
}

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// How the catalog view is ordered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortCriterion {
    /// Field to compare
    pub field: SortField,
    /// Direction
    pub order: SortOrder,
}

impl SortCriterion {
    /// Creates a criterion
    #[must_use]
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Ascending on `field`
    #[must_use]
    pub const fn ascending(field: SortField) -> Self {
        Self::new(field, SortOrder::Ascending)
    }

    /// Descending on `field`
    #[must_use]
    pub const fn descending(field: SortField) -> Self {
        Self::new(field, SortOrder::Descending)
    }
}

impl FromStr for SortField {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subject" => Ok(Self::Subject),
            "price" => Ok(Self::Price),
            "spaces" => Ok(Self::Spaces),
            "location" => Ok(Self::Location),
            other => Err(ParseSortError::UnknownField(other.to_string())),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(ParseSortError::UnknownOrder(other.to_string())),
        }
    }
}

/// Parses `"price"` or `"price:desc"`
impl FromStr for SortCriterion {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((field, order)) => Ok(Self::new(field.parse()?, order.parse()?)),
            None => Ok(Self::ascending(s.parse()?)),
        }
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Order payload sent to the remote store
///
/// Only buildable from [`CustomerDetails`], which exist only once both
/// customer fields have passed validation. Serializes to the backend's
/// `{ name, phone, lessons, total }` shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    #[serde(rename = "name")]
    customer_name: String,
    #[serde(rename = "phone")]
    customer_phone: String,
    #[serde(rename = "lessons")]
    items: Vec<CartEntry>,
    total: Money,
}

impl OrderRequest {
    /// Builds the order, snapshotting the total from `items`
    #[must_use]
    pub fn new(customer: CustomerDetails, items: Vec<CartEntry>) -> Self {
        let total = items.iter().map(|entry| entry.price).sum();
        let (customer_name, customer_phone) = customer.into_parts();
        Self {
            customer_name,
            customer_phone,
            items,
            total,
        }
    }

    /// Customer's name
    #[must_use]
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Customer's phone number
    #[must_use]
    pub fn customer_phone(&self) -> &str {
        &self.customer_phone
    }

    /// Ordered lessons, in cart order
    #[must_use]
    pub fn items(&self) -> &[CartEntry] {
        &self.items
    }

    /// Total at the moment the order was built
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lesson_accepts_numeric_and_document_ids() {
        let numeric: Lesson = serde_json::from_value(json!({
            "id": 7, "subject": "Math", "location": "Oxford", "price": 100, "spaces": 5
        }))
        .unwrap();
        assert_eq!(numeric.id, LessonId::new("7"));

        let document: Lesson = serde_json::from_value(json!({
            "_id": "65a1f0", "subject": "Art", "location": "Bristol", "price": 80, "spaces": 5,
            "image": "art.png"
        }))
        .unwrap();
        assert_eq!(document.id, LessonId::new("65a1f0"));
        assert_eq!(document.price, Money::from_pounds(80));
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let result = serde_json::from_value::<Lesson>(json!({
            "id": 1, "subject": "Art", "location": "York", "price": -5, "spaces": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_money_rounds_and_displays() {
        assert_eq!(Money::try_from_pounds(92.5), Some(Money::from_pence(9250)));
        assert_eq!(Money::try_from_pounds(0.105), Some(Money::from_pence(11)));
        assert_eq!(Money::try_from_pounds(f64::NAN), None);
        assert_eq!(Money::from_pence(9250).to_string(), "£92.50");
        assert_eq!(serde_json::to_value(Money::from_pounds(75)).unwrap(), json!(75));
        assert_eq!(serde_json::to_value(Money::from_pence(9250)).unwrap(), json!(92.5));
    }

    #[test]
    fn test_sort_criterion_parsing() {
        assert_eq!(
            "price:desc".parse::<SortCriterion>().unwrap(),
            SortCriterion::descending(SortField::Price)
        );
        assert_eq!(
            "Location".parse::<SortCriterion>().unwrap(),
            SortCriterion::ascending(SortField::Location)
        );
        assert!("colour".parse::<SortCriterion>().is_err());
        assert!("price:sideways".parse::<SortCriterion>().is_err());
    }

    #[test]
    fn test_order_request_wire_shape() {
        let customer = CustomerDetails::new("Ada Lovelace", "07123456789").unwrap();
        let lesson = Lesson::new("3", "English", "London", Money::from_pounds(90), 5);
        let order = OrderRequest::new(customer, vec![CartEntry::from(&lesson)]);

        assert_eq!(order.total(), Money::from_pounds(90));
        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({
                "name": "Ada Lovelace",
                "phone": "07123456789",
                "lessons": [{
                    "id": "3", "subject": "English", "location": "London",
                    "price": 90, "spaces": 5
                }],
                "total": 90
            })
        );
    }
}
