//! # Domain Types
//!
//! Core domain types shared by the cart engine and the backend adapters.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    StockRow     │   │    Customer     │   │     Branch      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  raw catalog    │   │  id             │   │  id             │       │
//! │  │  row, lenient   │   │  first/last     │   │  name           │       │
//! │  │  numerics       │   │  phone          │   │  tenant_id      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Percentage    │   │    EntityId     │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Int(i64)       │   │  Cash (default) │       │
//! │  │  1200 = 12%     │   │  Text(String)   │   │  Card, Upi      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │   FaceMatch     │  Matched { customer, recognition_log_id }         │
//! │  │                 │  NoMatch                                          │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lenient Wire Parsing
//! The backend is not consistent about numeric encodings: prices arrive as
//! JSON numbers or as decimal strings, ids as integers or strings. Catalog
//! fields are therefore parsed through [`lenient`], which maps anything it
//! cannot use to `None` instead of failing the whole search response.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Percentage
// =============================================================================

/// A percentage held in basis points (1 bp = 0.01 %).
///
/// Used for both GST (`1200` = 12 %) and line discounts (`1000` = 10 %).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// 100 % in basis points.
    pub const MAX_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Converts a percent value (`12.5`) to basis points, rounding to two
    /// decimals (`33.333` becomes `33.33`).
    ///
    /// Non-finite and negative values become zero.
    pub fn from_percent(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Percentage::zero();
        }
        Percentage((pct * 100.0).round() as u32)
    }

    /// Converts a raw percent value into `[0, 100]`.
    ///
    /// Non-finite input coerces to zero; anything outside the range is
    /// clamped to the nearest bound.
    ///
    /// ```rust
    /// use rxpos_core::types::Percentage;
    ///
    /// assert_eq!(Percentage::clamped(150.0).bps(), 10_000);
    /// assert_eq!(Percentage::clamped(-3.0).bps(), 0);
    /// assert_eq!(Percentage::clamped(f64::NAN).bps(), 0);
    /// assert_eq!(Percentage::clamped(12.5).bps(), 1_250);
    /// ```
    pub fn clamped(pct: f64) -> Self {
        if !pct.is_finite() {
            return Percentage::zero();
        }
        Percentage::from_percent(pct.clamp(0.0, 100.0))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a percent value, for display and the wire.
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Entity Identifier
// =============================================================================

/// An identifier issued by the backend.
///
/// The backend uses integer keys for most tables but some endpoints return
/// them as strings. The id is serialized back in the shape it arrived in;
/// equality and hashing compare the textual key, so `Int(7)` equals
/// `Text("7")`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Parses operator input: integers stay integers, everything else is text.
    ///
    /// ```rust
    /// use rxpos_core::types::EntityId;
    ///
    /// assert_eq!(EntityId::parse("42"), EntityId::Int(42));
    /// assert_eq!(EntityId::parse("B-7"), EntityId::Text("B-7".into()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) => EntityId::Int(n),
            Err(_) => EntityId::Text(raw.to_string()),
        }
    }

    /// Textual key used for comparisons.
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            EntityId::Int(n) => Cow::Owned(n.to_string()),
            EntityId::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_string())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash at the counter. The default for a fresh cart.
    #[default]
    Cash,
    /// Card on an external terminal.
    Card,
    /// UPI transfer.
    Upi,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Upi => write!(f, "upi"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "upi".into()],
            }),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record from the directory (or from a face match).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,

    #[serde(default, deserialize_with = "lenient::text")]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: Option<String>,
}

impl Customer {
    /// "First Last", falling back to the id when the record has no name.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            format!("Customer #{}", self.id)
        } else {
            parts.join(" ")
        }
    }
}

// =============================================================================
// Branch
// =============================================================================

/// The branch (store) a terminal sells from.
///
/// Passed explicitly into every lookup and into submission validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: EntityId,

    #[serde(default)]
    pub name: Option<String>,

    /// Organisation the branch belongs to; the face matcher is scoped by it.
    #[serde(default, alias = "org_id")]
    pub tenant_id: Option<EntityId>,
}

impl Branch {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Branch {
            id: id.into(),
            name: None,
            tenant_id: None,
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Branch #{}", self.id))
    }
}

// =============================================================================
// Face Match
// =============================================================================

/// Outcome of a face identification request.
///
/// A transport failure is reported to the cart as [`FaceMatch::NoMatch`],
/// so the cashier falls back to manual customer search.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceMatch {
    Matched {
        customer: Customer,
        /// Opaque audit reference linking the match to the eventual sale.
        recognition_log_id: Option<String>,
    },
    NoMatch,
}

impl FaceMatch {
    pub fn is_match(&self) -> bool {
        matches!(self, FaceMatch::Matched { .. })
    }
}

// =============================================================================
// Stock Row (catalog search result)
// =============================================================================

/// One sellable batch as returned by the stock search endpoint.
///
/// Every field is optional and parsed leniently; resolution into a cart line
/// (including the price fallback chain) lives in [`crate::pricing`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    #[serde(default, deserialize_with = "lenient::id")]
    pub stock_id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub product_id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub variant_id: Option<EntityId>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub batch_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub batch: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub expiry_date: Option<String>,

    #[serde(default, deserialize_with = "lenient::number")]
    pub mrp: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub selling_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub gst_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub tax_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity_available: Option<f64>,
}

// =============================================================================
// Lenient Deserializers
// =============================================================================

/// Field deserializers that never fail on a wrong JSON shape.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::EntityId;

    /// Number or numeric string; anything else (including NaN) is `None`.
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(parsed.filter(|n| n.is_finite()))
    }

    /// Integer or non-empty string id.
    pub fn id<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_i64().map(EntityId::Int),
            Value::String(s) if !s.trim().is_empty() => Some(EntityId::Text(s.trim().to_string())),
            _ => None,
        })
    }

    /// Non-empty string (numbers are stringified); empty and null are `None`.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_percentage_conversions() {
        let gst = Percentage::from_percent(12.0);
        assert_eq!(gst.bps(), 1200);
        assert!((gst.percent() - 12.0).abs() < f64::EPSILON);
        assert_eq!(gst.to_string(), "12.00");
        assert_eq!(Percentage::from_percent(-1.0), Percentage::zero());
    }

    #[test]
    fn test_entity_id_equality_ignores_shape() {
        assert_eq!(EntityId::Int(7), EntityId::Text("7".into()));
        assert_ne!(EntityId::Int(7), EntityId::Int(8));
    }

    #[test]
    fn test_entity_id_serializes_in_original_shape() {
        let ids: Vec<EntityId> = serde_json::from_value(json!([3, "S-9"])).unwrap();
        assert_eq!(serde_json::to_value(&ids).unwrap(), json!([3, "S-9"]));
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("CASH".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("debit".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("upi".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_stock_row_lenient_parsing() {
        let row: StockRow = serde_json::from_value(json!({
            "stock_id": 11,
            "product_id": "P-1",
            "product_name": "Paracetamol 500",
            "batch_number": "",
            "mrp": "120.50",
            "selling_price": 100,
            "gst_percentage": null,
            "tax_percentage": "n/a",
            "quantity_available": "5",
            "unexpected": {"nested": true}
        }))
        .unwrap();

        assert_eq!(row.stock_id, Some(EntityId::Int(11)));
        assert_eq!(row.product_id, Some(EntityId::Text("P-1".into())));
        assert_eq!(row.batch_number, None);
        assert_eq!(row.mrp, Some(120.5));
        assert_eq!(row.selling_price, Some(100.0));
        assert_eq!(row.gst_percentage, None);
        assert_eq!(row.tax_percentage, None);
        assert_eq!(row.quantity_available, Some(5.0));
    }

    #[test]
    fn test_customer_display_name() {
        let customer: Customer = serde_json::from_value(json!({
            "id": 4, "first_name": "Asha", "last_name": null, "phone": "98450"
        }))
        .unwrap();
        assert_eq!(customer.display_name(), "Asha");

        let anonymous: Customer = serde_json::from_value(json!({"id": 9})).unwrap();
        assert_eq!(anonymous.display_name(), "Customer #9");
    }

    #[test]
    fn test_branch_accepts_org_id_alias() {
        let branch: Branch = serde_json::from_value(json!({
            "id": 2, "name": "Indiranagar", "org_id": 1
        }))
        .unwrap();
        assert_eq!(branch.tenant_id, Some(EntityId::Int(1)));
        assert_eq!(branch.display_name(), "Indiranagar");
    }
}
