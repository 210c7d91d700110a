//! # Pricing Module
//!
//! Turns a raw catalog row into the price/availability snapshot a cart line
//! is created from.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field              Candidates (first usable wins)          Otherwise   │
//! │  ─────────────────  ──────────────────────────────────────  ─────────── │
//! │  stock identity     stock_id → id                           rejected    │
//! │  product identity   product_id → variant_id → id            none        │
//! │  name               product_name → name                     "—"         │
//! │  batch              batch_number → batch                    "NA"        │
//! │  unit price         selling_price → unit_price → price → mrp    0       │
//! │  mrp                mrp                                     unit price  │
//! │  gst                gst_percentage (≠ 0) → tax_percentage   12 %        │
//! │  available qty      quantity_available (truncated)          0           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A price candidate is usable when it is present, numeric, finite and not
//! exactly zero. Rows priced above [`MAX_UNIT_PRICE`] or stocked above
//! [`MAX_QUANTITY_AVAILABLE`] are rejected so line arithmetic stays in range. The snapshot is taken once, at add time; the cart never
//! re-reads the catalog for a line it already holds.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{EntityId, Percentage, StockRow};

/// Display name used when the catalog row carries none.
pub const UNKNOWN_PRODUCT_NAME: &str = "—";

/// Batch label used when the catalog row carries none.
pub const UNKNOWN_BATCH: &str = "NA";

/// Highest unit price (or MRP) a catalog row may carry: ₹1,00,00,000.
pub const MAX_UNIT_PRICE: Money = Money::from_minor(1_000_000_000);

/// Highest batch availability a catalog row may carry.
pub const MAX_QUANTITY_AVAILABLE: i64 = 1_000_000;

// =============================================================================
// Price Fallback Chain
// =============================================================================

/// A catalog field the unit price can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    SellingPrice,
    UnitPrice,
    Price,
    Mrp,
}

/// Unit price precedence, highest first.
pub const PRICE_PRECEDENCE: [PriceSource; 4] = [
    PriceSource::SellingPrice,
    PriceSource::UnitPrice,
    PriceSource::Price,
    PriceSource::Mrp,
];

impl PriceSource {
    fn read(&self, row: &StockRow) -> Option<f64> {
        match self {
            PriceSource::SellingPrice => row.selling_price,
            PriceSource::UnitPrice => row.unit_price,
            PriceSource::Price => row.price,
            PriceSource::Mrp => row.mrp,
        }
    }
}

/// Resolves the unit price of a catalog row.
///
/// Returns the price together with the field it came from, or
/// `(0, None)` when no candidate is usable.
///
/// ```rust
/// use rxpos_core::pricing::{resolve_unit_price, PriceSource};
/// use rxpos_core::types::StockRow;
///
/// let row = StockRow {
///     selling_price: Some(0.0),
///     price: Some(45.5),
///     mrp: Some(50.0),
///     ..StockRow::default()
/// };
/// let (price, source) = resolve_unit_price(&row);
/// assert_eq!(price.minor(), 4550);
/// assert_eq!(source, Some(PriceSource::Price));
/// ```
pub fn resolve_unit_price(row: &StockRow) -> (Money, Option<PriceSource>) {
    PRICE_PRECEDENCE
        .iter()
        .find_map(|source| {
            source
                .read(row)
                .filter(|v| v.is_finite() && *v != 0.0)
                .map(|v| (Money::from_major(v), Some(*source)))
        })
        .unwrap_or((Money::zero(), None))
}

/// Resolves the GST rate of a catalog row.
///
/// `gst_percentage` wins when it is numeric and non-zero; otherwise
/// `tax_percentage` is used when numeric (zero included); otherwise the
/// supplied default.
pub fn resolve_gst(row: &StockRow, default_gst: Percentage) -> Percentage {
    if let Some(gst) = row.gst_percentage.filter(|v| *v != 0.0) {
        return Percentage::clamped(gst);
    }
    match row.tax_percentage {
        Some(tax) => Percentage::clamped(tax),
        None => default_gst,
    }
}

// =============================================================================
// Resolved Stock Snapshot
// =============================================================================

/// Everything a cart line needs from a catalog row, with fallbacks applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStock {
    pub stock_id: EntityId,
    pub product_id: Option<EntityId>,
    pub product_name: String,
    pub batch_number: String,
    pub expiry_date: Option<String>,
    pub mrp: Money,
    pub unit_price: Money,
    pub gst: Percentage,
    pub quantity_available: i64,
}

/// Applies the fallback rules to a catalog row.
///
/// ## Errors
/// - `ValidationError::Required` when the row has neither `stock_id` nor `id`.
/// - `ValidationError::OutOfRange` when the price, MRP or availability is
///   beyond what a line can hold.
pub fn resolve_stock(row: &StockRow, default_gst: Percentage) -> Result<ResolvedStock, ValidationError> {
    let stock_id = row
        .stock_id
        .clone()
        .or_else(|| row.id.clone())
        .ok_or_else(|| ValidationError::Required {
            field: "stock id".to_string(),
        })?;

    let product_id = row
        .product_id
        .clone()
        .or_else(|| row.variant_id.clone())
        .or_else(|| row.id.clone());

    let (unit_price, _) = resolve_unit_price(row);
    let mrp = row.mrp.map(Money::from_major).unwrap_or(unit_price);

    let quantity_available = row
        .quantity_available
        .map(|q| q.trunc() as i64)
        .unwrap_or(0);

    let max_rupees = MAX_UNIT_PRICE.major_part();
    if unit_price > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: 0,
            max: max_rupees,
        });
    }
    if mrp > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "mrp".to_string(),
            min: 0,
            max: max_rupees,
        });
    }
    if quantity_available > MAX_QUANTITY_AVAILABLE {
        return Err(ValidationError::OutOfRange {
            field: "quantity available".to_string(),
            min: 0,
            max: MAX_QUANTITY_AVAILABLE,
        });
    }

    Ok(ResolvedStock {
        stock_id,
        product_id,
        product_name: row
            .product_name
            .clone()
            .or_else(|| row.name.clone())
            .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
        batch_number: row
            .batch_number
            .clone()
            .or_else(|| row.batch.clone())
            .unwrap_or_else(|| UNKNOWN_BATCH.to_string()),
        expiry_date: row.expiry_date.clone(),
        mrp,
        unit_price,
        gst: resolve_gst(row, default_gst),
        quantity_available,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_GST;

    fn row() -> StockRow {
        StockRow {
            stock_id: Some(EntityId::Int(10)),
            quantity_available: Some(5.0),
            ..StockRow::default()
        }
    }

    #[test]
    fn test_price_precedence_order() {
        let mut r = row();
        r.mrp = Some(130.0);
        assert_eq!(resolve_unit_price(&r), (Money::from_minor(13000), Some(PriceSource::Mrp)));

        r.price = Some(120.0);
        assert_eq!(resolve_unit_price(&r).1, Some(PriceSource::Price));

        r.unit_price = Some(110.0);
        assert_eq!(resolve_unit_price(&r).1, Some(PriceSource::UnitPrice));

        r.selling_price = Some(100.0);
        assert_eq!(resolve_unit_price(&r), (Money::from_minor(10000), Some(PriceSource::SellingPrice)));
    }

    #[test]
    fn test_zero_price_falls_through() {
        let mut r = row();
        r.selling_price = Some(0.0);
        r.unit_price = Some(75.25);
        assert_eq!(resolve_unit_price(&r), (Money::from_minor(7525), Some(PriceSource::UnitPrice)));
    }

    #[test]
    fn test_no_price_resolves_to_zero() {
        assert_eq!(resolve_unit_price(&row()), (Money::zero(), None));
    }

    #[test]
    fn test_mrp_falls_back_to_resolved_price() {
        let mut r = row();
        r.selling_price = Some(90.0);
        let resolved = resolve_stock(&r, DEFAULT_GST).unwrap();
        assert_eq!(resolved.mrp, Money::from_minor(9000));

        r.mrp = Some(99.0);
        let resolved = resolve_stock(&r, DEFAULT_GST).unwrap();
        assert_eq!(resolved.mrp, Money::from_minor(9900));
    }

    #[test]
    fn test_gst_resolution() {
        let mut r = row();
        assert_eq!(resolve_gst(&r, DEFAULT_GST), DEFAULT_GST);

        r.tax_percentage = Some(0.0);
        assert_eq!(resolve_gst(&r, DEFAULT_GST), Percentage::zero());

        r.tax_percentage = Some(5.0);
        r.gst_percentage = Some(0.0);
        assert_eq!(resolve_gst(&r, DEFAULT_GST), Percentage::from_bps(500));

        r.gst_percentage = Some(18.0);
        assert_eq!(resolve_gst(&r, DEFAULT_GST), Percentage::from_bps(1800));
    }

    #[test]
    fn test_identity_and_label_fallbacks() {
        let r = StockRow {
            id: Some(EntityId::Int(77)),
            name: Some("Cetirizine".into()),
            batch: Some("C-1".into()),
            quantity_available: Some(3.9),
            ..StockRow::default()
        };
        let resolved = resolve_stock(&r, DEFAULT_GST).unwrap();
        assert_eq!(resolved.stock_id, EntityId::Int(77));
        assert_eq!(resolved.product_id, Some(EntityId::Int(77)));
        assert_eq!(resolved.product_name, "Cetirizine");
        assert_eq!(resolved.batch_number, "C-1");
        assert_eq!(resolved.quantity_available, 3);

        let bare = StockRow {
            stock_id: Some(EntityId::Int(1)),
            variant_id: Some(EntityId::Int(2)),
            ..StockRow::default()
        };
        let resolved = resolve_stock(&bare, DEFAULT_GST).unwrap();
        assert_eq!(resolved.product_id, Some(EntityId::Int(2)));
        assert_eq!(resolved.product_name, UNKNOWN_PRODUCT_NAME);
        assert_eq!(resolved.batch_number, UNKNOWN_BATCH);
        assert_eq!(resolved.quantity_available, 0);
    }

    #[test]
    fn test_row_without_identity_is_rejected() {
        let r = StockRow {
            selling_price: Some(10.0),
            ..StockRow::default()
        };
        assert!(matches!(
            resolve_stock(&r, DEFAULT_GST),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_oversized_rows_are_rejected() {
        let mut r = row();
        r.selling_price = Some(1e12);
        assert_eq!(
            resolve_stock(&r, DEFAULT_GST),
            Err(ValidationError::OutOfRange {
                field: "unit price".into(),
                min: 0,
                max: 10_000_000,
            })
        );

        let mut r = row();
        r.selling_price = Some(10.0);
        r.quantity_available = Some(1e7);
        assert!(matches!(
            resolve_stock(&r, DEFAULT_GST),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "quantity available"
        ));

        let mut r = row();
        r.selling_price = Some(10.0);
        r.mrp = Some(2e7);
        assert!(matches!(
            resolve_stock(&r, DEFAULT_GST),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "mrp"
        ));

        let mut r = row();
        r.selling_price = Some(10_000_000.0);
        r.quantity_available = Some(1e6);
        let resolved = resolve_stock(&r, DEFAULT_GST).unwrap();
        assert_eq!(resolved.unit_price, MAX_UNIT_PRICE);
        assert_eq!(resolved.quantity_available, MAX_QUANTITY_AVAILABLE);
    }
}
