//! # Money Module
//!
//! Integer money for the cart engine.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The backend speaks decimal rupees (100.50), the engine speaks paise.   │
//! │                                                                         │
//! │  Catalog row ──► Money::from_major(100.5) ──► Money(10050)              │
//! │                                                                         │
//! │  All cart math (quantity, discount, GST display) runs on i64 paise.     │
//! │                                                                         │
//! │  Sale order ◄── major_units::serialize ◄── Money(18000) ──► 180.0       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conversion to and from floating point happens only at the wire boundary.
//! Arithmetic saturates at the `i64` bounds rather than wrapping.
//!
//! ## Usage
//! ```rust
//! use rxpos_core::money::Money;
//!
//! let price = Money::from_minor(10050); // 100.50
//! let line = price.multiply_quantity(2);
//! assert_eq!(line.minor(), 20100);
//! assert_eq!(line.to_string(), "201.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percentage;

/// Number of minor units (paise) per major unit (rupee).
pub const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (paise).
///
/// ## Where Money Flows
/// ```text
/// StockRow.selling_price ──► CartLine.unit_price ──► CartLine::line_total
///                                                         │
///                            CartTotals.total_amount ◄────┘
///                                     │
///                                     ▼
///                            SaleOrder.final_amount (decimal on the wire)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Converts a decimal major-unit amount (as delivered by the backend)
    /// into minor units, rounding half away from zero.
    ///
    /// Non-finite input is treated as zero.
    ///
    /// ```rust
    /// use rxpos_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(100.5).minor(), 10050);
    /// assert_eq!(Money::from_major(19.99).minor(), 1999);
    /// assert_eq!(Money::from_major(f64::NAN).minor(), 0);
    /// ```
    pub fn from_major(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * MINOR_PER_MAJOR as f64).round() as i64)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the value in major units, for wire serialization only.
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    /// Whole major units (truncated toward zero).
    #[inline]
    pub const fn major_part(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Minor remainder, always 0-99.
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies a unit price by a quantity, saturating at the `i64` bounds.
    ///
    /// ```rust
    /// use rxpos_core::money::Money;
    ///
    /// let unit = Money::from_minor(299);
    /// assert_eq!(unit.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `self × rate`, rounded half up on the minor unit.
    ///
    /// Used both for the discount amount and for the display-only GST amount.
    ///
    /// ```rust
    /// use rxpos_core::money::Money;
    /// use rxpos_core::types::Percentage;
    ///
    /// let base = Money::from_minor(1000);
    /// assert_eq!(base.portion(Percentage::from_bps(825)).minor(), 83);
    /// ```
    pub fn portion(&self, rate: Percentage) -> Money {
        // i128 keeps large carts from overflowing the intermediate product
        let minor = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(minor.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Applies a percentage discount and returns what remains.
    ///
    /// ```rust
    /// use rxpos_core::money::Money;
    /// use rxpos_core::types::Percentage;
    ///
    /// let base = Money::from_minor(20000);
    /// let after = base.apply_discount(Percentage::from_percent(10.0));
    /// assert_eq!(after.minor(), 18000);
    /// ```
    pub fn apply_discount(&self, discount: Percentage) -> Money {
        *self - self.portion(discount)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Two-decimal rendering without a currency symbol.
///
/// Receipts prepend the configured symbol; this is not a locale formatter.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major_part().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Wire Adapter
// =============================================================================

/// Serde adapter that writes [`Money`] as a decimal major-unit number.
///
/// ```rust
/// use rxpos_core::money::{major_units, Money};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Row {
///     #[serde(with = "major_units")]
///     amount: Money,
/// }
///
/// let json = serde_json::to_string(&Row { amount: Money::from_minor(18050) }).unwrap();
/// assert_eq!(json, r#"{"amount":180.5}"#);
/// ```
pub mod major_units {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Money;

    pub fn serialize<S>(value: &Money, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_major())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = f64::deserialize(deserializer)?;
        Ok(Money::from_major(amount))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_rounds_to_paise() {
        assert_eq!(Money::from_major(100.0).minor(), 10000);
        assert_eq!(Money::from_major(12.346).minor(), 1235);
        assert_eq!(Money::from_major(-5.5).minor(), -550);
        assert_eq!(Money::from_major(f64::INFINITY), Money::zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_minor(500).to_string(), "5.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);
        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);

        let total: Money = vec![a, b, Money::from_minor(1)].into_iter().sum();
        assert_eq!(total.minor(), 1501);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let price = Money::from_major(1e12);
        assert_eq!(price.multiply_quantity(1_000_000).minor(), i64::MAX);

        let big = Money::from_minor(i64::MAX - 10);
        assert_eq!((big + Money::from_minor(100)).minor(), i64::MAX);
        let total: Money = vec![big, big, big].into_iter().sum();
        assert_eq!(total.minor(), i64::MAX);

        let low = Money::from_minor(i64::MIN + 10);
        assert_eq!((low - Money::from_minor(100)).minor(), i64::MIN);

        assert_eq!(
            Money::from_minor(i64::MAX).portion(Percentage::from_bps(20_000)).minor(),
            i64::MAX
        );
    }

    #[test]
    fn test_discount_edges() {
        let base = Money::from_minor(12345);
        assert_eq!(base.apply_discount(Percentage::zero()), base);
        assert_eq!(base.apply_discount(Percentage::from_percent(100.0)), Money::zero());
    }

    #[test]
    fn test_major_units_round_trip_through_json() {
        #[derive(Serialize, Deserialize)]
        struct Row {
            #[serde(with = "major_units")]
            amount: Money,
        }

        let row: Row = serde_json::from_str(r#"{"amount": 99.99}"#).unwrap();
        assert_eq!(row.amount.minor(), 9999);
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"amount":99.99}"#);
    }
}
