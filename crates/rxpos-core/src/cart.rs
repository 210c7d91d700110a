//! # Cart Engine
//!
//! The in-memory state machine for one active sale.
//!
//! ## Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────┐  begin_submission  ┌────────────┐  complete  ┌────────┐ │
//! │   │ Building │ ─────────────────► │ Submitting │ ─────────► │ Frozen │ │
//! │   └──────────┘                    └────────────┘            └────────┘ │
//! │     ▲    ▲          abort_submission    │                       │      │
//! │     │    └──────────────────────────────┘                       │      │
//! │     │                                                            │      │
//! │     └──────────────────── acknowledge_printed ◄─────────────────┘      │
//! │                                                                         │
//! │  Building   : every mutation allowed                                   │
//! │  Submitting : every mutation rejected (CartLocked)                     │
//! │  Frozen     : every mutation rejected until acknowledge_printed        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Invariants
//! - One line per stock batch; re-adding a batch increments its quantity.
//! - `0 < quantity <= quantity_available` for every line. Setting a quantity
//!   of zero or less removes the line.
//! - `discount` stays within `[0, 100] %`.
//! - Price, MRP, GST and availability are captured at add time and never
//!   refreshed.
//!
//! ## Totals
//! ```text
//! base       = unit_price × quantity
//! line_total = base − base × discount
//! total      = Σ line_total        final = total
//! ```
//! GST is computed per line for display only and is not part of `total` or
//! `final`; the backend owns tax on the submitted amounts.
//!
//! A rejected operation never changes the cart.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::permission::{authorize, Action, Grants};
use crate::pricing::{resolve_stock, ResolvedStock};
use crate::submission::CompletedSale;
use crate::types::{Branch, Customer, EntityId, FaceMatch, PaymentMethod, Percentage, StockRow};

// =============================================================================
// Cart Phase
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CartPhase {
    /// Accepting lines and edits.
    #[default]
    Building,
    /// A sale order is in flight to the backend.
    Submitting,
    /// The sale was created; read-only until the invoice is acknowledged.
    Frozen,
}

impl fmt::Display for CartPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartPhase::Building => write!(f, "building"),
            CartPhase::Submitting => write!(f, "submitting"),
            CartPhase::Frozen => write!(f, "frozen"),
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One stock batch in the active sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[ts(type = "number | string")]
    pub stock_id: EntityId,

    #[ts(type = "number | string | null")]
    pub product_id: Option<EntityId>,

    pub product_name: String,
    pub batch_number: String,
    pub expiry_date: Option<String>,

    pub mrp: Money,
    pub unit_price: Money,
    pub gst: Percentage,

    /// Editable, `[0, 100] %`.
    pub discount: Percentage,

    /// Always within `1..=quantity_available`.
    pub quantity: i64,

    /// Ceiling captured when the batch was first added.
    pub quantity_available: i64,
}

impl CartLine {
    fn from_resolved(stock: ResolvedStock) -> Self {
        CartLine {
            stock_id: stock.stock_id,
            product_id: stock.product_id,
            product_name: stock.product_name,
            batch_number: stock.batch_number,
            expiry_date: stock.expiry_date,
            mrp: stock.mrp,
            unit_price: stock.unit_price,
            gst: stock.gst,
            discount: Percentage::zero(),
            quantity: 1,
            quantity_available: stock.quantity_available,
        }
    }

    /// `unit_price × quantity`.
    pub fn base_amount(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    pub fn discount_amount(&self) -> Money {
        self.base_amount().portion(self.discount)
    }

    /// Base amount after discount. This is what the sale total sums.
    pub fn line_total(&self) -> Money {
        self.base_amount().apply_discount(self.discount)
    }

    /// GST charged at the line rate on top of the discounted line.
    ///
    /// Display only: it is not part of `line_total` or any submitted amount.
    pub fn gst_amount(&self) -> Money {
        self.line_total().portion(self.gst)
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Aggregate amounts, recomputed from the lines on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    /// Σ base amount, before discount.
    pub gross_amount: Money,
    pub discount_amount: Money,
    /// Display only; not included in `total_amount`.
    pub gst_amount: Money,
    pub total_amount: Money,
    pub final_amount: Money,
}

impl CartTotals {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let total_amount: Money = lines.iter().map(CartLine::line_total).sum();
        CartTotals {
            line_count: lines.len(),
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            gross_amount: lines.iter().map(CartLine::base_amount).sum(),
            discount_amount: lines.iter().map(CartLine::discount_amount).sum(),
            gst_amount: lines.iter().map(CartLine::gst_amount).sum(),
            total_amount,
            final_amount: total_amount,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The active sale.
///
/// `Cart::default()` is the freshly opened cart; acknowledging a printed
/// invoice returns the cart to exactly that value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    pub(crate) lines: Vec<CartLine>,
    pub(crate) customer: Option<Customer>,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) recognition_log_id: Option<String>,
    pub(crate) phase: CartPhase,
    /// Branch the in-flight order was validated against.
    pub(crate) pending_branch: Option<Branch>,
    pub(crate) completed: Option<CompletedSale>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    pub fn phase(&self) -> CartPhase {
        self.phase
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, stock_id: &EntityId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.stock_id == stock_id)
    }

    /// `None` means walk-in.
    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn recognition_log_id(&self) -> Option<&str> {
        self.recognition_log_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn completed_sale(&self) -> Option<&CompletedSale> {
        self.completed.as_ref()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from_lines(&self.lines)
    }

    pub(crate) fn ensure_building(&self) -> CoreResult<()> {
        match self.phase {
            CartPhase::Building => Ok(()),
            phase => Err(CoreError::CartLocked { phase }),
        }
    }

    fn position(&self, stock_id: &EntityId) -> Option<usize> {
        self.lines.iter().position(|l| &l.stock_id == stock_id)
    }

    fn position_or_missing(&self, stock_id: &EntityId) -> CoreResult<usize> {
        self.position(stock_id)
            .ok_or_else(|| CoreError::LineNotFound(stock_id.to_string()))
    }

    // -------------------------------------------------------------------------
    // Line mutations
    // -------------------------------------------------------------------------

    /// Adds a catalog row as a new line, or increments the existing line for
    /// the same batch by one.
    ///
    /// ## Flow
    /// ```text
    /// row ──► resolve_stock (price chain, GST default, ceiling)
    ///          │
    ///          ├── batch already in cart?
    ///          │     qty + 1 > ceiling ──► InsufficientStock (cart unchanged)
    ///          │     else               ──► qty += 1
    ///          │
    ///          └── new batch
    ///                ceiling < 1        ──► InsufficientStock
    ///                else               ──► push line (qty 1, discount 0)
    /// ```
    ///
    /// The ceiling of an existing line is the one captured at first add; a
    /// newer catalog row for the same batch does not change it.
    pub fn add_or_increment(&mut self, row: &StockRow, default_gst: Percentage) -> CoreResult<&CartLine> {
        self.ensure_building()?;
        let stock = resolve_stock(row, default_gst)?;

        if let Some(idx) = self.position(&stock.stock_id) {
            let line = &mut self.lines[idx];
            let requested = line.quantity + 1;
            if requested > line.quantity_available {
                return Err(CoreError::InsufficientStock {
                    batch: line.batch_number.clone(),
                    available: line.quantity_available,
                    requested,
                });
            }
            line.quantity = requested;
            return Ok(&self.lines[idx]);
        }

        if stock.quantity_available < 1 {
            return Err(CoreError::InsufficientStock {
                batch: stock.batch_number,
                available: stock.quantity_available,
                requested: 1,
            });
        }

        self.lines.push(CartLine::from_resolved(stock));
        let idx = self.lines.len() - 1;
        Ok(&self.lines[idx])
    }

    /// Replaces a line's quantity. Zero or less removes the line.
    pub fn set_quantity(&mut self, stock_id: &EntityId, quantity: i64) -> CoreResult<()> {
        self.ensure_building()?;
        let idx = self.position_or_missing(stock_id)?;

        if quantity <= 0 {
            self.lines.remove(idx);
            return Ok(());
        }

        let line = &mut self.lines[idx];
        if quantity > line.quantity_available {
            return Err(CoreError::InsufficientStock {
                batch: line.batch_number.clone(),
                available: line.quantity_available,
                requested: quantity,
            });
        }
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove_line(&mut self, stock_id: &EntityId) -> CoreResult<()> {
        self.set_quantity(stock_id, 0)
    }

    /// Sets a line's discount percent.
    ///
    /// The caller's grants are checked here, before anything else about the
    /// line. `raw_percent` is clamped to `[0, 100]`; non-finite input becomes 0.
    /// The stored value keeps two decimals (basis points), so `33.333` is kept
    /// as `33.33`. Returns the discount actually stored.
    pub fn set_discount(
        &mut self,
        stock_id: &EntityId,
        raw_percent: f64,
        grants: &Grants,
    ) -> CoreResult<Percentage> {
        self.ensure_building()?;
        authorize(grants, Action::EditLineDiscount)?;
        let idx = self.position_or_missing(stock_id)?;

        let discount = Percentage::clamped(raw_percent);
        self.lines[idx].discount = discount;
        Ok(discount)
    }

    // -------------------------------------------------------------------------
    // Sale attributes
    // -------------------------------------------------------------------------

    /// Manual customer selection (`None` for walk-in).
    ///
    /// Clears the recognition reference: the association no longer comes from
    /// a face match.
    pub fn select_customer(&mut self, customer: Option<Customer>) -> CoreResult<()> {
        self.ensure_building()?;
        self.customer = customer;
        self.recognition_log_id = None;
        Ok(())
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> CoreResult<()> {
        self.ensure_building()?;
        self.payment_method = method;
        Ok(())
    }

    /// Applies a face identification outcome.
    ///
    /// A match sets the customer and the recognition reference. No match
    /// leaves the customer alone and clears the reference. Lines are never
    /// touched.
    pub fn apply_face_match(&mut self, outcome: FaceMatch) -> CoreResult<()> {
        self.ensure_building()?;
        match outcome {
            FaceMatch::Matched {
                customer,
                recognition_log_id,
            } => {
                self.customer = Some(customer);
                self.recognition_log_id = recognition_log_id;
            }
            FaceMatch::NoMatch => {
                self.recognition_log_id = None;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::DEFAULT_GST;

    fn batch(id: i64, price: f64, available: f64) -> StockRow {
        StockRow {
            stock_id: Some(EntityId::Int(id)),
            product_id: Some(EntityId::Int(id * 100)),
            product_name: Some(format!("Product {}", id)),
            batch_number: Some(format!("B-{}", id)),
            selling_price: Some(price),
            gst_percentage: Some(12.0),
            quantity_available: Some(available),
            ..StockRow::default()
        }
    }

    fn manager() -> Grants {
        Grants::none().with_role("manager")
    }

    fn customer(id: i64) -> Customer {
        Customer {
            id: EntityId::Int(id),
            first_name: Some("Ravi".into()),
            last_name: Some("Kumar".into()),
            phone: None,
        }
    }

    #[test]
    fn test_add_same_batch_increments() {
        let mut cart = Cart::new();
        let a = batch(1, 100.0, 5.0);

        cart.add_or_increment(&a, DEFAULT_GST).unwrap();
        let line = cart.add_or_increment(&a, DEFAULT_GST).unwrap();

        assert_eq!(line.quantity, 2);
        assert_eq!(line.line_total(), Money::from_minor(20000));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_increment_never_exceeds_first_ceiling() {
        let mut cart = Cart::new();
        let a = batch(1, 10.0, 2.0);
        cart.add_or_increment(&a, DEFAULT_GST).unwrap();
        cart.add_or_increment(&a, DEFAULT_GST).unwrap();

        // A fresher row claiming more stock does not raise the ceiling.
        let restocked = batch(1, 10.0, 50.0);
        for _ in 0..5 {
            let err = cart.add_or_increment(&restocked, DEFAULT_GST).unwrap_err();
            assert!(matches!(err, CoreError::InsufficientStock { available: 2, requested: 3, .. }));
        }
        assert_eq!(cart.line(&EntityId::Int(1)).unwrap().quantity, 2);
    }

    #[test]
    fn test_out_of_stock_batch_cannot_be_added() {
        let mut cart = Cart::new();
        let err = cart.add_or_increment(&batch(1, 10.0, 0.0), DEFAULT_GST).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { available: 0, .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_row_without_identity_is_rejected() {
        let mut cart = Cart::new();
        let row = StockRow {
            selling_price: Some(10.0),
            quantity_available: Some(3.0),
            ..StockRow::default()
        };
        assert!(matches!(
            cart.add_or_increment(&row, DEFAULT_GST),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_or_increment(&batch(1, 10.0, 5.0), DEFAULT_GST).unwrap();
        cart.add_or_increment(&batch(2, 10.0, 5.0), DEFAULT_GST).unwrap();

        cart.set_quantity(&EntityId::Int(1), 0).unwrap();
        cart.set_quantity(&EntityId::Int(2), -4).unwrap();

        assert!(cart.is_empty());
        assert!(cart.lines().iter().all(|l| l.quantity > 0));
    }

    #[test]
    fn test_set_quantity_above_ceiling_is_rejected() {
        let mut cart = Cart::new();
        cart.add_or_increment(&batch(1, 10.0, 5.0), DEFAULT_GST).unwrap();
        cart.set_quantity(&EntityId::Int(1), 3).unwrap();

        let before = cart.clone();
        assert!(cart.set_quantity(&EntityId::Int(1), 6).is_err());
        assert_eq!(cart, before);
    }

    #[test]
    fn test_unknown_line_is_reported() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.set_quantity(&EntityId::Int(9), 1),
            Err(CoreError::LineNotFound("9".to_string()))
        );
        assert_eq!(
            cart.remove_line(&EntityId::Text("9".into())),
            Err(CoreError::LineNotFound("9".to_string()))
        );
    }

    #[test]
    fn test_discount_requires_permission() {
        let mut cart = Cart::new();
        cart.add_or_increment(&batch(1, 100.0, 5.0), DEFAULT_GST).unwrap();

        for raw in [10.0, 0.0, 100.0, 250.0, f64::NAN] {
            let err = cart.set_discount(&EntityId::Int(1), raw, &Grants::none()).unwrap_err();
            assert!(matches!(err, CoreError::NotAuthorized { .. }));
        }
        assert_eq!(cart.lines()[0].discount, Percentage::zero());
    }

    #[test]
    fn test_discount_is_clamped() {
        let mut cart = Cart::new();
        cart.add_or_increment(&batch(1, 100.0, 5.0), DEFAULT_GST).unwrap();
        let id = EntityId::Int(1);

        assert_eq!(cart.set_discount(&id, 150.0, &manager()).unwrap().bps(), 10_000);
        assert_eq!(cart.set_discount(&id, -5.0, &manager()).unwrap().bps(), 0);
        assert_eq!(cart.set_discount(&id, f64::NAN, &manager()).unwrap().bps(), 0);
        assert_eq!(cart.set_discount(&id, f64::INFINITY, &manager()).unwrap().bps(), 0);
        assert_eq!(cart.set_discount(&id, 7.5, &manager()).unwrap().bps(), 750);
    }

    #[test]
    fn test_discount_keeps_two_decimals() {
        let mut cart = Cart::new();
        cart.add_or_increment(&batch(1, 300.0, 5.0), DEFAULT_GST).unwrap();
        let id = EntityId::Int(1);

        let stored = cart.set_discount(&id, 33.333, &manager()).unwrap();
        assert_eq!(stored.bps(), 3333);
        assert_eq!(cart.lines()[0].discount, stored);
        // 300.00 less 33.33 %
        assert_eq!(cart.lines()[0].line_total(), Money::from_minor(20001));
    }

    #[test]
    fn test_oversized_catalog_row_is_rejected() {
        let mut cart = Cart::new();
        let err = cart
            .add_or_increment(&batch(1, 1e12, 1e7), DEFAULT_GST)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert!(cart.is_empty());
        assert_eq!(cart.totals(), CartTotals::default());
    }

    #[test]
    fn test_totals_sum_discounted_lines_and_exclude_gst() {
        let mut cart = Cart::new();
        cart.add_or_increment(&batch(1, 100.0, 5.0), DEFAULT_GST).unwrap();
        cart.add_or_increment(&batch(1, 100.0, 5.0), DEFAULT_GST).unwrap();
        cart.add_or_increment(&batch(2, 19.99, 5.0), DEFAULT_GST).unwrap();
        cart.set_discount(&EntityId::Int(1), 10.0, &manager()).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.gross_amount, Money::from_minor(21999));
        assert_eq!(totals.discount_amount, Money::from_minor(2000));
        assert_eq!(totals.total_amount, Money::from_minor(19999));
        assert_eq!(totals.final_amount, totals.total_amount);
        // 12 % of 180.00 + 12 % of 19.99 (2.3988 → 2.40)
        assert_eq!(totals.gst_amount, Money::from_minor(2160 + 240));

        assert_eq!(cart.totals(), totals);
    }

    #[test]
    fn test_manual_customer_selection_clears_recognition() {
        let mut cart = Cart::new();
        cart.apply_face_match(FaceMatch::Matched {
            customer: customer(1),
            recognition_log_id: Some("rec-1".into()),
        })
        .unwrap();
        assert_eq!(cart.recognition_log_id(), Some("rec-1"));

        cart.select_customer(Some(customer(2))).unwrap();
        assert_eq!(cart.customer().map(|c| c.id.clone()), Some(EntityId::Int(2)));
        assert_eq!(cart.recognition_log_id(), None);

        cart.select_customer(None).unwrap();
        assert!(cart.customer().is_none());
    }

    #[test]
    fn test_face_no_match_keeps_customer_and_lines() {
        let mut cart = Cart::new();
        cart.add_or_increment(&batch(1, 10.0, 5.0), DEFAULT_GST).unwrap();
        let lines_before = cart.lines().to_vec();

        cart.apply_face_match(FaceMatch::NoMatch).unwrap();
        assert!(cart.customer().is_none());

        cart.select_customer(Some(customer(3))).unwrap();
        cart.apply_face_match(FaceMatch::NoMatch).unwrap();
        assert_eq!(cart.customer().map(|c| c.id.clone()), Some(EntityId::Int(3)));
        assert_eq!(cart.lines(), lines_before.as_slice());
    }

    #[test]
    fn test_payment_method_change() {
        let mut cart = Cart::new();
        assert_eq!(cart.payment_method(), PaymentMethod::Cash);
        cart.set_payment_method(PaymentMethod::Upi).unwrap();
        assert_eq!(cart.payment_method(), PaymentMethod::Upi);
    }

    #[test]
    fn test_line_display_amounts() {
        let mut cart = Cart::new();
        cart.add_or_increment(&batch(1, 250.0, 5.0), DEFAULT_GST).unwrap();
        cart.set_quantity(&EntityId::Int(1), 2).unwrap();
        cart.set_discount(&EntityId::Int(1), 5.0, &manager()).unwrap();

        let line = &cart.lines()[0];
        assert_eq!(line.base_amount(), Money::from_minor(50000));
        assert_eq!(line.discount_amount(), Money::from_minor(2500));
        assert_eq!(line.line_total(), Money::from_minor(47500));
        assert_eq!(line.gst_amount(), Money::from_minor(5700));
    }
}
