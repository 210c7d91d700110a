//! # Sale Submission
//!
//! The pure half of completing a sale: precondition checks, mapping the cart
//! to the backend's sale-creation record, and the phase transitions around
//! the network call.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Terminal                         Cart (this module)                    │
//! │  ────────                         ──────────────────                    │
//! │                                                                         │
//! │  submit ────────────────────────► begin_submission(branch)             │
//! │                                     ├── no branch        ─► Err        │
//! │                                     ├── empty cart       ─► Err        │
//! │                                     ├── final <= 0       ─► Err        │
//! │                                     └── Building → Submitting          │
//! │                                         returns SaleOrder              │
//! │  POST /sales (lock released) ◄────────────┘                            │
//! │       │                                                                 │
//! │       ├── ok  ──────────────────► complete_submission(receipt, at)     │
//! │       │                             Submitting → Frozen                │
//! │       │                                                                 │
//! │       └── err ──────────────────► abort_submission()                   │
//! │                                     Submitting → Building (unchanged)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here retries. A failed submission leaves the cart as it was so
//! the cashier can submit again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine, CartPhase, CartTotals};
use crate::error::{CoreError, CoreResult, SubmissionBlocker};
use crate::money::{major_units, Money};
use crate::types::{lenient, Branch, EntityId, PaymentMethod};

// =============================================================================
// Wire Records
// =============================================================================

/// One line of the sale-creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOrderLine {
    pub stock_id: EntityId,
    pub product_id: Option<EntityId>,
    pub quantity: i64,
    #[serde(with = "major_units")]
    pub selling_price: Money,
    #[serde(with = "major_units")]
    pub mrp: Money,
    pub discount_percentage: f64,
    pub tax_percentage: f64,
    pub batch_number: String,
    pub expiry_date: Option<String>,
}

impl From<&CartLine> for SaleOrderLine {
    fn from(line: &CartLine) -> Self {
        SaleOrderLine {
            stock_id: line.stock_id.clone(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            selling_price: line.unit_price,
            mrp: line.mrp,
            discount_percentage: line.discount.percent(),
            tax_percentage: line.gst.percent(),
            batch_number: line.batch_number.clone(),
            expiry_date: line.expiry_date.clone(),
        }
    }
}

/// The sale-creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOrder {
    pub branch_id: EntityId,
    pub customer_id: Option<EntityId>,
    pub items: Vec<SaleOrderLine>,
    pub payment_method: PaymentMethod,
    #[serde(with = "major_units")]
    pub total_amount: Money,
    #[serde(with = "major_units")]
    pub final_amount: Money,
    pub face_recognition_log_id: Option<String>,
}

impl SaleOrder {
    /// Projects a cart onto the wire record. Performs no validation.
    pub fn from_cart(cart: &Cart, branch: &Branch) -> Self {
        let totals = cart.totals();
        SaleOrder {
            branch_id: branch.id.clone(),
            customer_id: cart.customer().map(|c| c.id.clone()),
            items: cart.lines().iter().map(SaleOrderLine::from).collect(),
            payment_method: cart.payment_method(),
            total_amount: totals.total_amount,
            final_amount: totals.final_amount,
            face_recognition_log_id: cart.recognition_log_id().map(str::to_string),
        }
    }
}

/// What the backend returns for a created sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleReceipt {
    #[serde(default, deserialize_with = "lenient::text")]
    pub invoice_number: Option<String>,

    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<EntityId>,
}

/// A sale the backend accepted, as held by the frozen cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSale {
    pub invoice_number: Option<String>,
    pub sale_id: Option<EntityId>,
    pub submitted_at: DateTime<Utc>,
    pub branch: Branch,
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

// =============================================================================
// Validation
// =============================================================================

/// Checks the submission preconditions without changing anything.
pub fn check_submittable(cart: &Cart, branch: Option<&Branch>) -> Result<(), SubmissionBlocker> {
    if branch.is_none() {
        return Err(SubmissionBlocker::NoBranch);
    }
    if cart.is_empty() {
        return Err(SubmissionBlocker::EmptyCart);
    }
    if !cart.totals().final_amount.is_positive() {
        return Err(SubmissionBlocker::NonPositiveTotal);
    }
    Ok(())
}

// =============================================================================
// Phase Transitions
// =============================================================================

impl Cart {
    /// Validates the cart and moves it to `Submitting`.
    ///
    /// Returns the order to send. While `Submitting`, every mutation and any
    /// further `begin_submission` is rejected.
    pub fn begin_submission(&mut self, branch: Option<&Branch>) -> CoreResult<SaleOrder> {
        match self.phase {
            CartPhase::Building => {}
            CartPhase::Submitting => return Err(CoreError::SubmissionInProgress),
            CartPhase::Frozen => return Err(CoreError::CartLocked { phase: self.phase }),
        }

        check_submittable(self, branch).map_err(CoreError::InvalidSubmission)?;
        let branch = branch.ok_or(CoreError::InvalidSubmission(SubmissionBlocker::NoBranch))?;

        let order = SaleOrder::from_cart(self, branch);
        self.phase = CartPhase::Submitting;
        self.pending_branch = Some(branch.clone());
        Ok(order)
    }

    /// Records the backend's receipt and freezes the cart.
    pub fn complete_submission(
        &mut self,
        receipt: SaleReceipt,
        submitted_at: DateTime<Utc>,
    ) -> CoreResult<&CompletedSale> {
        if self.phase != CartPhase::Submitting {
            return Err(CoreError::NoSubmissionInProgress);
        }
        let branch = self
            .pending_branch
            .take()
            .ok_or(CoreError::NoSubmissionInProgress)?;

        let sale = CompletedSale {
            invoice_number: receipt.invoice_number,
            sale_id: receipt.id,
            submitted_at,
            branch,
            lines: self.lines.clone(),
            totals: self.totals(),
        };
        self.phase = CartPhase::Frozen;
        let sale = self.completed.insert(sale);
        Ok(&*sale)
    }

    /// Returns a `Submitting` cart to `Building` after a failed call.
    pub fn abort_submission(&mut self) -> CoreResult<()> {
        if self.phase != CartPhase::Submitting {
            return Err(CoreError::NoSubmissionInProgress);
        }
        self.phase = CartPhase::Building;
        self.pending_branch = None;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
