//! # Invoice Presentation & Reset
//!
//! Projects a frozen cart into a printable invoice and owns the only way out
//! of `Frozen`: acknowledging that the invoice was printed.
//!
//! ```text
//! Frozen cart ──► Invoice::from_cart ──► render_text(width, "₹") ──► printer
//!      │
//!      └──────── acknowledge_printed ──► Cart::default()  (Building)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::cart::{Cart, CartLine, CartPhase, CartTotals};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::submission::CompletedSale;
use crate::types::{EntityId, PaymentMethod, Percentage};

/// Customer label printed for a sale with no customer.
pub const WALK_IN: &str = "Walk-in";

/// Narrowest receipt that still fits an amount column.
pub const MIN_RECEIPT_WIDTH: usize = 24;

/// Receipt label for the summed line GST. The figure is tax at each line's
/// rate on the discounted amount and is not part of the total.
pub const GST_LABEL: &str = "GST (not in total)";

// =============================================================================
// Invoice
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRow {
    pub product_name: String,
    pub batch_number: String,
    /// `MM/YY` when the catalog date parses, the raw text otherwise.
    pub expiry: Option<String>,
    pub mrp: Money,
    pub unit_price: Money,
    pub discount: Percentage,
    pub gst: Percentage,
    pub quantity: i64,
    pub line_total: Money,
}

impl From<&CartLine> for InvoiceRow {
    fn from(line: &CartLine) -> Self {
        InvoiceRow {
            product_name: line.product_name.clone(),
            batch_number: line.batch_number.clone(),
            expiry: line.expiry_date.as_deref().map(format_expiry),
            mrp: line.mrp,
            unit_price: line.unit_price,
            discount: line.discount,
            gst: line.gst,
            quantity: line.quantity,
            line_total: line.line_total(),
        }
    }
}

/// A completed sale ready for printing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub invoice_number: Option<String>,
    pub sale_id: Option<EntityId>,
    pub submitted_at: DateTime<Utc>,
    pub branch_name: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub rows: Vec<InvoiceRow>,
    pub totals: CartTotals,
}

impl Invoice {
    /// Builds the invoice of a frozen cart.
    ///
    /// ## Errors
    /// `NothingToAcknowledge` unless the cart is `Frozen`.
    pub fn from_cart(cart: &Cart) -> CoreResult<Invoice> {
        let sale = match (cart.phase(), cart.completed_sale()) {
            (CartPhase::Frozen, Some(sale)) => sale,
            _ => return Err(CoreError::NothingToAcknowledge),
        };
        Ok(Invoice::from_sale(cart, sale))
    }

    fn from_sale(cart: &Cart, sale: &CompletedSale) -> Invoice {
        Invoice {
            invoice_number: sale.invoice_number.clone(),
            sale_id: sale.sale_id.clone(),
            submitted_at: sale.submitted_at,
            branch_name: sale.branch.display_name(),
            customer_name: cart
                .customer()
                .map(|c| c.display_name())
                .unwrap_or_else(|| WALK_IN.to_string()),
            customer_phone: cart.customer().and_then(|c| c.phone.clone()),
            payment_method: cart.payment_method(),
            rows: sale.lines.iter().map(InvoiceRow::from).collect(),
            totals: sale.totals,
        }
    }

    /// Invoice number for display, falling back to the sale id.
    pub fn reference(&self) -> String {
        match (&self.invoice_number, &self.sale_id) {
            (Some(number), _) => number.clone(),
            (None, Some(id)) => format!("#{}", id),
            (None, None) => "N/A".to_string(),
        }
    }

    /// Renders a fixed-width plain-text receipt.
    ///
    /// ## Layout
    /// ```text
    /// ┌──────────────────────────────────────────┐
    /// │               Indiranagar                │  branch, centred
    /// │ Invoice                         INV-0009 │
    /// │ Date                    16/10/2026 14:03 │
    /// │ Customer                      Ravi Kumar │
    /// │ Payment                             CASH │
    /// │ ---------------------------------------- │
    /// │ Amoxicillin 250                          │
    /// │  Batch AMX-01 Exp 03/27    MRP ₹100.00   │
    /// │  2 x ₹100.00 -10.00% GST 12.00%  ₹180.00 │
    /// │ ---------------------------------------- │
    /// │ Gross                            ₹200.00 │
    /// │ Discount                         -₹20.00 │
    /// │ Total                            ₹180.00 │
    /// │ GST (not in total)                ₹21.60 │
    /// └──────────────────────────────────────────┘
    /// ```
    /// Every line is at most `width` characters; widths below
    /// [`MIN_RECEIPT_WIDTH`] are raised to it.
    pub fn render_text(&self, width: usize, currency: &str) -> String {
        let width = width.max(MIN_RECEIPT_WIDTH);
        let amount = |m: Money| format!("{}{}", currency, m);
        let rule = "-".repeat(width);
        let mut out: Vec<String> = Vec::new();

        out.push(center(&self.branch_name, width));
        out.push(spread("Invoice", &self.reference(), width));
        out.push(spread(
            "Date",
            &self.submitted_at.format("%d/%m/%Y %H:%M").to_string(),
            width,
        ));
        out.push(spread("Customer", &self.customer_name, width));
        if let Some(phone) = &self.customer_phone {
            out.push(spread("Phone", phone, width));
        }
        out.push(spread(
            "Payment",
            &self.payment_method.to_string().to_uppercase(),
            width,
        ));
        out.push(rule.clone());

        for row in &self.rows {
            out.push(truncate(&row.product_name, width));

            let mut batch = format!(" Batch {}", row.batch_number);
            if let Some(expiry) = &row.expiry {
                batch.push_str(&format!(" Exp {}", expiry));
            }
            out.push(spread(&batch, &format!("MRP {}", amount(row.mrp)), width));

            let mut qty = format!(" {} x {}", row.quantity, amount(row.unit_price));
            if !row.discount.is_zero() {
                qty.push_str(&format!(" -{}%", row.discount));
            }
            qty.push_str(&format!(" GST {}%", row.gst));
            out.push(spread(&qty, &amount(row.line_total), width));
        }

        out.push(rule.clone());
        out.push(spread("Gross", &amount(self.totals.gross_amount), width));
        if !self.totals.discount_amount.is_zero() {
            out.push(spread(
                "Discount",
                &format!("-{}", amount(self.totals.discount_amount)),
                width,
            ));
        }
        out.push(spread("Total", &amount(self.totals.final_amount), width));
        out.push(spread(GST_LABEL, &amount(self.totals.gst_amount), width));
        out.push(rule);
        out.push(center("Thank you. Get well soon!", width));

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

// =============================================================================
// Reset
// =============================================================================

impl Cart {
    /// Confirms the invoice was printed and resets to a fresh cart.
    ///
    /// The only way to leave `Frozen`. Returns the completed sale that was
    /// cleared.
    pub fn acknowledge_printed(&mut self) -> CoreResult<CompletedSale> {
        if self.phase != CartPhase::Frozen {
            return Err(CoreError::NothingToAcknowledge);
        }
        let sale = self.completed.take().ok_or(CoreError::NothingToAcknowledge)?;
        *self = Cart::new();
        Ok(sale)
    }
}

// =============================================================================
// Text Helpers
// =============================================================================

/// `2027-03-31` → `03/27`. Anything unparseable is returned unchanged.
pub fn format_expiry(raw: &str) -> String {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%m/%y").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn center(text: &str, width: usize) -> String {
    let text = truncate(text, width);
    let pad = (width - text.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Left text and right text on one line, right-aligned to `width`.
///
/// The right side always survives; the left side is cut to make room.
fn spread(left: &str, right: &str, width: usize) -> String {
    let right = truncate(right, width);
    let right_len = right.chars().count();
    let room = width.saturating_sub(right_len + 1);
    let left = truncate(left, room);
    let gap = width - left.chars().count() - right_len;
    format!("{}{}{}", left, " ".repeat(gap), right)
}

// =============================================================================
// Unit Tests
// =============================================================================
