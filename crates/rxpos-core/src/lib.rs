//! # rxpos-core: Pure Business Logic for the rxpos Terminal
//!
//! This crate holds the cart and pricing engine of the pharmacy point of
//! sale. Everything here is synchronous and free of I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        rxpos Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Cashier Console (apps/terminal)                 │   │
//! │  │    search ──► add ──► qty/disc ──► submit ──► print            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rxpos-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │ pricing  │ │   cart   │ │   submission     │  │   │
//! │  │   │ StockRow │ │ resolver │ │  phases  │ │   SaleOrder      │  │   │
//! │  │   │ Customer │ │ GST dflt │ │  totals  │ │   invoice/reset  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                rxpos-client (REST adapters)                     │   │
//! │  │         stock search, customers, face identify, sales           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockRow, Customer, Branch, PaymentMethod)
//! - [`money`] - Integer money in paise
//! - [`pricing`] - Catalog row resolution and the price fallback chain
//! - [`permission`] - The `(grants, action) -> allowed` predicate
//! - [`cart`] - The cart state machine and line math
//! - [`submission`] - Sale order mapping and the submit lifecycle
//! - [`invoice`] - Frozen sale projection, receipt text, reset
//! - [`history`] - Customer purchase history window
//! - [`error`] - Domain error types
//! - [`validation`] - Operator input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use rxpos_core::cart::Cart;
//! use rxpos_core::types::StockRow;
//! use rxpos_core::DEFAULT_GST;
//!
//! let row = StockRow {
//!     stock_id: Some(1.into()),
//!     selling_price: Some(100.0),
//!     quantity_available: Some(5.0),
//!     ..StockRow::default()
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_or_increment(&row, DEFAULT_GST).unwrap();
//! cart.add_or_increment(&row, DEFAULT_GST).unwrap();
//!
//! assert_eq!(cart.lines().len(), 1);
//! assert_eq!(cart.totals().total_amount.minor(), 20000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod history;
pub mod invoice;
pub mod money;
pub mod permission;
pub mod pricing;
pub mod submission;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartPhase, CartTotals};
pub use error::{CoreError, CoreResult, SubmissionBlocker, ValidationError};
pub use money::Money;
pub use permission::{is_allowed, Action, Grants};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// GST applied when a catalog row carries no usable tax field (12 %).
pub const DEFAULT_GST: Percentage = Percentage::from_bps(1200);

/// Default purchase history window, in months.
pub const DEFAULT_HISTORY_MONTHS: u32 = 6;

/// Maximum rows requested for a customer's purchase history.
pub const MAX_HISTORY_ROWS: u32 = 100;

/// Maximum accepted length of a lookup query.
pub const MAX_QUERY_LEN: usize = 100;
