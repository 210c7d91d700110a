//! # Error Types
//!
//! Domain-specific error types for rxpos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rxpos-core errors (this file)                                         │
//! │  ├── CoreError        - Cart engine rule violations                    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  rxpos-client errors (separate crate)                                  │
//! │  └── ClientError      - Backend transport / decode failures            │
//! │                                                                         │
//! │  terminal errors (in app)                                              │
//! │  └── PosError         - What the cashier sees (code + message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                        ClientError ─┴─► PosError → Cashier             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is pure local validation: it is detected synchronously
//! and never involves a network round-trip.

use thiserror::Error;

use crate::cart::CartPhase;

// =============================================================================
// Core Error
// =============================================================================

/// Cart engine errors.
///
/// A failed operation always leaves the cart exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The requested quantity exceeds what the batch had available when it
    /// was added to the cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan batch B-12 (avl 2) ─► qty 1
    /// Scan batch B-12 again   ─► qty 2
    /// Scan batch B-12 again   ─► InsufficientStock { available: 2, requested: 3 }
    ///                            UI shows "Only 2 available in this batch"
    /// ```
    #[error("Only {available} available in batch {batch} (requested {requested})")]
    InsufficientStock {
        batch: String,
        available: i64,
        requested: i64,
    },

    /// The caller lacks the grant required for the action.
    #[error("Not authorized to {action}")]
    NotAuthorized { action: String },

    /// Submission preconditions failed; the sale was not sent.
    #[error("Cannot complete sale: {0}")]
    InvalidSubmission(SubmissionBlocker),

    /// The cart is not accepting changes in its current phase.
    #[error("Cart is {phase}; changes are not allowed")]
    CartLocked { phase: CartPhase },

    /// A sale submission is already in flight.
    #[error("A sale is already being submitted")]
    SubmissionInProgress,

    /// A submission result arrived while no submission was in flight.
    #[error("No sale submission is in progress")]
    NoSubmissionInProgress,

    /// No line in the cart carries this stock id.
    #[error("Stock {0} is not in the cart")]
    LineNotFound(String),

    /// "Acknowledge printed" was requested without a completed sale.
    #[error("There is no completed sale to acknowledge")]
    NothingToAcknowledge,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Why a cart could not be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionBlocker {
    NoBranch,
    EmptyCart,
    NonPositiveTotal,
}

impl std::fmt::Display for SubmissionBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionBlocker::NoBranch => write!(f, "please select a branch first"),
            SubmissionBlocker::EmptyCart => write!(f, "cart is empty"),
            SubmissionBlocker::NonPositiveTotal => write!(f, "total must be greater than 0"),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. unparseable number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
