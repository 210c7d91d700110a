//! # Terminal Error Type
//!
//! The one error shape the cashier sees.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  console command                                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  PosSession operation  ─►  Result<T, PosError>                   │  │
//! │  │         │                                                        │  │
//! │  │         ├── cart rule broken ─── CoreError ──────────┐           │  │
//! │  │         │                                            ▼           │  │
//! │  │         ├── bad operator input ─ ValidationError ─► PosError     │  │
//! │  │         │                                            ▲           │  │
//! │  │         └── backend call ─────── ClientError ────────┘           │  │
//! │  │               (caller picks LOOKUP_FAILED or SUBMISSION_FAILED)  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  printed as:  [INSUFFICIENT_STOCK] Only 5 available in batch B-1 ...   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal. Every failure leaves the cart as it was and waits
//! for the operator to act; nothing retries on its own.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use rxpos_client::ClientError;
use rxpos_core::{CoreError, ValidationError};

/// Cashier-facing error.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Only 5 available in batch B-1 (requested 6)"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message}")]
pub struct PosError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message for the cashier
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Quantity would exceed the batch's captured availability
    InsufficientStock,

    /// Operator lacks the grant for the action
    NotAuthorized,

    /// Empty cart, no branch, or non-positive total
    InvalidSubmission,

    /// Backend rejected the sale or could not be reached
    SubmissionFailed,

    /// Catalog, customer or face adapter unreachable or erroring
    LookupFailed,

    /// Cart is submitting or frozen
    CartLocked,

    /// Line, option or sale not found
    NotFound,

    /// Operator input failed validation
    ValidationError,

    /// Receipt could not be handed to the printer
    PrintFailed,

    /// Configuration could not be loaded
    ConfigError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::NotAuthorized => "NOT_AUTHORIZED",
            ErrorCode::InvalidSubmission => "INVALID_SUBMISSION",
            ErrorCode::SubmissionFailed => "SUBMISSION_FAILED",
            ErrorCode::LookupFailed => "LOOKUP_FAILED",
            ErrorCode::CartLocked => "CART_LOCKED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::PrintFailed => "PRINT_FAILED",
            ErrorCode::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PosError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        PosError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        PosError::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PosError::new(ErrorCode::ValidationError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        PosError::new(ErrorCode::ConfigError, message)
    }

    pub fn print_failed(message: impl Into<String>) -> Self {
        PosError::new(ErrorCode::PrintFailed, message)
    }

    /// A catalog, customer or face call failed.
    pub fn lookup_failed(err: ClientError) -> Self {
        tracing::warn!(error = %err, "Lookup failed");
        PosError::new(ErrorCode::LookupFailed, cashier_message(&err, "Lookup failed"))
    }

    /// The sale-creation call failed. The cart is still intact.
    pub fn submission_failed(err: ClientError) -> Self {
        tracing::error!(error = %err, "Sale submission failed");
        PosError::new(
            ErrorCode::SubmissionFailed,
            cashier_message(&err, "Sale was not recorded"),
        )
    }
}

/// Short text for the cashier; transport detail stays in the logs.
fn cashier_message(err: &ClientError, prefix: &str) -> String {
    if let Some(message) = err.backend_message() {
        return format!("{}: {}", prefix, message);
    }
    match err {
        ClientError::Timeout(_) => format!("{}: backend timed out", prefix),
        e if e.is_transport() => format!("{}: backend unreachable", prefix),
        ClientError::Status { status, .. } => format!("{}: backend returned {}", prefix, status),
        _ => format!("{}: unexpected response", prefix),
    }
}

/// Converts cart engine errors to cashier errors.
impl From<CoreError> for PosError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::NotAuthorized { .. } => ErrorCode::NotAuthorized,
            CoreError::InvalidSubmission(_) => ErrorCode::InvalidSubmission,
            CoreError::CartLocked { .. }
            | CoreError::SubmissionInProgress
            | CoreError::NoSubmissionInProgress => ErrorCode::CartLocked,
            CoreError::LineNotFound(_) | CoreError::NothingToAcknowledge => ErrorCode::NotFound,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        PosError::new(code, err.to_string())
    }
}

impl From<ValidationError> for PosError {
    fn from(err: ValidationError) -> Self {
        PosError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxpos_core::cart::CartPhase;
    use rxpos_core::SubmissionBlocker;

    #[test]
    fn test_display_carries_code() {
        let err = PosError::from(CoreError::InsufficientStock {
            batch: "B-1".into(),
            available: 5,
            requested: 6,
        });
        assert_eq!(
            err.to_string(),
            "[INSUFFICIENT_STOCK] Only 5 available in batch B-1 (requested 6)"
        );
    }

    #[test]
    fn test_core_error_codes() {
        let cases = [
            (
                CoreError::NotAuthorized {
                    action: "edit line discounts".into(),
                },
                ErrorCode::NotAuthorized,
            ),
            (
                CoreError::InvalidSubmission(SubmissionBlocker::EmptyCart),
                ErrorCode::InvalidSubmission,
            ),
            (
                CoreError::CartLocked {
                    phase: CartPhase::Frozen,
                },
                ErrorCode::CartLocked,
            ),
            (CoreError::SubmissionInProgress, ErrorCode::CartLocked),
            (CoreError::LineNotFound("9".into()), ErrorCode::NotFound),
        ];
        for (core, code) in cases {
            assert_eq!(PosError::from(core).code, code);
        }
    }

    #[test]
    fn test_serializes_screaming_snake_code() {
        let err = PosError::lookup_failed(ClientError::Request("refused".into()));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "LOOKUP_FAILED");
        assert_eq!(json["message"], "Lookup failed: backend unreachable");
    }

    #[test]
    fn test_backend_message_reaches_cashier() {
        let err = PosError::submission_failed(ClientError::Status {
            status: 422,
            message: "Batch expired".into(),
        });
        assert_eq!(err.code, ErrorCode::SubmissionFailed);
        assert_eq!(err.message, "Sale was not recorded: Batch expired");
    }

    #[test]
    fn test_status_without_body() {
        let err = PosError::submission_failed(ClientError::Status {
            status: 500,
            message: String::new(),
        });
        assert_eq!(err.message, "Sale was not recorded: backend returned 500");
    }
}
