//! # Client Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Request        │  │  Status { 4xx / 5xx }   │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Decode                 │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The terminal decides whether a failure is a failed lookup or a failed
//! sale; this type only says what went wrong on the wire.

use thiserror::Error;

/// Result type alias for backend calls.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never produced a response (connection refused, DNS, TLS).
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Backend did not answer within {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// True when the backend could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Request(_) | ClientError::Timeout(_))
    }

    /// The backend's own message when it sent one, for showing to the cashier.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl ClientError {
    /// Classifies a reqwest failure. `timeout_secs` is the configured request
    /// timeout, which reqwest does not report back.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout_secs)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
                message: String::new(),
            }
        } else {
            ClientError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(ClientError::Request("connection refused".into()).is_transport());
        assert!(ClientError::Timeout(15).is_transport());
        assert!(!ClientError::Status {
            status: 422,
            message: "Insufficient stock".into()
        }
        .is_transport());
        assert!(!ClientError::Decode("eof".into()).is_transport());
    }

    #[test]
    fn test_backend_message() {
        let err = ClientError::Status {
            status: 400,
            message: "Branch is closed".into(),
        };
        assert_eq!(err.backend_message(), Some("Branch is closed"));
        assert_eq!(
            ClientError::Status {
                status: 500,
                message: String::new()
            }
            .backend_message(),
            None
        );
    }

    #[test]
    fn test_url_error_conversion() {
        let err: ClientError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }
}
