//! # Validation Module
//!
//! Checks on raw operator input before it reaches the cart or an adapter.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Console input                                                │
//! │  └── THIS MODULE: parse and bound what the cashier typed               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Cart engine                                                  │
//! │  └── stock ceilings, discount grants, phase rules                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── inventory ledger, tax, persistence                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::EntityId;
use crate::MAX_QUERY_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a lookup query and returns it trimmed.
///
/// Empty is allowed; the lookup layer answers it with no options.
///
/// ```rust
/// use rxpos_core::validation::validate_search_query;
///
/// assert_eq!(validate_search_query("  para ").unwrap(), "para");
/// assert!(validate_search_query(&"x".repeat(101)).is_err());
/// ```
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

/// Parses a stock or customer id typed by the operator.
pub fn parse_entity_id(field: &str, raw: &str) -> ValidationResult<EntityId> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(EntityId::parse(raw))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a quantity. Zero and negatives are accepted; the cart treats them
/// as "remove the line".
pub fn parse_quantity(raw: &str) -> ValidationResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "must be a whole number".to_string(),
        })
}

/// Parses a discount percent.
///
/// Non-numeric input becomes `NaN`, which the cart clamps to 0 like any other
/// unusable discount.
pub fn parse_discount(raw: &str) -> f64 {
    raw.trim().trim_end_matches('%').trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Parses a 1-based pick from a numbered option list.
pub fn parse_choice(raw: &str, options: usize) -> ValidationResult<usize> {
    let n = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "choice".to_string(),
            reason: "must be a number from the list".to_string(),
        })?;

    if n == 0 || n > options {
        return Err(ValidationError::OutOfRange {
            field: "choice".to_string(),
            min: 1,
            max: options as i64,
        });
    }

    Ok(n - 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("").unwrap(), "");
        assert_eq!(validate_search_query(" dolo 650 ").unwrap(), "dolo 650");
        assert!(validate_search_query(&"a".repeat(100)).is_ok());
        assert!(validate_search_query(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_parse_entity_id() {
        assert_eq!(parse_entity_id("stock", "12").unwrap(), EntityId::Int(12));
        assert_eq!(
            parse_entity_id("stock", "STK-9").unwrap(),
            EntityId::Text("STK-9".into())
        );
        assert!(matches!(
            parse_entity_id("stock", "  "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3").unwrap(), 3);
        assert_eq!(parse_quantity(" 0 ").unwrap(), 0);
        assert_eq!(parse_quantity("-2").unwrap(), -2);
        assert!(parse_quantity("two").is_err());
        assert!(parse_quantity("1.5").is_err());
    }

    #[test]
    fn test_parse_discount() {
        assert_eq!(parse_discount("12.5"), 12.5);
        assert_eq!(parse_discount("10%"), 10.0);
        assert!(parse_discount("ten").is_nan());
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1", 3).unwrap(), 0);
        assert_eq!(parse_choice("3", 3).unwrap(), 2);
        assert!(parse_choice("0", 3).is_err());
        assert!(parse_choice("4", 3).is_err());
        assert!(parse_choice("x", 3).is_err());
    }
}
