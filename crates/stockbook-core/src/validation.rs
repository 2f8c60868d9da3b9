//! # Validation Module
//!
//! Input validation for every stockbook write path.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API layer (out of tree)                                      │
//! │  └── Deserialization, request shape                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Inventory engine (stockbook-db)                              │
//! │  └── THIS MODULE: field rules, before any lock or transaction          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity > 0, kind IN ('IN','OUT','ADJ'))                  │
//! │  ├── UNIQUE (products.code, sales.movement_id)                         │
//! │  └── Append-only triggers on movements and resolutions                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockbook_core::validation::{validate_code, validate_quantity};
//!
//! assert!(validate_code("BRK-001").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_QUANTITY, MAX_TEXT_LEN, MAX_UNIT_COST_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - Letters, digits and `-_./` only (barcode payloads are plain ASCII codes)
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::validate_code;
///
/// assert!(validate_code("7501234567890").is_ok());
/// assert!(validate_code("BRK 001").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > 64 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 64,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, and - _ . /".to_string(),
        });
    }

    Ok(())
}

/// Validates a product description.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_required_text("description", description, 200)
}

/// Validates a product type name.
pub fn validate_type_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, 100)
}

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates optional free text (reason, note, customer).
///
/// Absent is fine; present must fit in [`MAX_TEXT_LEN`].
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_TEXT_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates a catalog search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "q".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement or sale quantity.
///
/// ## Rules
/// - Must be positive (> 0) for every movement kind, ADJ included
/// - At most [`MAX_QUANTITY`]
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::validate_quantity;
///
/// assert!(validate_quantity(10).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-3).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit cost or unit price in cents. Zero is allowed.
pub fn validate_unit_cost(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_COST_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_UNIT_COST_CENTS,
        });
    }
    Ok(())
}

/// Validates a min/max stock threshold value.
pub fn validate_threshold(field: &str, value: i64) -> ValidationResult<()> {
    if !(0..=MAX_QUANTITY).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a (min, max) threshold pair.
///
/// The ordering check only applies when both bounds are given.
pub fn validate_thresholds(min: Option<i64>, max: Option<i64>) -> ValidationResult<()> {
    if let Some(min) = min {
        validate_threshold("min_stock", min)?;
    }
    if let Some(max) = max {
        validate_threshold("max_stock", max)?;
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ValidationError::OutOfRange {
                field: "min_stock".to_string(),
                min: 0,
                max,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("BRK-001").is_ok());
        assert!(validate_code("  FLT.22/B  ").is_ok());
        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("A B").is_err());
        assert!(validate_code(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("Brake pad, front").is_ok());
        assert_eq!(
            validate_description("  ").unwrap_err(),
            ValidationError::Required {
                field: "description".to_string()
            }
        );
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-1).is_err());
        assert!(matches!(
            validate_quantity(MAX_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost("unit_cost_cents", 0).is_ok());
        assert!(validate_unit_cost("unit_cost_cents", 100).is_ok());
        assert!(validate_unit_cost("unit_cost_cents", -1).is_err());
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(validate_thresholds(Some(5), None).is_ok());
        assert!(validate_thresholds(None, Some(5)).is_ok());
        assert!(validate_thresholds(Some(5), Some(5)).is_ok());
        assert!(validate_thresholds(Some(-1), None).is_err());
        assert!(validate_thresholds(Some(6), Some(5)).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert!(validate_optional_text("note", None).is_ok());
        assert!(validate_optional_text("note", Some("ok")).is_ok());
        let long = "x".repeat(MAX_TEXT_LEN + 1);
        assert!(validate_optional_text("note", Some(&long)).is_err());
    }
}
