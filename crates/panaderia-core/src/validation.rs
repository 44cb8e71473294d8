//! # Validation Module
//!
//! Input validation helpers shared by the engine layer. Each helper returns
//! `Result<(), ValidationError>` with field-level detail, so callers can
//! compose them with `?` before touching storage.

use crate::error::ValidationError;
use crate::MIN_PASSWORD_LENGTH;

// =============================================================================
// Identifier / Text Validation
// =============================================================================

/// Validates that a required text field is non-empty (after trimming).
pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a free-text field against a maximum length.
pub fn validate_max_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Quantity / Price Validation
// =============================================================================

/// Validates a line or movement quantity: any strictly positive integer.
pub fn validate_quantity(quantity: i64) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price in cents (zero allowed for giveaways).
pub fn validate_unit_price(cents: i64) -> Result<(), ValidationError> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "unit_price".to_string(),
        });
    }
    Ok(())
}

/// Validates the target value of a set-stock operation.
pub fn validate_new_stock(new_stock: i64) -> Result<(), ValidationError> {
    if new_stock < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "new_stock".to_string(),
        });
    }
    Ok(())
}

/// Validates sale header totals: non-negative, and the stored total must
/// equal subtotal plus tax.
pub fn validate_sale_totals(
    subtotal_cents: i64,
    tax_cents: i64,
    total_cents: i64,
) -> Result<(), ValidationError> {
    if subtotal_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "subtotal".to_string(),
        });
    }
    if tax_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "tax".to_string(),
        });
    }
    if subtotal_cents + tax_cents != total_cents {
        return Err(ValidationError::InvalidFormat {
            field: "total".to_string(),
            reason: format!(
                "total {} does not equal subtotal {} + tax {}",
                total_cents, subtotal_cents, tax_cents
            ),
        });
    }
    Ok(())
}

// =============================================================================
// Password Policy
// =============================================================================

/// Validates a candidate password against the strength policy: minimum
/// length plus at least one letter and one digit.
///
/// Returns the human-readable reason on failure so the caller can wrap it
/// in `CoreError::WeakPassword`.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("must contain at least one letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("must contain at least one digit".to_string());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
