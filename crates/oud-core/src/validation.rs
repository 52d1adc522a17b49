//! # Validation Module
//!
//! Checks on operator input before it reaches the engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: POS page                                                     │
//! │  ├── Numeric keypad, empty-field checks                                │
//! │  └── Immediate feedback                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: CheckoutSession (oud-checkout)                               │
//! │  └── THIS MODULE: quantities, discounts, tendered cash                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine                                                       │
//! │  ├── CartStore refuses non-positive and oversized lines                │
//! │  └── Totals clamp stacked discounts                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DiscountKind, DiscountSpec};
use crate::units::PIECE;

/// Largest quantity one cart line may hold, in any unit.
pub const MAX_QUANTITY: i64 = 100_000;

/// Largest amount, in dirhams, for a line total, a fixed discount or
/// tendered cash.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a line quantity.
///
/// ## Rules
/// - Must be greater than zero
/// - Must not exceed [`MAX_QUANTITY`]
/// - Must be a whole number when sold by the piece
///
/// ## Example
/// ```rust
/// use oud_core::validation::validate_quantity;
/// use rust_decimal::Decimal;
///
/// assert!(validate_quantity(Decimal::new(25, 1), "tola").is_ok());
/// assert!(validate_quantity(Decimal::new(25, 1), "piece").is_err());
/// assert!(validate_quantity(Decimal::ZERO, "ml").is_err());
/// ```
pub fn validate_quantity(quantity: Decimal, unit: &str) -> ValidationResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > Decimal::from(MAX_QUANTITY) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: Decimal::ZERO,
            max: Decimal::from(MAX_QUANTITY),
        });
    }

    if unit == PIECE && !quantity.fract().is_zero() {
        return Err(ValidationError::NotWholeNumber {
            field: "quantity".to_string(),
            unit: PIECE.to_string(),
        });
    }

    Ok(())
}

/// Validates a cashier discount.
///
/// ## Rules
/// - Value must not be negative
/// - Percentages must be within 0..=100
/// - Fixed amounts must not exceed [`MAX_AMOUNT`]
///
/// A fixed discount larger than the subtotal is allowed here; the totals
/// clamp deals with it.
pub fn validate_discount(spec: &DiscountSpec) -> ValidationResult<()> {
    if spec.value < Decimal::ZERO {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount".to_string(),
        });
    }

    if spec.kind == DiscountKind::Percentage && spec.value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: Decimal::ZERO,
            max: Decimal::ONE_HUNDRED,
        });
    }

    if spec.kind == DiscountKind::Fixed && spec.value > Decimal::from(MAX_AMOUNT) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: Decimal::ZERO,
            max: Decimal::from(MAX_AMOUNT),
        });
    }

    Ok(())
}

/// Validates the cash amount typed into the tender field.
pub fn validate_amount_received(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "amountReceived".to_string(),
        });
    }
    if amount.amount() > Decimal::from(MAX_AMOUNT) {
        return Err(ValidationError::OutOfRange {
            field: "amountReceived".to_string(),
            min: Decimal::ZERO,
            max: Decimal::from(MAX_AMOUNT),
        });
    }
    Ok(())
}

/// Validates a scanned or typed lookup code.
pub fn validate_lookup_code(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
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
    fn test_quantity() {
        assert!(validate_quantity(Decimal::ONE, "piece").is_ok());
        assert!(validate_quantity(Decimal::new(5, 1), "ml").is_ok());
        assert_eq!(
            validate_quantity(Decimal::NEGATIVE_ONE, "ml"),
            Err(ValidationError::MustBePositive {
                field: "quantity".to_string()
            })
        );
        assert!(matches!(
            validate_quantity(Decimal::new(15, 1), "piece"),
            Err(ValidationError::NotWholeNumber { .. })
        ));
    }

    #[test]
    fn test_quantity_upper_bound() {
        assert!(validate_quantity(Decimal::from(MAX_QUANTITY), "ml").is_ok());
        assert_eq!(
            validate_quantity(Decimal::from(100_000_000_000_000_000_i64), "piece"),
            Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: Decimal::ZERO,
                max: Decimal::from(MAX_QUANTITY),
            })
        );
    }

    #[test]
    fn test_discount() {
        assert!(validate_discount(&DiscountSpec::none()).is_ok());
        assert!(validate_discount(&DiscountSpec::percentage(Decimal::ONE_HUNDRED)).is_ok());
        assert!(validate_discount(&DiscountSpec::fixed(Money::from_major(5000))).is_ok());

        assert!(matches!(
            validate_discount(&DiscountSpec::percentage(Decimal::from(101))),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_discount(&DiscountSpec::fixed(Money::from_major(-1))),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
        assert!(matches!(
            validate_discount(&DiscountSpec::fixed(Money::from_major(MAX_AMOUNT + 1))),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_amount_received() {
        assert!(validate_amount_received(Money::zero()).is_ok());
        assert!(validate_amount_received(Money::from_minor(-1)).is_err());
        assert!(validate_amount_received(Money::from_major(MAX_AMOUNT + 1)).is_err());
    }

    #[test]
    fn test_lookup_code() {
        assert!(validate_lookup_code("6291100000017").is_ok());
        assert!(validate_lookup_code("   ").is_err());
    }
}
