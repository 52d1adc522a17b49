//! # Error Types
//!
//! Domain-specific error types for oud-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  oud-core errors (this file)                                           │
//! │  ├── CoreError        - Recoverable checkout conditions                │
//! │  └── ValidationError  - Operator input that can't be used              │
//! │                                                                         │
//! │  oud-db errors (separate crate)                                        │
//! │  └── DbError          - Receipt store failures                         │
//! │                                                                         │
//! │  oud-checkout errors                                                   │
//! │  └── CheckoutError    - What the POS page sees (with ErrorCode)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → POS page          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal. Each one is shown to the operator and the
//! session carries on.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Recoverable business-rule failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cash tendered is below the payable total.
    ///
    /// ## User Workflow
    /// ```text
    /// Total: AED 105.00, cash typed: AED 100.00
    ///      │
    ///      ▼
    /// InsufficientCash { total: 105.00, received: 100.00 }
    ///      │
    ///      ▼
    /// Payment dialog stays open, "Pay" disabled until corrected
    /// ```
    #[error("Insufficient cash: total {total}, received {received}")]
    InsufficientCash { total: Money, received: Money },

    /// Barcode / SKU / id lookup missed. The cart is not touched.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer lookup missed. The selection is not touched.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: Decimal,
        max: Decimal,
    },

    /// Fractional quantity for a unit sold whole.
    #[error("{field} must be a whole number of {unit}")]
    NotWholeNumber { field: String, unit: String },

    /// The line would pass the per-line quantity or amount limit.
    #[error("{field} is too large for one cart line")]
    LineLimitExceeded { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
