//! # Checkout Error Types
//!
//! Errors surfaced by the checkout layer, and the payload the POS page
//! receives for them.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Oud POS                                │
//! │                                                                         │
//! │  POS page                     Rust                                      │
//! │  ────────                     ────                                      │
//! │                                                                         │
//! │  scan("6291...")                                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  CheckoutSession / TransactionSubmitter                          │  │
//! │  │  Result<T, CheckoutError>                                        │  │
//! │  │         │                                                        │  │
//! │  │  CoreError ───────────────┐                                      │  │
//! │  │  BackendError ─► SubmissionFailed ─┤                             │  │
//! │  │  timeout / panic ─► SubmissionFailed ─┤                          │  │
//! │  │                           ▼                                      │  │
//! │  │                    CheckoutError ──► ErrorPayload { code, msg }  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  e.code === "INSUFFICIENT_CASH" → keep payment dialog open             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable. None of them touch the cart.

use oud_core::{CoreError, ValidationError};
use oud_db::DbError;
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Checkout Error
// =============================================================================

/// What a session or submitter operation can fail with.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Business-rule failure from the engine (insufficient cash, unknown
    /// product, bad input).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Checkout attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Another submission is still in flight.
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    /// The backend did not accept the transaction. Cart, customer and
    /// discount are untouched; the operator may retry.
    #[error("Submission failed: {reason}")]
    SubmissionFailed { reason: String },
}

impl CheckoutError {
    pub fn submission_failed(reason: impl Into<String>) -> Self {
        CheckoutError::SubmissionFailed {
            reason: reason.into(),
        }
    }

    /// Machine-readable code for the POS page.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::Core(CoreError::InsufficientCash { .. }) => ErrorCode::InsufficientCash,
            CheckoutError::Core(CoreError::ProductNotFound(_)) => ErrorCode::ProductNotFound,
            CheckoutError::Core(CoreError::CustomerNotFound(_)) => ErrorCode::CustomerNotFound,
            CheckoutError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
            CheckoutError::EmptyCart => ErrorCode::EmptyCart,
            CheckoutError::SubmissionInProgress => ErrorCode::SubmissionInProgress,
            CheckoutError::SubmissionFailed { .. } => ErrorCode::SubmissionFailed,
        }
    }

    /// Serializable form for the POS page.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Core(CoreError::Validation(err))
    }
}

/// Error codes for the POS page.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (e.code) {
///   case 'INSUFFICIENT_CASH':   keepPaymentOpen(); break;
///   case 'PRODUCT_NOT_FOUND':   beepError(); break;
///   case 'SUBMISSION_FAILED':   showRetry(e.message); break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InsufficientCash,
    ProductNotFound,
    CustomerNotFound,
    ValidationError,
    EmptyCart,
    SubmissionInProgress,
    SubmissionFailed,
}

/// What the POS page receives when an operation fails.
///
/// ```json
/// { "code": "INSUFFICIENT_CASH", "message": "Insufficient cash: total AED 105.00, received AED 100.00" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&CheckoutError> for ErrorPayload {
    fn from(err: &CheckoutError) -> Self {
        err.to_payload()
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Backend Error
// =============================================================================

/// Failures talking to the sales backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure (connect, TLS, timeout inside reqwest).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response with a body we can't use.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

// =============================================================================
// Config Error
// =============================================================================

/// Failures loading [`PosConfig`](crate::config::PosConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Load(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Receipt Store Error
// =============================================================================

/// Failures writing or reading receipts.
#[derive(Debug, Error)]
pub enum ReceiptStoreError {
    /// Receipts are write-once.
    #[error("receipt {0} already stored")]
    Duplicate(String),

    #[error("receipt could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("receipt storage failed: {0}")]
    Storage(String),
}

impl From<DbError> for ReceiptStoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { value, .. } => ReceiptStoreError::Duplicate(value),
            DbError::Serialization(msg) => {
                ReceiptStoreError::Storage(format!("bad stored payload: {}", msg))
            }
            other => ReceiptStoreError::Storage(other.to_string()),
        }
    }
}

// =============================================================================
// Terminal Error
// =============================================================================

/// Startup failures of a [`Terminal`](crate::terminal::Terminal).
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("receipt database unavailable: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

// =============================================================================
// Unit Tests
// =============================================================================
