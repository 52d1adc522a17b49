//! # oud-core: Pricing and Cart Engine for Oud POS
//!
//! Everything the POS page computes between a scan and a checkout lives
//! here, as pure functions over owned snapshots. No I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Oud POS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                         POS page                                │   │
//! │  │    Scan ──► Cart ──► Customer / Discount ──► Pay ──► Receipt    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 oud-checkout (orchestration)                    │   │
//! │  │    CheckoutSession, Catalog, TransactionSubmitter, config       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ oud-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  units   │►│ pricing  │►│   cart   │►│  totals  │          │   │
//! │  │   │ ml/tola  │ │ line $   │ │ CartStore│ │ disc+VAT │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └────┬─────┘          │   │
//! │  │                                               ▼                 │   │
//! │  │                                         ┌──────────┐           │   │
//! │  │                                         │ payment  │           │   │
//! │  │                                         └──────────┘           │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` over exact decimals, AED
//! - [`types`] - Product, Customer, DiscountSpec, PaymentDetails
//! - [`units`] - Unit conversion through the reference unit (ml)
//! - [`pricing`] - Line pricing
//! - [`cart`] - CartStore and CartLine
//! - [`discount`] - Customer + cashier discount stacking
//! - [`tax`] - Flat VAT
//! - [`totals`] - Totals composition and warnings
//! - [`payment`] - Cash sufficiency and change
//! - [`notify`] - Operator feedback port
//! - [`validation`] - Input checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart, customer and discount in, same totals out
//! 2. **No I/O**: fetching, storing and printing belong to other crates
//! 3. **Exact Decimals**: full precision inside, 2 places only at the edge
//! 4. **Explicit Errors**: typed, recoverable, never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use oud_core::{CartStore, DiscountSpec, Money, Product, TotalsAggregator};
//! use rust_decimal::Decimal;
//!
//! let product = Product {
//!     id: "p-1".into(),
//!     sku: None,
//!     barcode: None,
//!     name: "Musk Soap".into(),
//!     name_ar: None,
//!     category: None,
//!     brand: None,
//!     price: Money::from_major(50),
//!     base_price: None,
//!     units: Vec::new(),
//!     stock_quantity: Decimal::from(20),
//!     is_weight_based: false,
//! };
//!
//! let mut cart = CartStore::new();
//! cart.add(&product, Decimal::TWO, None);
//!
//! let totals = TotalsAggregator::compute(&cart, None, &DiscountSpec::none());
//! assert_eq!(totals.total, Money::from_major(105));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod notify;
pub mod payment;
pub mod pricing;
pub mod tax;
pub mod totals;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLine, CartStore};
pub use discount::{DiscountBreakdown, DiscountEngine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use notify::{CartEvent, CartNotifier, NoopNotifier, RecordingNotifier};
pub use payment::PaymentReconciler;
pub use pricing::PricingCalculator;
pub use tax::{TaxCalculator, TaxRate};
pub use totals::{Totals, TotalsAggregator, TotalsWarning};
pub use types::*;
pub use units::UnitConversionService;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// One loyalty point per this many AED of the order total.
pub const LOYALTY_POINTS_DIVISOR: i64 = 10;

/// Loyalty points earned on a sale: `floor(total / 10)` with a customer,
/// zero without one.
///
/// ```rust
/// use oud_core::{loyalty_points_earned, Money};
///
/// assert_eq!(loyalty_points_earned(Money::from_minor(16_800), true), 16);
/// assert_eq!(loyalty_points_earned(Money::from_minor(16_800), false), 0);
/// ```
pub fn loyalty_points_earned(total: Money, has_customer: bool) -> u64 {
    use rust_decimal::prelude::ToPrimitive;

    if !has_customer || !total.is_positive() {
        return 0;
    }
    (total.amount() / rust_decimal::Decimal::from(LOYALTY_POINTS_DIVISOR))
        .floor()
        .to_u64()
        .unwrap_or(0)
}
