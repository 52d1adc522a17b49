//! # Tax Module
//!
//! UAE VAT: a flat 5% applied to the amount left after all discounts.
//!
//! ```text
//! subtotal ──► − discounts ──► after_discount ──► × 5% ──► vat_amount
//!                                   │                          │
//!                                   └────────── + ─────────────┴──► total
//! ```
//!
//! No exemptions and no intermediate rounding. The VAT figure is kept at
//! full precision and rounded with the other totals when it leaves the
//! engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5% (UAE standard VAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// UAE standard-rated VAT.
    pub const UAE_VAT: TaxRate = TaxRate(500);

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as an exact fraction (500 bps → 0.05).
    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    /// Returns the rate as a percentage (500 bps → 5).
    pub fn percentage(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::UAE_VAT
    }
}

// =============================================================================
// Tax Calculator
// =============================================================================

/// Computes VAT on a post-discount amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxCalculator {
    rate: TaxRate,
}

impl TaxCalculator {
    pub const fn new(rate: TaxRate) -> Self {
        TaxCalculator { rate }
    }

    /// The statutory calculator used by checkout.
    pub const fn uae() -> Self {
        TaxCalculator::new(TaxRate::UAE_VAT)
    }

    pub const fn rate(&self) -> TaxRate {
        self.rate
    }

    /// `after_discount × rate`, unrounded.
    ///
    /// ```rust
    /// use oud_core::money::Money;
    /// use oud_core::tax::TaxCalculator;
    ///
    /// let vat = TaxCalculator::uae().vat(Money::from_major(100));
    /// assert_eq!(vat, Money::from_major(5));
    /// ```
    pub fn vat(&self, after_discount: Money) -> Money {
        after_discount.apply_rate(self.rate)
    }
}
