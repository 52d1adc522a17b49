//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    10 × (2 × 11.66) = 233.20000000000002  ❌ WRONG!                     │
//! │                                                                         │
//! │  Perfume is sold by the ml, gram and tola, so quantities are           │
//! │  fractional and integer cents alone cannot express a line total        │
//! │  before rounding.                                                       │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, full precision, round ONCE             │
//! │    10 × (2 × 11.66) = 233.20 exactly                                   │
//! │    Rounding to fils happens only for display and storage               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use oud_core::money::Money;
//!
//! let price = Money::from_minor(5000);          // AED 50.00
//! let line = price * rust_decimal::Decimal::TWO; // AED 100.00
//! assert_eq!(line, Money::from_major(100));
//! assert_eq!(line.to_string(), "AED 100.00");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::tax::TaxRate;

/// ISO 4217 code of the only currency the engine computes in.
pub const CURRENCY: &str = "AED";

/// Decimal places used when a value is shown or stored (fils).
pub const CURRENCY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in AED, kept at full decimal precision.
///
/// ## Design Decisions
/// - **Decimal (signed)**: discounts and refunds may be negative
/// - **Single field tuple struct**: zero-cost wrapper
/// - **No implicit rounding**: arithmetic never rounds, see [`Money::round_currency`]
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.base_price ──► PricingCalculator ──► CartLine.total_price      │
/// │                                                                         │
/// │  Σ line totals ──► subtotal ──► discounts ──► VAT ──► total             │
/// │                                                                         │
/// │  total ──► PaymentReconciler ──► change                                 │
/// │                                                                         │
/// │  round_currency() only at the receipt / wire boundary                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    Decimal,
);

impl Money {
    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a value from minor units (fils).
    ///
    /// ```rust
    /// use oud_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(23320).to_string(), "AED 233.20");
    /// ```
    #[inline]
    pub fn from_minor(minor: i64) -> Self {
        Money(Decimal::new(minor, CURRENCY_DECIMALS))
    }

    /// Creates a value from whole dirhams.
    #[inline]
    pub fn from_major(major: i64) -> Self {
        Money(Decimal::from(major))
    }

    /// Returns the exact underlying amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Rounds to fils, midpoint away from zero.
    ///
    /// This is the only rounding in the engine. Call it when a value leaves
    /// the engine (receipt, transaction request, display), never in between.
    ///
    /// ```rust
    /// use oud_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let vat = Money::new(Decimal::new(11_6625, 4)); // 11.6625
    /// assert_eq!(vat.round_currency(), Money::from_minor(1166));
    ///
    /// let half = Money::new(Decimal::new(1_005, 3)); // 1.005
    /// assert_eq!(half.round_currency(), Money::from_minor(101));
    /// ```
    pub fn round_currency(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns `percent`% of this amount (`self × percent / 100`).
    ///
    /// ```rust
    /// use oud_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let subtotal = Money::from_major(200);
    /// assert_eq!(subtotal.percentage(Decimal::TEN), Money::from_major(20));
    /// ```
    pub fn percentage(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Applies a basis-point rate (used for VAT).
    pub fn apply_rate(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.as_fraction())
    }

    /// Multiplies by a (possibly fractional) quantity.
    #[inline]
    pub fn multiply_quantity(&self, quantity: Decimal) -> Money {
        Money(self.0 * quantity)
    }

    /// Multiplies by a quantity, `None` when the result overflows.
    #[inline]
    pub fn checked_multiply_quantity(&self, quantity: Decimal) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Divides by a quantity, `None` when the quantity is zero.
    pub fn per_quantity(&self, quantity: Decimal) -> Option<Money> {
        self.0.checked_div(quantity).map(Money)
    }

    /// Returns this value, or zero if it is negative.
    #[inline]
    pub fn non_negative(self) -> Money {
        self.max(Money::zero())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display rounds to fils: `AED 233.20`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_currency().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{}{} {:.2}", sign, CURRENCY, rounded.abs())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a quantity.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, quantity: Decimal) -> Self {
        Money(self.0 * quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
