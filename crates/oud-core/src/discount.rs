//! # Discount Engine
//!
//! Combines the two independent order discounts.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Discount Sources                                │
//! │                                                                         │
//! │  Customer tier              Cashier discount (DiscountSpec)            │
//! │  ─────────────              ───────────────────────────────            │
//! │  subtotal × rate / 100      none        → 0                            │
//! │  (0 with no customer)       percentage  → subtotal × value / 100       │
//! │                             fixed       → value                        │
//! │           │                          │                                  │
//! │           └──────────── + ───────────┘                                  │
//! │                         │                                               │
//! │                  total_discount  (summed, not capped here)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine reports the raw sum. Whether that sum may exceed the subtotal
//! is a totals-level rule, see [`crate::totals`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, DiscountKind, DiscountSpec};

/// Discount amounts for one subtotal, unrounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountBreakdown {
    pub customer_discount: Money,
    pub custom_discount: Money,
    pub total_discount: Money,
}

/// Stateless discount computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountEngine;

impl DiscountEngine {
    pub fn compute(
        subtotal: Money,
        customer: Option<&Customer>,
        spec: &DiscountSpec,
    ) -> DiscountBreakdown {
        let customer_discount = Self::customer_discount(subtotal, customer);
        let custom_discount = Self::custom_discount(subtotal, spec);

        DiscountBreakdown {
            customer_discount,
            custom_discount,
            total_discount: customer_discount + custom_discount,
        }
    }

    /// `subtotal × customer.discount_rate / 100`, zero without a customer.
    pub fn customer_discount(subtotal: Money, customer: Option<&Customer>) -> Money {
        customer
            .map(|c| subtotal.percentage(c.discount_rate))
            .unwrap_or_default()
    }

    /// The cashier's ad-hoc discount.
    pub fn custom_discount(subtotal: Money, spec: &DiscountSpec) -> Money {
        match spec.kind {
            DiscountKind::None => Money::zero(),
            DiscountKind::Percentage => subtotal.percentage(spec.value),
            DiscountKind::Fixed => Money::new(spec.value),
        }
    }
}
