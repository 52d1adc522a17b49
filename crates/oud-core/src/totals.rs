//! # Totals Aggregator
//!
//! Composes cart, discounts and VAT into the figures shown on the POS page
//! and sent at checkout.
//!
//! ```text
//! CartStore ──► subtotal ──► DiscountEngine ──► clamp ──► TaxCalculator ──► Totals
//!                               ▲                                           │
//!             Customer ─────────┤                                           ▼
//!             DiscountSpec ─────┘                                  UI / PaymentReconciler
//! ```
//!
//! ## No Cache
//! Totals are rebuilt from scratch on every call. The cart, the selected
//! customer and the discount spec are the only sources of truth; a cart is
//! tens of lines, so the O(n) pass is cheap.
//!
//! ## Discount Clamp
//! Stacked discounts (e.g. VIP 10% plus a 100% cashier discount) can exceed
//! the subtotal. The applied discount is clamped to the subtotal so
//! `after_discount` never goes below zero, and the clamp is reported as a
//! [`TotalsWarning::NegativeAfterDiscount`] for the operator.

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::cart::CartStore;
use crate::discount::DiscountEngine;
use crate::money::Money;
use crate::tax::TaxCalculator;
use crate::types::{Customer, DiscountSpec};

/// Something the operator should look at before taking payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TotalsWarning {
    /// Requested discounts exceed the subtotal; the excess was dropped.
    #[serde(rename_all = "camelCase")]
    NegativeAfterDiscount {
        requested_discount: Money,
        applied_discount: Money,
    },

    /// A line is priced in a unit its product doesn't declare (rate 1 used).
    #[serde(rename_all = "camelCase")]
    UnrecognizedUnit { product_id: String, unit: String },
}

/// Order totals, full precision.
///
/// `total_discount` is the discount actually applied (after the clamp);
/// the two source amounts are reported as computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub customer_discount: Money,
    pub custom_discount: Money,
    pub total_discount: Money,
    pub after_discount: Money,
    pub vat_amount: Money,
    pub total: Money,
    pub warnings: Vec<TotalsWarning>,
}

impl Totals {
    /// A copy with every amount rounded to fils, for display and storage.
    pub fn rounded(&self) -> Totals {
        Totals {
            subtotal: self.subtotal.round_currency(),
            customer_discount: self.customer_discount.round_currency(),
            custom_discount: self.custom_discount.round_currency(),
            total_discount: self.total_discount.round_currency(),
            after_discount: self.after_discount.round_currency(),
            vat_amount: self.vat_amount.round_currency(),
            total: self.total.round_currency(),
            warnings: self.warnings.clone(),
        }
    }

    /// Whether the discount clamp kicked in.
    pub fn discount_clamped(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, TotalsWarning::NegativeAfterDiscount { .. }))
    }

    /// Amount the customer pays, rounded to fils.
    pub fn payable(&self) -> Money {
        self.total.round_currency()
    }
}

/// Stateless totals composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalsAggregator;

impl TotalsAggregator {
    /// Totals at the statutory UAE VAT rate.
    pub fn compute(
        cart: &CartStore,
        customer: Option<&Customer>,
        discount: &DiscountSpec,
    ) -> Totals {
        Self::compute_with(cart, customer, discount, TaxCalculator::uae())
    }

    pub fn compute_with(
        cart: &CartStore,
        customer: Option<&Customer>,
        discount: &DiscountSpec,
        tax: TaxCalculator,
    ) -> Totals {
        let mut warnings = Vec::new();

        for line in cart.lines() {
            if line.product.has_units() && !line.product.declares_unit(&line.unit) {
                warnings.push(TotalsWarning::UnrecognizedUnit {
                    product_id: line.product.id.clone(),
                    unit: line.unit.clone(),
                });
            }
        }

        let subtotal = cart.subtotal();
        let breakdown = DiscountEngine::compute(subtotal, customer, discount);

        let mut total_discount = breakdown.total_discount;
        if total_discount > subtotal {
            let applied = subtotal.non_negative();
            warn!(
                requested = %breakdown.total_discount,
                applied = %applied,
                "Stacked discounts exceed subtotal, clamping"
            );
            warnings.push(TotalsWarning::NegativeAfterDiscount {
                requested_discount: breakdown.total_discount,
                applied_discount: applied,
            });
            total_discount = applied;
        }

        let after_discount = (subtotal - total_discount).non_negative();
        let vat_amount = tax.vat(after_discount);

        Totals {
            subtotal,
            customer_discount: breakdown.customer_discount,
            custom_discount: breakdown.custom_discount,
            total_discount,
            after_discount,
            vat_amount,
            total: after_discount + vat_amount,
            warnings,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
