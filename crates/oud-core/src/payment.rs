//! # Payment Reconciler
//!
//! Gates checkout on the tendered payment and works out change.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  method = cash                       method = card / mobile / bank      │
//! │  ─────────────                       ─────────────────────────────      │
//! │  received < total → InsufficientCash  authorised outside the engine,    │
//! │  received ≥ total → change =          always passes; received = total,  │
//! │                     received − total  change = 0                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The comparison uses the payable total, i.e. the total rounded to fils:
//! that is the figure on the screen the cashier collects against.

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentDetails, PaymentMethod};

/// Stateless payment checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentReconciler;

impl PaymentReconciler {
    /// Checks that `amount_received` covers `total` for cash payments.
    pub fn validate(method: PaymentMethod, total: Money, amount_received: Money) -> CoreResult<()> {
        if method.is_cash() && amount_received < total {
            return Err(CoreError::InsufficientCash {
                total,
                received: amount_received,
            });
        }
        Ok(())
    }

    /// `max(0, amount_received − total)`.
    pub fn change(total: Money, amount_received: Money) -> Money {
        (amount_received - total).non_negative()
    }

    /// Validates and builds the payment record.
    ///
    /// `total` is the payable (rounded) total. Non-cash methods record the
    /// total as received whatever was typed in the tender field.
    ///
    /// ```rust
    /// use oud_core::money::Money;
    /// use oud_core::payment::PaymentReconciler;
    /// use oud_core::types::PaymentMethod;
    ///
    /// let total = Money::from_major(105);
    /// let paid = PaymentReconciler::reconcile(PaymentMethod::Cash, total, Some(Money::from_major(150))).unwrap();
    /// assert_eq!(paid.change_given, Money::from_major(45));
    ///
    /// let short = PaymentReconciler::reconcile(PaymentMethod::Cash, total, Some(Money::from_major(100)));
    /// assert!(short.is_err());
    /// ```
    pub fn reconcile(
        method: PaymentMethod,
        total: Money,
        amount_received: Option<Money>,
    ) -> CoreResult<PaymentDetails> {
        let amount_received = match method {
            PaymentMethod::Cash => amount_received.unwrap_or_default(),
            _ => total,
        };

        Self::validate(method, total, amount_received)?;

        let change_given = Self::change(total, amount_received);
        debug!(%method, %total, %amount_received, %change_given, "Payment reconciled");

        Ok(PaymentDetails {
            method,
            amount_received,
            change_given,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_short_is_rejected() {
        let err = PaymentReconciler::validate(
            PaymentMethod::Cash,
            Money::from_major(105),
            Money::from_major(100),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientCash { total, received }
                if total == Money::from_major(105) && received == Money::from_major(100)
        ));
    }

    #[test]
    fn test_cash_with_change() {
        let details = PaymentReconciler::reconcile(
            PaymentMethod::Cash,
            Money::from_major(105),
            Some(Money::from_major(150)),
        )
        .unwrap();

        assert_eq!(details.amount_received, Money::from_major(150));
        assert_eq!(details.change_given, Money::from_major(45));
    }

    #[test]
    fn test_exact_cash_gives_no_change() {
        let total = Money::from_minor(16_800);
        let details =
            PaymentReconciler::reconcile(PaymentMethod::Cash, total, Some(total)).unwrap();
        assert!(details.change_given.is_zero());
    }

    #[test]
    fn test_cash_without_tender_is_rejected() {
        let result = PaymentReconciler::reconcile(PaymentMethod::Cash, Money::from_major(1), None);
        assert!(matches!(result, Err(CoreError::InsufficientCash { .. })));
    }

    #[test]
    fn test_cash_for_zero_total_passes() {
        let details =
            PaymentReconciler::reconcile(PaymentMethod::Cash, Money::zero(), None).unwrap();
        assert!(details.change_given.is_zero());
    }

    #[test]
    fn test_non_cash_methods_always_pass() {
        for method in [PaymentMethod::Card, PaymentMethod::Mobile, PaymentMethod::Bank] {
            let details =
                PaymentReconciler::reconcile(method, Money::from_major(105), Some(Money::zero()))
                    .unwrap();
            assert_eq!(details.amount_received, Money::from_major(105));
            assert!(details.change_given.is_zero());
        }
    }

    #[test]
    fn test_change_never_negative() {
        assert!(PaymentReconciler::change(Money::from_major(10), Money::from_major(5)).is_zero());
        assert_eq!(
            PaymentReconciler::change(Money::from_major(10), Money::from_major(25)),
            Money::from_major(15)
        );
    }
}
