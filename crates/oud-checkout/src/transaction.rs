//! # Transaction Shaping
//!
//! Turns a session snapshot into the `POST /sales/transaction` body, and an
//! accepted submission into the immutable [`Transaction`].
//!
//! ```text
//! CheckoutSession ──capture──► PendingTransaction ──POST──► backend
//!                                │  request (wire body)          │
//!                                │  totals, customer, discount   │ { id, receiptNumber }
//!                                ▼                               ▼
//!                              Transaction::from_accepted(pending, accepted)
//! ```
//!
//! Every amount here is rounded to fils. Rounding happens once, while
//! capturing; nothing downstream does math on these figures.

use chrono::{DateTime, Utc};
use oud_core::{
    loyalty_points_earned, CartLine, Customer, DiscountSpec, Money, PaymentDetails, PaymentMethod,
    Totals,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::session::CheckoutSession;
use crate::wire::TransactionAccepted;

// =============================================================================
// Line Record
// =============================================================================

/// One sold line, as sent to the backend and printed on the receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub product_id: String,
    pub name: String,
    pub name_ar: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub unit: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub quantity: Decimal,

    /// `totalPrice / quantity`, never the stored field.
    pub unit_price: Money,
    pub total_price: Money,
    pub discount: Money,

    /// This line's share of the order VAT.
    pub vat_amount: Money,
}

impl LineRecord {
    /// Snapshot of `line`. `vat_share` is its unrounded share of order VAT.
    pub fn from_line(line: &CartLine, vat_share: Money) -> Self {
        let product = &line.product;
        LineRecord {
            product_id: product.id.clone(),
            name: product.name.clone(),
            name_ar: product.name_ar.clone(),
            sku: product.sku.clone(),
            barcode: product.barcode.clone(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            unit: line.unit.clone(),
            quantity: line.quantity,
            unit_price: line.effective_unit_price().round_currency(),
            total_price: line.total_price.round_currency(),
            discount: line.discount.round_currency(),
            vat_amount: vat_share.round_currency(),
        }
    }
}

/// Splits `totals.vat_amount` across lines in proportion to their net
/// amounts. Shares are unrounded and sum to the order VAT.
pub fn vat_shares(lines: &[CartLine], totals: &Totals) -> Vec<Money> {
    let subtotal = totals.subtotal.amount();
    lines
        .iter()
        .map(|line| {
            if subtotal.is_zero() {
                return Money::zero();
            }
            Money::new(totals.vat_amount.amount() * line.net_total().amount() / subtotal)
        })
        .collect()
}

// =============================================================================
// Request
// =============================================================================

/// Body of `POST /sales/transaction`.
///
/// ```json
/// {
///   "items": [...], "subtotal": 200.0, "totalVat": 8.0, "grandTotal": 168.0,
///   "currency": "AED", "paymentMethod": "cash",
///   "paymentDetails": { "method": "cash", "amountReceived": 200.0, "changeGiven": 32.0 },
///   "customerId": "c-7", "loyaltyPointsEarned": 16
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub items: Vec<LineRecord>,
    pub subtotal: Money,
    pub total_vat: Money,
    pub grand_total: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_details: PaymentDetails,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[ts(type = "number")]
    pub loyalty_points_earned: u64,
}

impl TransactionRequest {
    /// Request body for the session's current state and a reconciled payment.
    pub fn build(session: &CheckoutSession, payment: PaymentDetails) -> Self {
        PendingTransaction::capture(session, payment).request
    }
}

/// Everything captured at submit time: the wire body plus what the receipt
/// needs and the backend doesn't take.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub request: TransactionRequest,
    /// Rounded totals, including the discount breakdown.
    pub totals: Totals,
    pub discount: DiscountSpec,
    pub customer: Option<Customer>,
    pub session_id: String,
}

impl PendingTransaction {
    pub fn capture(session: &CheckoutSession, payment: PaymentDetails) -> Self {
        let totals = session.totals();
        let lines = session.cart().lines();

        let items = lines
            .iter()
            .zip(vat_shares(lines, &totals))
            .map(|(line, share)| LineRecord::from_line(line, share))
            .collect();

        let rounded = totals.rounded();
        let customer = session.customer().cloned();
        let grand_total = totals.payable();

        let request = TransactionRequest {
            items,
            subtotal: rounded.subtotal,
            total_vat: rounded.vat_amount,
            grand_total,
            currency: oud_core::money::CURRENCY.to_string(),
            payment_method: payment.method,
            payment_details: PaymentDetails {
                method: payment.method,
                amount_received: payment.amount_received.round_currency(),
                change_given: payment.change_given.round_currency(),
            },
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            loyalty_points_earned: loyalty_points_earned(grand_total, customer.is_some()),
        };

        PendingTransaction {
            request,
            totals: rounded,
            discount: *session.discount(),
            customer,
            session_id: session.session_id().to_string(),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed sale. Created once, after the backend accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub receipt_number: String,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,

    pub session_id: String,
    pub items: Vec<LineRecord>,
    pub totals: Totals,
    pub discount: DiscountSpec,
    pub payment: PaymentDetails,
    pub customer: Option<Customer>,

    #[ts(type = "number")]
    pub loyalty_points_earned: u64,

    pub currency: String,
}

impl Transaction {
    pub fn from_accepted(
        pending: PendingTransaction,
        accepted: TransactionAccepted,
        created_at: DateTime<Utc>,
    ) -> Self {
        let PendingTransaction {
            request,
            totals,
            discount,
            customer,
            session_id,
        } = pending;

        Transaction {
            id: accepted.id,
            receipt_number: accepted.receipt_number,
            created_at,
            session_id,
            items: request.items,
            totals,
            discount,
            payment: request.payment_details,
            customer,
            loyalty_points_earned: request.loyalty_points_earned,
            currency: request.currency,
        }
    }

    pub fn grand_total(&self) -> Money {
        self.totals.total
    }
}
