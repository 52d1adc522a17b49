//! # Checkout Session
//!
//! Everything one terminal holds between two sales.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutSession                                                        │
//! │  ├── cart: CartStore             scan / add / quantity / unit / remove  │
//! │  ├── customer: Option<Customer>  tier discount, loyalty points          │
//! │  ├── discount: DiscountSpec      cashier's ad-hoc discount              │
//! │  ├── payment: PaymentDraft       method, tendered cash, delivery        │
//! │  └── notifier: CartNotifier      beeps and toasts, injected             │
//! │                                                                         │
//! │  totals() is recomputed from the snapshot on every call.               │
//! │  reset_after_commit() is the only way the whole session is cleared.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart mutations are synchronous. The session is owned by the caller and
//! lent to the submitter for the duration of one checkout.

use std::fmt;
use std::sync::Arc;

use oud_core::validation::{
    validate_amount_received, validate_discount, validate_lookup_code, validate_quantity,
};
use oud_core::{
    CartEvent, CartLine, CartNotifier, CartStore, Customer, DiscountSpec, Money, NoopNotifier,
    PaymentDetails, PaymentMethod, PaymentReconciler, Product, TaxCalculator, Totals,
    TotalsAggregator, ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::CheckoutResult;
use crate::receipt::DeliveryPreferences;

// =============================================================================
// Payment Draft
// =============================================================================

/// Payment as the cashier is filling it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub method: PaymentMethod,
    /// Tendered cash. Ignored for non-cash methods.
    pub amount_received: Option<Money>,
    pub delivery: DeliveryPreferences,
}

// =============================================================================
// Session
// =============================================================================

pub struct CheckoutSession {
    session_id: Uuid,
    cart: CartStore,
    customer: Option<Customer>,
    discount: DiscountSpec,
    payment: PaymentDraft,
    tax: TaxCalculator,
    notifier: Arc<dyn CartNotifier>,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        CheckoutSession::new()
    }
}

impl fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("session_id", &self.session_id)
            .field("lines", &self.cart.len())
            .field("customer", &self.customer.as_ref().map(|c| &c.id))
            .field("discount", &self.discount)
            .field("payment", &self.payment)
            .finish()
    }
}

impl CheckoutSession {
    /// Empty session with UAE VAT and no operator feedback.
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(NoopNotifier))
    }

    pub fn with_notifier(notifier: Arc<dyn CartNotifier>) -> Self {
        CheckoutSession {
            session_id: Uuid::new_v4(),
            cart: CartStore::new(),
            customer: None,
            discount: DiscountSpec::none(),
            payment: PaymentDraft::default(),
            tax: TaxCalculator::uae(),
            notifier,
        }
    }

    /// Overrides the VAT calculator.
    pub fn with_tax(mut self, tax: TaxCalculator) -> Self {
        self.tax = tax;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn discount(&self) -> &DiscountSpec {
        &self.discount
    }

    pub fn payment(&self) -> &PaymentDraft {
        &self.payment
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds one of the product matching `code` (barcode or SKU) in its
    /// default unit. A miss leaves the cart untouched.
    pub fn scan(&mut self, code: &str, catalog: &Catalog) -> CheckoutResult<usize> {
        validate_lookup_code(code)?;

        let product = match catalog.find_by_code(code) {
            Ok(product) => product.clone(),
            Err(err) => {
                debug!(code, "Scan missed");
                self.notify(CartEvent::ProductNotFound {
                    code: code.trim().to_string(),
                });
                return Err(err.into());
            }
        };

        self.add_product(&product, Decimal::ONE, None)
    }

    /// Adds `quantity` of `product`, merging into an existing line for the
    /// same unit. Returns the affected line index.
    ///
    /// An undeclared unit is priced at rate 1 (logged by the pricing engine).
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: Decimal,
        unit: Option<&str>,
    ) -> CheckoutResult<usize> {
        let unit = CartStore::effective_unit(product, unit);
        validate_quantity(quantity, &unit)?;

        let index = self
            .cart
            .add(product, quantity, Some(&unit))
            .ok_or_else(|| ValidationError::LineLimitExceeded {
                field: "quantity".to_string(),
            })?;

        debug!(product_id = %product.id, %unit, %quantity, index, "Item added");
        self.notify(CartEvent::ItemAdded {
            product_id: product.id.clone(),
            unit,
            quantity,
        });
        Ok(index)
    }

    /// Sets a line's quantity. Zero or less removes the line; an unknown
    /// index is ignored.
    pub fn update_quantity(&mut self, index: usize, quantity: Decimal) -> CheckoutResult<()> {
        let Some(line) = self.cart.get(index) else {
            debug!(index, "Quantity update for a missing line ignored");
            return Ok(());
        };

        if quantity <= Decimal::ZERO {
            self.remove_line(index);
            return Ok(());
        }

        validate_quantity(quantity, &line.unit)?;
        let product_id = line.product_id().to_string();

        if !self.cart.update_quantity(index, quantity) {
            return Err(ValidationError::LineLimitExceeded {
                field: "quantity".to_string(),
            }
            .into());
        }
        debug!(%product_id, %quantity, index, "Quantity changed");
        self.notify(CartEvent::QuantityChanged { product_id, quantity });
        Ok(())
    }

    /// Switches a line to `unit`. Returns the index of the resulting line,
    /// which differs from `index` when it merged into another line, or
    /// `None` when the line is missing or the switch was refused.
    pub fn change_unit(&mut self, index: usize, unit: &str) -> Option<usize> {
        let line = self.cart.get(index)?;
        let product_id = line.product_id().to_string();

        let target = self.cart.change_unit(index, unit)?;
        let unit = self.cart.get(target).map(|l| l.unit.clone()).unwrap_or_default();

        debug!(%product_id, %unit, from = index, to = target, "Unit changed");
        self.notify(CartEvent::UnitChanged { product_id, unit });
        Some(target)
    }

    pub fn remove_line(&mut self, index: usize) -> Option<CartLine> {
        if index >= self.cart.len() {
            return None;
        }
        let removed = self.cart.remove(index)?;

        debug!(product_id = %removed.product_id(), index, "Item removed");
        self.notify(CartEvent::ItemRemoved {
            product_id: removed.product_id().to_string(),
        });
        Some(removed)
    }

    /// Empties the cart. Customer, discount and payment are kept.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        debug!("Cart cleared");
        self.notify(CartEvent::CartCleared);
    }

    // =========================================================================
    // Customer & Discount
    // =========================================================================

    pub fn select_customer(&mut self, customer: Customer) {
        debug!(customer_id = %customer.id, tier = %customer.tier, "Customer selected");
        self.customer = Some(customer);
    }

    /// Selects the catalog customer with `id`.
    pub fn select_customer_by_id(&mut self, id: &str, catalog: &Catalog) -> CheckoutResult<()> {
        let customer = catalog.find_customer(id)?.clone();
        self.select_customer(customer);
        Ok(())
    }

    pub fn clear_customer(&mut self) {
        self.customer = None;
    }

    pub fn set_discount(&mut self, spec: DiscountSpec) -> CheckoutResult<()> {
        validate_discount(&spec)?;
        debug!(kind = ?spec.kind, value = %spec.value, "Discount set");
        self.discount = spec;
        Ok(())
    }

    pub fn clear_discount(&mut self) {
        self.discount = DiscountSpec::none();
    }

    // =========================================================================
    // Payment
    // =========================================================================

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment.method = method;
    }

    /// Records tendered cash. `None` clears the field.
    pub fn set_amount_received(&mut self, amount: Option<Money>) -> CheckoutResult<()> {
        if let Some(amount) = amount {
            validate_amount_received(amount)?;
        }
        self.payment.amount_received = amount;
        Ok(())
    }

    pub fn set_delivery(&mut self, delivery: DeliveryPreferences) {
        self.payment.delivery = delivery;
    }

    // =========================================================================
    // Totals & Lifecycle
    // =========================================================================

    /// Full-precision totals for the current snapshot.
    pub fn totals(&self) -> Totals {
        TotalsAggregator::compute_with(&self.cart, self.customer.as_ref(), &self.discount, self.tax)
    }

    /// Checks the draft payment against the payable total.
    pub fn reconcile_payment(&self) -> CheckoutResult<PaymentDetails> {
        let total = self.totals().payable();
        let details =
            PaymentReconciler::reconcile(self.payment.method, total, self.payment.amount_received)?;
        Ok(details)
    }

    /// Clears cart, customer, discount and payment after a committed sale.
    /// Starts a new session id.
    pub fn reset_after_commit(&mut self) {
        self.cart.clear();
        self.customer = None;
        self.discount = DiscountSpec::none();
        self.payment = PaymentDraft::default();
        self.session_id = Uuid::new_v4();
    }

    pub(crate) fn notify(&self, event: CartEvent) {
        self.notifier.notify(&event);
    }
}
