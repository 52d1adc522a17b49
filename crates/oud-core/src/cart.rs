//! # Cart Store
//!
//! The ordered line items of the sale being rung up.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          CartStore call          Line change           │
//! │  ───────────────          ──────────────          ───────────           │
//! │                                                                         │
//! │  Scan / tap product ────► add() ────────────────► merge or push        │
//! │                                                                         │
//! │  Edit quantity ─────────► update_quantity() ────► total re-priced      │
//! │                                                   (≤ 0 removes)        │
//! │                                                                         │
//! │  Pick other unit ───────► change_unit() ────────► unit + prices        │
//! │                                                                         │
//! │  Click Remove ──────────► remove() ─────────────► line dropped         │
//! │                                                                         │
//! │  Sale committed ────────► clear() ──────────────► empty                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per (product id, unit); adding the same pair again
//!   merges quantities.
//! - Line prices are always derived through [`PricingCalculator`].
//! - No line holds more than [`MAX_QUANTITY`] or totals more than
//!   [`MAX_AMOUNT`]. An operation that would break that is refused and the
//!   cart is left as it was.
//! - Operations never panic. An index past the end is a caller bug: it
//!   trips a `debug_assert!` in debug builds and is ignored in release.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::PricingCalculator;
use crate::types::Product;
use crate::units::PIECE;
use crate::validation::{MAX_AMOUNT, MAX_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One (product, unit) row of the cart.
///
/// ## Design Notes
/// - `product`: frozen copy of the catalog entry at the time it was added,
///   so a catalog refresh never reprices a line mid-sale
/// - `unit_price` / `total_price`: derived, never set by callers
/// - `discount`: always zero today, reserved for per-line discounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Product,

    pub unit: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub quantity: Decimal,

    pub unit_price: Money,

    pub total_price: Money,

    pub discount: Money,
}

impl CartLine {
    fn new(product: &Product, quantity: Decimal, unit: String) -> Option<Self> {
        let total_price = Self::checked_total(product, quantity, &unit)?;
        let unit_price = total_price
            .per_quantity(quantity)
            .unwrap_or_else(|| PricingCalculator::unit_price(product, &unit));

        Some(CartLine {
            product: product.clone(),
            unit,
            quantity,
            unit_price,
            total_price,
            discount: Money::zero(),
        })
    }

    /// Line total for `quantity` × `unit`, `None` past the line limits.
    fn checked_total(product: &Product, quantity: Decimal, unit: &str) -> Option<Money> {
        if quantity > Decimal::from(MAX_QUANTITY) {
            return None;
        }
        PricingCalculator::checked_price(product, quantity, unit)
            .filter(|total| total.amount() <= Decimal::from(MAX_AMOUNT))
    }

    /// Backend id of the product on this line.
    #[inline]
    pub fn product_id(&self) -> &str {
        &self.product.id
    }

    /// Whether this line holds `product_id` in `unit`.
    pub fn is_for(&self, product_id: &str, unit: &str) -> bool {
        self.product.id == product_id && self.unit == unit
    }

    /// Line amount after the per-line discount.
    pub fn net_total(&self) -> Money {
        self.total_price - self.discount
    }

    /// `total_price / quantity`.
    ///
    /// [`CartStore::update_quantity`] re-prices `total_price` but leaves
    /// `unit_price` as it was; anything that shows or stores a unit price
    /// should read this instead of the field.
    pub fn effective_unit_price(&self) -> Money {
        self.total_price
            .per_quantity(self.quantity)
            .unwrap_or(self.unit_price)
    }

    /// Sets the quantity and re-prices `total_price` only. Returns `false`,
    /// leaving the line untouched, when the new total is past the limits.
    fn set_quantity(&mut self, quantity: Decimal, unit: &str) -> bool {
        match Self::checked_total(&self.product, quantity, unit) {
            Some(total) => {
                self.quantity = quantity;
                self.unit = unit.to_string();
                self.total_price = total;
                true
            }
            None => {
                warn!(
                    product_id = %self.product.id,
                    %quantity,
                    unit = %unit,
                    kind = "LineLimitExceeded",
                    "Line change refused"
                );
                false
            }
        }
    }

    /// Like [`set_quantity`](Self::set_quantity), then re-derives `unit_price`.
    fn reprice_all(&mut self, quantity: Decimal, unit: &str) -> bool {
        if !self.set_quantity(quantity, unit) {
            return false;
        }
        self.unit_price = self.effective_unit_price();
        true
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// The cart of one terminal session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    /// Creates an empty cart.
    pub fn new() -> Self {
        CartStore::default()
    }

    /// The unit a line for `product` will actually use.
    ///
    /// Products without declared units are always sold by the piece,
    /// whatever the caller asked for.
    pub fn effective_unit(product: &Product, requested: Option<&str>) -> String {
        if !product.has_units() {
            return PIECE.to_string();
        }
        requested.unwrap_or_else(|| product.default_unit()).to_string()
    }

    /// Adds `quantity` of `product` in `unit` (or the product's default unit).
    ///
    /// Merges into an existing line for the same (product, unit) and
    /// re-prices it for the combined quantity; otherwise appends a line.
    /// Returns the index of the affected line, or `None` if `quantity` is not
    /// positive or the line would pass its limits (nothing is added).
    pub fn add(
        &mut self,
        product: &Product,
        quantity: Decimal,
        unit: Option<&str>,
    ) -> Option<usize> {
        if quantity <= Decimal::ZERO {
            return None;
        }

        let unit = Self::effective_unit(product, unit);

        if let Some(index) = self.position(&product.id, &unit) {
            let line = &mut self.lines[index];
            let merged = line.quantity.checked_add(quantity)?;
            return line.reprice_all(merged, &unit).then_some(index);
        }

        match CartLine::new(product, quantity, unit) {
            Some(line) => {
                self.lines.push(line);
                Some(self.lines.len() - 1)
            }
            None => {
                warn!(
                    product_id = %product.id,
                    %quantity,
                    kind = "LineLimitExceeded",
                    "Line refused"
                );
                None
            }
        }
    }

    /// Sets the quantity of the line at `index`.
    ///
    /// A quantity of zero or less removes the line. Otherwise only
    /// `total_price` is re-priced; see [`CartLine::effective_unit_price`].
    /// Returns `false` when the new quantity is refused for passing the line
    /// limits.
    pub fn update_quantity(&mut self, index: usize, quantity: Decimal) -> bool {
        self.check_index(index);

        if quantity <= Decimal::ZERO {
            self.remove(index);
            return true;
        }

        match self.lines.get_mut(index) {
            Some(line) => {
                let unit = line.unit.clone();
                line.set_quantity(quantity, &unit)
            }
            None => true,
        }
    }

    /// Switches the line at `index` to `new_unit`, keeping its quantity.
    ///
    /// Both prices are recomputed. If the cart already has a line for the
    /// same product in `new_unit`, the two are merged so the
    /// one-line-per-(product, unit) invariant holds. Returns the index of the
    /// resulting line, or `None` (cart unchanged) if that line would pass its
    /// limits.
    pub fn change_unit(&mut self, index: usize, new_unit: &str) -> Option<usize> {
        self.check_index(index);

        let line = self.lines.get(index)?;
        let unit = Self::effective_unit(&line.product, Some(new_unit));
        if unit == line.unit {
            return Some(index);
        }

        let product_id = line.product.id.clone();
        let moved_quantity = line.quantity;
        match self.position(&product_id, &unit) {
            Some(existing) => {
                let target = &mut self.lines[existing];
                let merged = target.quantity.checked_add(moved_quantity)?;
                if !target.reprice_all(merged, &unit) {
                    return None;
                }
                self.lines.remove(index);
                Some(if existing > index { existing - 1 } else { existing })
            }
            None => self.lines[index].reprice_all(moved_quantity, &unit).then_some(index),
        }
    }

    /// Removes the line at `index`.
    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        self.check_index(index);
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in the order they were added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&CartLine> {
        self.lines.get(index)
    }

    /// Number of distinct (product, unit) lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ (line total − line discount).
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::net_total).sum()
    }

    fn position(&self, product_id: &str, unit: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.is_for(product_id, unit))
    }

    #[inline]
    fn check_index(&self, index: usize) {
        debug_assert!(
            index < self.lines.len(),
            "cart index {} out of range (len {})",
            index,
            self.lines.len()
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;
    use crate::units::tola_rate;

    fn flat(id: &str, price: Money) -> Product {
        Product {
            id: id.to_string(),
            sku: Some(format!("SKU-{}", id)),
            barcode: None,
            name: format!("Product {}", id),
            name_ar: None,
            category: None,
            brand: None,
            price,
            base_price: None,
            units: Vec::new(),
            stock_quantity: Decimal::from(10),
            is_weight_based: false,
        }
    }

    fn oil(id: &str) -> Product {
        Product {
            units: vec![Unit::new("ml", Decimal::ONE), Unit::new("tola", tola_rate())],
            base_price: Some(Money::from_major(10)),
            is_weight_based: true,
            ..flat(id, Money::from_major(99))
        }
    }

    #[test]
    fn test_add_flat_product() {
        let mut cart = CartStore::new();
        let product = flat("1", Money::from_major(50));

        assert_eq!(cart.add(&product, Decimal::TWO, None), Some(0));

        let line = cart.get(0).unwrap();
        assert_eq!(line.unit, "piece");
        assert_eq!(line.unit_price, Money::from_major(50));
        assert_eq!(line.total_price, Money::from_major(100));
        assert!(line.discount.is_zero());
        assert_eq!(cart.subtotal(), Money::from_major(100));
    }

    #[test]
    fn test_flat_product_is_forced_to_piece() {
        let mut cart = CartStore::new();
        let product = flat("1", Money::from_major(50));

        cart.add(&product, Decimal::ONE, Some("tola"));
        cart.add(&product, Decimal::ONE, Some("ml"));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(0).unwrap().unit, "piece");
        assert_eq!(cart.get(0).unwrap().quantity, Decimal::TWO);
    }

    #[test]
    fn test_add_same_pair_merges() {
        let mut cart = CartStore::new();
        let product = oil("1");
        let (q1, q2) = (Decimal::new(15, 1), Decimal::new(5, 1));

        cart.add(&product, q1, Some("tola"));
        cart.add(&product, q2, Some("tola"));

        assert_eq!(cart.len(), 1);
        let line = cart.get(0).unwrap();
        assert_eq!(line.quantity, q1 + q2);
        assert_eq!(
            line.total_price,
            PricingCalculator::price(&product, q1 + q2, "tola")
        );
    }

    #[test]
    fn test_different_units_are_separate_lines() {
        let mut cart = CartStore::new();
        let product = oil("1");

        cart.add(&product, Decimal::ONE, Some("tola"));
        cart.add(&product, Decimal::from(3), Some("ml"));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.subtotal(), Money::from_minor(11_660) + Money::from_major(30));
    }

    #[test]
    fn test_default_unit_is_first_declared() {
        let mut cart = CartStore::new();
        cart.add(&oil("1"), Decimal::ONE, None);
        assert_eq!(cart.get(0).unwrap().unit, "ml");
    }

    #[test]
    fn test_non_positive_add_is_ignored() {
        let mut cart = CartStore::new();
        assert_eq!(cart.add(&oil("1"), Decimal::ZERO, None), None);
        assert_eq!(cart.add(&oil("1"), Decimal::NEGATIVE_ONE, None), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_oversized_add_is_refused_without_panic() {
        let mut cart = CartStore::new();
        let pricey = flat("1", Money::from_major(10_000_000_000_000));

        let huge = Decimal::from(100_000_000_000_000_000_i64);
        assert_eq!(cart.add(&pricey, huge, None), None);
        assert_eq!(cart.add(&oil("2"), Decimal::from(MAX_QUANTITY + 1), Some("ml")), None);
        assert!(cart.is_empty());

        let product = oil("3");
        cart.add(&product, Decimal::from(MAX_QUANTITY), Some("ml"));
        assert_eq!(cart.add(&product, Decimal::ONE, Some("ml")), None);
        assert_eq!(cart.get(0).unwrap().quantity, Decimal::from(MAX_QUANTITY));
    }

    #[test]
    fn test_oversized_update_leaves_line() {
        let mut cart = CartStore::new();
        cart.add(&flat("1", Money::from_major(50)), Decimal::TWO, None);

        assert!(!cart.update_quantity(0, Decimal::from(MAX_QUANTITY + 1)));

        let line = cart.get(0).unwrap();
        assert_eq!(line.quantity, Decimal::TWO);
        assert_eq!(line.total_price, Money::from_major(100));
    }

    #[test]
    fn test_subtotal_independent_of_order() {
        let a = flat("a", Money::from_minor(1_250));
        let b = oil("b");
        let c = flat("c", Money::from_minor(399));

        let mut forward = CartStore::new();
        forward.add(&a, Decimal::from(3), None);
        forward.add(&b, Decimal::new(7, 1), Some("tola"));
        forward.add(&c, Decimal::ONE, None);

        let mut backward = CartStore::new();
        backward.add(&c, Decimal::ONE, None);
        backward.add(&b, Decimal::new(7, 1), Some("tola"));
        backward.add(&a, Decimal::from(3), None);

        assert_eq!(forward.subtotal(), backward.subtotal());
        let expected: Money = forward.lines().iter().map(|l| l.total_price - l.discount).sum();
        assert_eq!(forward.subtotal(), expected);
    }

    #[test]
    fn test_update_quantity_reprices_total_only() {
        let mut cart = CartStore::new();
        let product = oil("1");
        cart.add(&product, Decimal::ONE, Some("ml"));
        let unit_price_before = cart.get(0).unwrap().unit_price;

        assert!(cart.update_quantity(0, Decimal::from(4)));

        let line = cart.get(0).unwrap();
        assert_eq!(line.total_price, Money::from_major(40));
        assert_eq!(line.unit_price, unit_price_before);
        assert_eq!(line.effective_unit_price(), Money::from_major(10));
    }

    #[test]
    fn test_update_quantity_to_zero_removes() {
        let mut cart = CartStore::new();
        cart.add(&flat("1", Money::from_major(5)), Decimal::ONE, None);
        cart.add(&flat("2", Money::from_major(6)), Decimal::ONE, None);

        cart.update_quantity(0, Decimal::ZERO);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(0).unwrap().product_id(), "2");
    }

    #[test]
    fn test_change_unit_reprices() {
        let mut cart = CartStore::new();
        let product = oil("1");
        cart.add(&product, Decimal::TWO, Some("ml"));

        assert_eq!(cart.change_unit(0, "tola"), Some(0));

        let line = cart.get(0).unwrap();
        assert_eq!(line.unit, "tola");
        assert_eq!(line.total_price, Money::from_minor(23_320));
        assert_eq!(line.unit_price, Money::from_minor(11_660));
    }

    #[test]
    fn test_change_unit_merges_into_existing_pair() {
        let mut cart = CartStore::new();
        let product = oil("1");
        cart.add(&product, Decimal::ONE, Some("tola"));
        cart.add(&flat("x", Money::from_major(1)), Decimal::ONE, None);
        cart.add(&product, Decimal::TWO, Some("ml"));

        let merged = cart.change_unit(2, "tola");

        assert_eq!(merged, Some(0));
        assert_eq!(cart.len(), 2);
        let line = cart.get(0).unwrap();
        assert_eq!(line.quantity, Decimal::from(3));
        assert_eq!(line.total_price, PricingCalculator::price(&product, Decimal::from(3), "tola"));
    }

    #[test]
    fn test_change_unit_refused_past_amount_limit() {
        let mut cart = CartStore::new();
        let product = Product {
            base_price: Some(Money::from_major(10_000_000)),
            ..oil("1")
        };
        cart.add(&product, Decimal::from(10_000), Some("ml"));

        // 10 000 tola is 116 600 ml, over MAX_AMOUNT at this price
        assert_eq!(cart.change_unit(0, "tola"), None);
        let line = cart.get(0).unwrap();
        assert_eq!(line.unit, "ml");
        assert_eq!(line.total_price, Money::from_major(100_000_000_000));
    }

    #[test]
    fn test_change_unit_on_flat_product_stays_piece() {
        let mut cart = CartStore::new();
        cart.add(&flat("1", Money::from_major(50)), Decimal::ONE, None);
        assert_eq!(cart.change_unit(0, "tola"), Some(0));
        assert_eq!(cart.get(0).unwrap().unit, "piece");
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = CartStore::new();
        cart.add(&flat("1", Money::from_major(5)), Decimal::ONE, None);
        cart.add(&flat("2", Money::from_major(6)), Decimal::ONE, None);

        let removed = cart.remove(1).unwrap();
        assert_eq!(removed.product_id(), "2");

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.subtotal().is_zero());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_index_asserts_in_debug() {
        let mut cart = CartStore::new();
        cart.remove(3);
    }
}
