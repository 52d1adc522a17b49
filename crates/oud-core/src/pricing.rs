//! # Pricing Calculator
//!
//! Turns (product, quantity, unit) into a line price.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    price(product, quantity, unit)                       │
//! │                                                                         │
//! │   product.units empty?                                                  │
//! │        │                                                                │
//! │   yes ─┼──► product.price × quantity          (flat, per piece)        │
//! │        │                                                                │
//! │   no ──┴──► to_reference(unit, quantity)      (e.g. 2 tola → 23.32 ml) │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │             × product.base_price              (e.g. × 10 AED/ml)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rates are non-negative, so for a fixed unit the price never decreases as
//! the quantity grows.

use rust_decimal::Decimal;

use crate::money::Money;
use crate::types::Product;
use crate::units::UnitConversionService;

/// Stateless line pricing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingCalculator;

impl PricingCalculator {
    /// Price of `quantity` × `unit` of `product`, unrounded.
    ///
    /// Saturates at `Decimal::MAX` instead of overflowing; the cart only
    /// keeps lines that [`checked_price`](Self::checked_price) accepts.
    pub fn price(product: &Product, quantity: Decimal, unit: &str) -> Money {
        Self::checked_price(product, quantity, unit).unwrap_or(Money::new(Decimal::MAX))
    }

    /// Price of `quantity` × `unit` of `product`, `None` on overflow.
    pub fn checked_price(product: &Product, quantity: Decimal, unit: &str) -> Option<Money> {
        if !product.has_units() {
            return product.price.checked_multiply_quantity(quantity);
        }

        let reference_quantity =
            UnitConversionService::checked_to_reference(unit, quantity, product)?;
        product.reference_price().checked_multiply_quantity(reference_quantity)
    }

    /// Price of one `unit` of `product`.
    pub fn unit_price(product: &Product, unit: &str) -> Money {
        Self::price(product, Decimal::ONE, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;
    use crate::units::tola_rate;

    fn flat(price: Money) -> Product {
        Product {
            id: "flat-1".to_string(),
            sku: Some("BKH-100".to_string()),
            barcode: None,
            name: "Bakhoor Box".to_string(),
            name_ar: None,
            category: Some("Bakhoor".to_string()),
            brand: None,
            price,
            base_price: None,
            units: Vec::new(),
            stock_quantity: Decimal::from(20),
            is_weight_based: false,
        }
    }

    fn by_volume() -> Product {
        Product {
            id: "oil-1".to_string(),
            sku: None,
            barcode: None,
            name: "Dehn Al Oud".to_string(),
            name_ar: None,
            category: Some("Oils".to_string()),
            brand: None,
            price: Money::from_major(999),
            base_price: Some(Money::from_major(10)),
            units: vec![Unit::new("ml", Decimal::ONE), Unit::new("tola", tola_rate())],
            stock_quantity: Decimal::from(1000),
            is_weight_based: true,
        }
    }

    #[test]
    fn test_flat_pricing_ignores_unit() {
        let product = flat(Money::from_major(50));
        assert_eq!(
            PricingCalculator::price(&product, Decimal::TWO, "piece"),
            Money::from_major(100)
        );
        assert_eq!(
            PricingCalculator::price(&product, Decimal::TWO, "tola"),
            Money::from_major(100)
        );
    }

    #[test]
    fn test_two_tola_at_ten_per_ml() {
        let product = by_volume();
        let price = PricingCalculator::price(&product, Decimal::TWO, "tola");
        assert_eq!(price, Money::from_minor(23_320));
        assert_eq!(price.to_string(), "AED 233.20");
    }

    #[test]
    fn test_reference_unit_uses_base_price() {
        let product = by_volume();
        assert_eq!(
            PricingCalculator::price(&product, Decimal::new(25, 1), "ml"),
            Money::from_major(25)
        );
        assert_eq!(PricingCalculator::unit_price(&product, "ml"), Money::from_major(10));
    }

    #[test]
    fn test_price_is_monotonic_in_quantity() {
        let product = by_volume();
        let mut previous = Money::zero();
        for tenths in 0..50 {
            let price = PricingCalculator::price(&product, Decimal::new(tenths, 1), "tola");
            assert!(price >= previous);
            previous = price;
        }
    }

    #[test]
    fn test_huge_quantity_does_not_panic() {
        let mut product = flat(Money::from_major(10_000_000_000_000));
        let quantity = Decimal::from(100_000_000_000_000_000_i64);

        assert_eq!(PricingCalculator::checked_price(&product, quantity, "piece"), None);
        assert_eq!(
            PricingCalculator::price(&product, quantity, "piece"),
            Money::new(Decimal::MAX)
        );

        product = by_volume();
        assert_eq!(PricingCalculator::checked_price(&product, Decimal::MAX, "tola"), None);
    }
}
