//! # Unit Conversion
//!
//! Converts quantities between the units a product declares.
//!
//! ## How Rates Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every declared unit has a rate INTO the reference unit (ml):           │
//! │                                                                         │
//! │    ml    rate 1        1 ml   = 1 ml                                    │
//! │    tola  rate 11.66    1 tola = 11.66 ml                                │
//! │                                                                         │
//! │  convert(from, to, q) = q × rate(from) / rate(to)                       │
//! │                                                                         │
//! │    convert("tola", "ml", 2)  = 2 × 11.66 / 1     = 23.32               │
//! │    convert("ml", "tola", 23.32) = 23.32 × 1 / 11.66 = 2                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lenient Fallback
//! A unit the product doesn't declare is treated as rate 1. That keeps the
//! till usable when the catalog is incomplete, but it can misprice a line,
//! so every fallback is logged as an `UnrecognizedUnit` warning.

use rust_decimal::Decimal;
use tracing::warn;

use crate::types::Product;

/// Synthetic unit for products sold by the piece.
pub const PIECE: &str = "piece";

/// The unit `base_price` is denominated in.
pub const REFERENCE_UNIT: &str = "ml";

/// Millilitres in one tola, the traditional oud-oil measure.
pub fn tola_rate() -> Decimal {
    Decimal::new(1166, 2)
}

/// Stateless conversion between a product's units.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitConversionService;

impl UnitConversionService {
    /// Returns the rate of `unit` on `product`, falling back to 1.
    ///
    /// The fallback is not an error: it is logged and priced as if the unit
    /// were the reference unit.
    pub fn rate_of(product: &Product, unit: &str) -> Decimal {
        match product.unit(unit) {
            Some(declared) => declared.rate,
            None => {
                // "piece" on a unit-less product is expected, not a fallback
                if product.has_units() || unit != PIECE {
                    warn!(
                        product_id = %product.id,
                        unit = %unit,
                        kind = "UnrecognizedUnit",
                        "Unit not declared on product, using rate 1"
                    );
                }
                Decimal::ONE
            }
        }
    }

    /// Converts `quantity` of `from_unit` into `to_unit`.
    ///
    /// Identical units return the quantity untouched. A zero target rate
    /// (bad catalog data) is treated like an undeclared unit.
    ///
    /// ```rust
    /// use oud_core::types::{Product, Unit};
    /// use oud_core::units::UnitConversionService;
    /// # use oud_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// # let product = Product {
    /// #     id: "p".into(), sku: None, barcode: None, name: "Oud".into(),
    /// #     name_ar: None, category: None, brand: None,
    /// #     price: Money::zero(), base_price: Some(Money::from_major(10)),
    /// #     units: vec![Unit::new("ml", Decimal::ONE), Unit::new("tola", Decimal::new(1166, 2))],
    /// #     stock_quantity: Decimal::ZERO, is_weight_based: true,
    /// # };
    /// let ml = UnitConversionService::convert("tola", "ml", Decimal::TWO, &product);
    /// assert_eq!(ml, Decimal::new(2332, 2));
    /// ```
    pub fn convert(
        from_unit: &str,
        to_unit: &str,
        quantity: Decimal,
        product: &Product,
    ) -> Decimal {
        Self::checked_convert(from_unit, to_unit, quantity, product).unwrap_or_else(|| {
            warn!(product_id = %product.id, %quantity, "Unit conversion overflowed, saturating");
            Decimal::MAX
        })
    }

    /// Like [`convert`](Self::convert), but `None` when the result does not
    /// fit in a `Decimal`.
    pub fn checked_convert(
        from_unit: &str,
        to_unit: &str,
        quantity: Decimal,
        product: &Product,
    ) -> Option<Decimal> {
        if from_unit == to_unit {
            return Some(quantity);
        }

        let from_rate = Self::rate_of(product, from_unit);
        let to_rate = Self::rate_of(product, to_unit);

        let in_reference = quantity.checked_mul(from_rate)?;
        if to_rate.is_zero() {
            warn!(
                product_id = %product.id,
                unit = %to_unit,
                kind = "UnrecognizedUnit",
                "Unit has zero rate, using rate 1"
            );
            return Some(in_reference);
        }
        in_reference.checked_div(to_rate)
    }

    /// Converts `quantity` of `unit` into the reference unit.
    pub fn to_reference(unit: &str, quantity: Decimal, product: &Product) -> Decimal {
        Self::convert(unit, REFERENCE_UNIT, quantity, product)
    }

    /// Checked form of [`to_reference`](Self::to_reference).
    pub fn checked_to_reference(
        unit: &str,
        quantity: Decimal,
        product: &Product,
    ) -> Option<Decimal> {
        Self::checked_convert(unit, REFERENCE_UNIT, quantity, product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Unit;

    fn product_with_units(units: Vec<Unit>) -> Product {
        Product {
            id: "oud-1".to_string(),
            sku: None,
            barcode: None,
            name: "Hindi Oud".to_string(),
            name_ar: None,
            category: None,
            brand: None,
            price: Money::zero(),
            base_price: Some(Money::from_major(10)),
            units,
            stock_quantity: Decimal::ZERO,
            is_weight_based: true,
        }
    }

    fn ml_gram_tola() -> Product {
        product_with_units(vec![
            Unit::new("ml", Decimal::ONE),
            Unit::new("gram", Decimal::new(125, 2)),
            Unit::new("tola", tola_rate()),
        ])
    }

    #[test]
    fn test_same_unit_is_identity() {
        let product = ml_gram_tola();
        for unit in ["ml", "gram", "tola", "undeclared"] {
            let q = Decimal::new(3_75, 2);
            assert_eq!(UnitConversionService::convert(unit, unit, q, &product), q);
        }
    }

    #[test]
    fn test_tola_to_ml() {
        let product = ml_gram_tola();
        let ml = UnitConversionService::convert("tola", "ml", Decimal::TWO, &product);
        assert_eq!(ml, Decimal::new(2332, 2));
    }

    #[test]
    fn test_round_trip_between_declared_units() {
        let product = ml_gram_tola();
        let pairs = [("tola", "ml"), ("ml", "tola"), ("gram", "tola"), ("tola", "gram")];
        for (a, b) in pairs {
            let q = Decimal::new(25, 1);
            let there = UnitConversionService::convert(a, b, q, &product);
            let back = UnitConversionService::convert(b, a, there, &product);
            assert_eq!(back.round_dp(20), q, "{a} -> {b} -> {a}");
        }
    }

    #[test]
    fn test_undeclared_unit_falls_back_to_rate_one() {
        let product = ml_gram_tola();
        assert_eq!(UnitConversionService::rate_of(&product, "ounce"), Decimal::ONE);
        let ml = UnitConversionService::convert("ounce", "ml", Decimal::from(4), &product);
        assert_eq!(ml, Decimal::from(4));
    }

    #[test]
    fn test_zero_rate_does_not_divide_by_zero() {
        let product = product_with_units(vec![
            Unit::new("ml", Decimal::ONE),
            Unit::new("broken", Decimal::ZERO),
        ]);
        let converted = UnitConversionService::convert("ml", "broken", Decimal::TEN, &product);
        assert_eq!(converted, Decimal::TEN);
    }

    #[test]
    fn test_to_reference() {
        let product = ml_gram_tola();
        let ml = UnitConversionService::to_reference("gram", Decimal::from(4), &product);
        assert_eq!(ml, Decimal::from(5));
    }

    #[test]
    fn test_overflowing_conversion() {
        let product = ml_gram_tola();
        let overflowed =
            UnitConversionService::checked_to_reference("tola", Decimal::MAX, &product);
        assert_eq!(overflowed, None);
        assert_eq!(
            UnitConversionService::to_reference("tola", Decimal::MAX, &product),
            Decimal::MAX
        );
    }
}
