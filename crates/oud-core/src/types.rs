//! # Domain Types
//!
//! Closed domain types for the checkout engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │  DiscountSpec   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  kind           │       │
//! │  │  price          │   │  tier           │   │  value          │       │
//! │  │  base_price     │   │  discount_rate  │   └─────────────────┘       │
//! │  │  units[]  ──────┼─► │  loyalty_points │                             │
//! │  └─────────────────┘   └─────────────────┘   ┌─────────────────┐       │
//! │          │                                   │ PaymentDetails  │       │
//! │          ▼                                   │  ─────────────  │       │
//! │  ┌─────────────────┐                         │  method         │       │
//! │  │  Unit           │                         │  amount_received│       │
//! │  │  name ("tola")  │                         │  change_given   │       │
//! │  │  rate (11.66)   │                         └─────────────────┘       │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products and customers are read-only to the engine. They arrive from the
//! sales backend through a loose wire format; only the checkout crate's
//! compatibility shim knows about that format, everything here is strict.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::units::PIECE;

// =============================================================================
// Unit
// =============================================================================

/// A sellable unit declared on a product.
///
/// `rate` converts one of this unit into the product's reference unit
/// (millilitres): `{ name: "tola", rate: 11.66 }` means 1 tola = 11.66 ml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Unit {
    pub name: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub rate: Decimal,
}

impl Unit {
    pub fn new(name: impl Into<String>, rate: Decimal) -> Self {
        Unit {
            name: name.into(),
            rate,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend identifier.
    pub id: String,

    /// Stock Keeping Unit.
    pub sku: Option<String>,

    /// Barcode (EAN-13 etc.).
    pub barcode: Option<String>,

    /// English display name.
    pub name: String,

    /// Arabic display name.
    pub name_ar: Option<String>,

    pub category: Option<String>,

    pub brand: Option<String>,

    /// Flat per-piece price, used when the product declares no units.
    pub price: Money,

    /// Price per reference unit (ml). Falls back to `price` when absent.
    pub base_price: Option<Money>,

    /// Declared units. Empty means the product is sold by the piece.
    #[serde(default)]
    pub units: Vec<Unit>,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub stock_quantity: Decimal,

    /// Sold by weight/volume rather than by the piece.
    pub is_weight_based: bool,
}

impl Product {
    /// Whether the product declares any units.
    #[inline]
    pub fn has_units(&self) -> bool {
        !self.units.is_empty()
    }

    /// Returns the declared unit with this name.
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Whether `name` is one of the declared units.
    pub fn declares_unit(&self, name: &str) -> bool {
        self.unit(name).is_some()
    }

    /// The unit a line uses when the caller doesn't pick one: the first
    /// declared unit, or `"piece"`.
    pub fn default_unit(&self) -> &str {
        self.units.first().map(|u| u.name.as_str()).unwrap_or(PIECE)
    }

    /// Price per reference unit.
    pub fn reference_price(&self) -> Money {
        self.base_price.unwrap_or(self.price)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer tier. Each tier carries a standard order discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CustomerTier {
    #[default]
    Regular,
    Premium,
    #[serde(rename = "VIP")]
    Vip,
}

impl CustomerTier {
    /// Standard discount percentage for this tier (0 / 5 / 10).
    pub fn default_discount_rate(&self) -> Decimal {
        match self {
            CustomerTier::Regular => Decimal::ZERO,
            CustomerTier::Premium => Decimal::from(5),
            CustomerTier::Vip => Decimal::TEN,
        }
    }
}

impl std::fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomerTier::Regular => write!(f, "Regular"),
            CustomerTier::Premium => write!(f, "Premium"),
            CustomerTier::Vip => write!(f, "VIP"),
        }
    }
}

/// A customer that can be attached to a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub name_ar: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    #[serde(rename = "type")]
    pub tier: CustomerTier,

    /// Order discount percentage, 0..=100.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub discount_rate: Decimal,

    #[ts(type = "number")]
    pub loyalty_points: u64,
}

// =============================================================================
// Discount Spec
// =============================================================================

/// How the ad-hoc order discount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    #[default]
    None,
    /// `value` is a percentage of the subtotal.
    Percentage,
    /// `value` is an absolute AED amount.
    Fixed,
}

/// Ad-hoc order discount entered by the cashier.
///
/// Independent of, and added to, the customer's tier discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountSpec {
    #[serde(rename = "type")]
    pub kind: DiscountKind,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub value: Decimal,
}

impl DiscountSpec {
    pub fn none() -> Self {
        DiscountSpec::default()
    }

    pub fn percentage(percent: Decimal) -> Self {
        DiscountSpec {
            kind: DiscountKind::Percentage,
            value: percent,
        }
    }

    pub fn fixed(amount: Money) -> Self {
        DiscountSpec {
            kind: DiscountKind::Fixed,
            value: amount.amount(),
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.kind == DiscountKind::None
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    /// Card on an external terminal, authorised outside the engine.
    Card,
    /// Mobile wallet, authorised outside the engine.
    Mobile,
    /// Bank transfer, confirmed outside the engine.
    Bank,
}

impl PaymentMethod {
    /// Only cash is reconciled against the total at the till.
    #[inline]
    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
            PaymentMethod::Bank => "bank",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reconciled payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub amount_received: Money,
    pub change_given: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
