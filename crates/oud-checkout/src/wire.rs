//! # Wire Compatibility Shim
//!
//! The sales backend has served products and customers in several shapes
//! over time. This module is the only place that knows about them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /products                                                          │
//! │  { "products": [ {...}, {...} ] }   or   [ {...}, {...} ]               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ProductRecord  (camelCase + snake_case aliases, numbers or strings,    │
//! │        │         every field optional)                                  │
//! │        ▼                                                                │
//! │  into_product() ──► Ok(Product)      closed engine type                 │
//! │                 └─► Err(WireError)   record skipped, warning logged     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::str::FromStr;

use oud_core::{Customer, CustomerTier, Money, Product, Unit};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::error::{BackendError, BackendResult};

/// Why a single record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("missing field {0}")]
    Missing(&'static str),

    #[error("field {field} is not a valid number: {value}")]
    BadNumber { field: &'static str, value: String },

    #[error("field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("malformed record: {0}")]
    Malformed(String),
}

// =============================================================================
// Loose scalars
// =============================================================================

/// Reads a decimal from a JSON number or numeric string.
///
/// Numbers go through their textual form so `0.1` stays exactly `0.1`.
fn decimal_from(value: &Value, field: &'static str) -> Result<Option<Decimal>, WireError> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(WireError::BadNumber {
                field,
                value: other.to_string(),
            })
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|_| WireError::BadNumber { field, value: text })
}

/// Reads an identifier from a JSON string or number.
fn id_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_from(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    #[serde(default, alias = "unit", alias = "unitName")]
    pub name: Option<String>,

    #[serde(default, alias = "conversionRate", alias = "factor")]
    pub rate: Value,
}

/// A product as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default, alias = "_id", alias = "productId")]
    pub id: Value,

    #[serde(default)]
    pub sku: Option<String>,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default, alias = "nameEn", alias = "name_en")]
    pub name: Option<String>,

    #[serde(default, alias = "name_ar", alias = "arabicName")]
    pub name_ar: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default, alias = "sellingPrice")]
    pub price: Value,

    #[serde(default, alias = "base_price", alias = "pricePerMl")]
    pub base_price: Value,

    #[serde(default)]
    pub units: Option<Vec<UnitRecord>>,

    #[serde(default, alias = "stock_quantity", alias = "stock")]
    pub stock_quantity: Value,

    #[serde(default, alias = "is_weight_based")]
    pub is_weight_based: Option<bool>,
}

impl ProductRecord {
    /// Converts into a closed [`Product`].
    ///
    /// ## Rules
    /// - `id` and `name` are required
    /// - `price` falls back to `basePrice`; at least one must be present
    ///   and neither may be negative
    /// - units without a name or with a non-positive rate are dropped
    /// - missing stock is zero
    pub fn into_product(self) -> Result<Product, WireError> {
        let id = id_from(&self.id).ok_or(WireError::Missing("id"))?;
        let name = text_from(self.name).ok_or(WireError::Missing("name"))?;

        let price = decimal_from(&self.price, "price")?;
        let base_price = decimal_from(&self.base_price, "basePrice")?;
        let price = price.or(base_price).ok_or(WireError::Missing("price"))?;

        for (field, value) in [("price", Some(price)), ("basePrice", base_price)] {
            if let Some(v) = value.filter(|v| *v < Decimal::ZERO) {
                return Err(WireError::OutOfRange {
                    field,
                    value: v.to_string(),
                });
            }
        }

        let mut units = Vec::new();
        for record in self.units.unwrap_or_default() {
            let Some(unit_name) = text_from(record.name) else {
                warn!(product_id = %id, "Dropping unnamed unit");
                continue;
            };
            match decimal_from(&record.rate, "rate") {
                Ok(Some(rate)) if rate > Decimal::ZERO => units.push(Unit::new(unit_name, rate)),
                _ => warn!(product_id = %id, unit = %unit_name, "Dropping unit with invalid rate"),
            }
        }

        let stock_quantity = decimal_from(&self.stock_quantity, "stockQuantity")?
            .unwrap_or_default();

        Ok(Product {
            id,
            sku: text_from(self.sku),
            barcode: text_from(self.barcode),
            name,
            name_ar: text_from(self.name_ar),
            category: text_from(self.category),
            brand: text_from(self.brand),
            price: Money::new(price),
            base_price: base_price.map(Money::new),
            units,
            stock_quantity,
            is_weight_based: self.is_weight_based.unwrap_or(false),
        })
    }
}

// =============================================================================
// Customers
// =============================================================================

/// A customer as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    #[serde(default, alias = "_id", alias = "customerId")]
    pub id: Value,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, alias = "name_ar", alias = "arabicName")]
    pub name_ar: Option<String>,

    #[serde(default, alias = "mobile")]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, rename = "type", alias = "tier", alias = "customerType")]
    pub tier: Option<String>,

    #[serde(default, alias = "discount_rate")]
    pub discount_rate: Value,

    #[serde(default, alias = "loyalty_points", alias = "points")]
    pub loyalty_points: Value,
}

/// Parses a tier name in any case. Unknown or missing tiers are Regular.
pub fn parse_tier(raw: Option<&str>) -> CustomerTier {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("vip") => CustomerTier::Vip,
        Some("premium") => CustomerTier::Premium,
        Some("regular") | Some("") | None => CustomerTier::Regular,
        Some(other) => {
            warn!(tier = %other, "Unknown customer tier, treating as Regular");
            CustomerTier::Regular
        }
    }
}

impl CustomerRecord {
    /// Converts into a closed [`Customer`].
    ///
    /// A missing `discountRate` takes the tier default. A rate outside
    /// 0..=100 rejects the record.
    pub fn into_customer(self) -> Result<Customer, WireError> {
        use rust_decimal::prelude::ToPrimitive;

        let id = id_from(&self.id).ok_or(WireError::Missing("id"))?;
        let name = text_from(self.name).ok_or(WireError::Missing("name"))?;
        let tier = parse_tier(self.tier.as_deref());

        let discount_rate = decimal_from(&self.discount_rate, "discountRate")?
            .unwrap_or_else(|| tier.default_discount_rate());
        if discount_rate < Decimal::ZERO || discount_rate > Decimal::ONE_HUNDRED {
            return Err(WireError::OutOfRange {
                field: "discountRate",
                value: discount_rate.to_string(),
            });
        }

        let loyalty_points = decimal_from(&self.loyalty_points, "loyaltyPoints")?
            .map(|p| p.floor().max(Decimal::ZERO).to_u64().unwrap_or(0))
            .unwrap_or(0);

        Ok(Customer {
            id,
            name,
            name_ar: text_from(self.name_ar),
            phone: text_from(self.phone),
            email: text_from(self.email),
            tier,
            discount_rate,
            loyalty_points,
        })
    }
}

// =============================================================================
// Envelopes
// =============================================================================

/// Pulls the record array out of `{ "<key>": [...] }` or a bare array.
fn records(body: Value, key: &str) -> BackendResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(BackendError::Decode(format!(
                "`{}` is not an array: {}",
                key, other
            ))),
        },
        other => Err(BackendError::Decode(format!(
            "expected an object with `{}`, got {}",
            key, other
        ))),
    }
}

/// Decodes a `GET /products` body, skipping records that don't convert.
pub fn decode_products(body: Value) -> BackendResult<Vec<Product>> {
    let items = records(body, "products")?;
    let total = items.len();

    let products: Vec<Product> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let converted = serde_json::from_value::<ProductRecord>(item)
                .map_err(|e| WireError::Malformed(e.to_string()))
                .and_then(ProductRecord::into_product);
            match converted {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(index, error = %e, "Skipping invalid product record");
                    None
                }
            }
        })
        .collect();

    if products.len() < total {
        warn!(kept = products.len(), total, "Some product records were skipped");
    }
    Ok(products)
}

/// Decodes a `GET /customers` body, skipping records that don't convert.
pub fn decode_customers(body: Value) -> BackendResult<Vec<Customer>> {
    let items = records(body, "customers")?;

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let converted = serde_json::from_value::<CustomerRecord>(item)
                .map_err(|e| WireError::Malformed(e.to_string()))
                .and_then(CustomerRecord::into_customer);
            match converted {
                Ok(customer) => Some(customer),
                Err(e) => {
                    warn!(index, error = %e, "Skipping invalid customer record");
                    None
                }
            }
        })
        .collect())
}

/// `POST /sales/transaction` acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionAccepted {
    pub id: String,
    pub receipt_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptedRecord {
    #[serde(default, alias = "_id", alias = "transactionId")]
    id: Value,

    #[serde(default, alias = "receipt_number", alias = "receiptId")]
    receipt_number: Value,
}

/// Decodes the acceptance body. Both fields are required.
pub fn decode_accepted(body: Value) -> BackendResult<TransactionAccepted> {
    let record: AcceptedRecord = serde_json::from_value(body)?;

    let id = id_from(&record.id)
        .ok_or_else(|| BackendError::Decode("acceptance without `id`".into()))?;
    let receipt_number = id_from(&record.receipt_number)
        .ok_or_else(|| BackendError::Decode("acceptance without `receiptNumber`".into()))?;

    Ok(TransactionAccepted { id, receipt_number })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_camel_and_snake_shapes() {
        let products = decode_products(json!({
            "products": [
                {
                    "id": "p-1", "name": "Cambodi Oud", "nameAr": "عود كمبودي",
                    "price": 120, "basePrice": "10.00",
                    "units": [{ "name": "ml", "rate": 1 }, { "name": "tola", "rate": 11.66 }],
                    "stockQuantity": 500, "isWeightBased": true
                },
                {
                    "_id": 42, "name_en": "Musk Soap", "price": "12.5",
                    "stock": 3, "is_weight_based": false
                }
            ]
        }))
        .unwrap();

        assert_eq!(products.len(), 2);

        let oud = &products[0];
        assert_eq!(oud.base_price, Some(Money::from_major(10)));
        assert_eq!(oud.units[1].rate, Decimal::new(1166, 2));
        assert!(oud.is_weight_based);

        let soap = &products[1];
        assert_eq!(soap.id, "42");
        assert_eq!(soap.price, Money::from_minor(1_250));
        assert!(soap.units.is_empty());
        assert_eq!(soap.stock_quantity, Decimal::from(3));
    }

    #[test]
    fn test_invalid_products_are_skipped() {
        let products = decode_products(json!([
            { "id": "ok", "name": "Bakhoor", "price": 30 },
            { "name": "No id", "price": 1 },
            { "id": "no-price", "name": "Free?" },
            { "id": "neg", "name": "Refund", "price": -5 },
            "not even an object"
        ]))
        .unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "ok");
    }

    #[test]
    fn test_price_falls_back_to_base_price() {
        let product = ProductRecord {
            id: json!("p"),
            name: Some("Oil".into()),
            base_price: json!(7),
            ..Default::default()
        }
        .into_product()
        .unwrap();
        assert_eq!(product.price, Money::from_major(7));
    }

    #[test]
    fn test_bad_units_are_dropped() {
        let product: ProductRecord = serde_json::from_value(json!({
            "id": "p", "name": "Oil", "price": 1,
            "units": [{ "name": "ml", "rate": 1 }, { "name": "drop", "rate": 0 }, { "rate": 3 }]
        }))
        .unwrap();
        let product = product.into_product().unwrap();
        assert_eq!(product.units.len(), 1);
    }

    #[test]
    fn test_customer_tier_any_case_and_default_rate() {
        let customers = decode_customers(json!({
            "customers": [
                { "id": "c1", "name": "Aisha", "type": "vip", "loyaltyPoints": 250 },
                { "id": "c2", "name": "Omar", "tier": "PREMIUM", "discount_rate": 7.5 },
                { "id": "c3", "name": "Sara" }
            ]
        }))
        .unwrap();

        assert_eq!(customers[0].tier, CustomerTier::Vip);
        assert_eq!(customers[0].discount_rate, Decimal::TEN);
        assert_eq!(customers[0].loyalty_points, 250);

        assert_eq!(customers[1].tier, CustomerTier::Premium);
        assert_eq!(customers[1].discount_rate, Decimal::new(75, 1));

        assert_eq!(customers[2].tier, CustomerTier::Regular);
        assert_eq!(customers[2].discount_rate, Decimal::ZERO);
    }

    #[test]
    fn test_customer_rate_out_of_range_is_skipped() {
        let customers = decode_customers(json!([
            { "id": "c1", "name": "Greedy", "discountRate": 150 }
        ]))
        .unwrap();
        assert!(customers.is_empty());
    }

    #[test]
    fn test_missing_envelope_key_is_empty() {
        assert!(decode_products(json!({})).unwrap().is_empty());
        assert!(decode_products(json!("nope")).is_err());
    }

    #[test]
    fn test_decode_accepted() {
        let accepted = decode_accepted(json!({ "id": 9001, "receiptNumber": "R-000123" })).unwrap();
        assert_eq!(accepted.id, "9001");
        assert_eq!(accepted.receipt_number, "R-000123");

        assert!(decode_accepted(json!({ "id": "t-1" })).is_err());
    }
}
