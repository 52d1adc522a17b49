//! # Receipts
//!
//! The receipt written once per committed checkout, and where it is kept.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Transaction + StoreInfo + DeliveryPreferences                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Receipt { key: "receipt_<receiptNumber>", ... }                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ReceiptStore::put()                                                    │
//! │  ├── MemoryReceiptStore   tests, kiosk mode                            │
//! │  └── ReceiptRepository    SQLite (oud-db)                              │
//! │                                                                         │
//! │  Write-once: a second put() for the same key fails, the stored         │
//! │  receipt is kept.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Printing, email and SMS read receipts from the store; none of that
//! happens here.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oud_core::{Customer, CustomerTier, DiscountSpec, Money, PaymentDetails, Totals};
use oud_db::{receipt_key, ReceiptRecord, ReceiptRepository};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use ts_rs::TS;

use crate::config::StoreConfig;
use crate::error::ReceiptStoreError;
use crate::transaction::{LineRecord, Transaction};

// =============================================================================
// Receipt Parts
// =============================================================================

/// Store header printed on every receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    pub name: String,
    pub address_lines: Vec<String>,
    pub phone: Option<String>,
    pub tax_registration_number: Option<String>,
}

impl From<&StoreConfig> for StoreInfo {
    fn from(config: &StoreConfig) -> Self {
        StoreInfo {
            name: config.name.clone(),
            address_lines: config.address_lines.clone(),
            phone: config.phone.clone(),
            tax_registration_number: config.tax_registration_number.clone(),
        }
    }
}

/// How the customer wants the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPreferences {
    pub print: bool,
    pub email: Option<String>,
    pub sms: Option<String>,
}

impl Default for DeliveryPreferences {
    fn default() -> Self {
        DeliveryPreferences {
            print: true,
            email: None,
            sms: None,
        }
    }
}

/// Customer block of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptCustomer {
    pub id: String,
    pub name: String,
    pub name_ar: Option<String>,
    pub phone: Option<String>,
    pub tier: CustomerTier,

    #[ts(type = "number")]
    pub points_before: u64,

    #[ts(type = "number")]
    pub points_earned: u64,
}

impl ReceiptCustomer {
    fn new(customer: &Customer, points_earned: u64) -> Self {
        ReceiptCustomer {
            id: customer.id.clone(),
            name: customer.name.clone(),
            name_ar: customer.name_ar.clone(),
            phone: customer.phone.clone(),
            tier: customer.tier,
            points_before: customer.loyalty_points,
            points_earned,
        }
    }

    pub fn points_after(&self) -> u64 {
        self.points_before.saturating_add(self.points_earned)
    }
}

// =============================================================================
// Receipt
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// `receipt_<receiptNumber>`.
    pub key: String,
    pub transaction_id: String,
    pub receipt_number: String,

    #[ts(type = "string")]
    pub issued_at: DateTime<Utc>,

    pub store: StoreInfo,
    pub items: Vec<LineRecord>,
    pub customer: Option<ReceiptCustomer>,
    pub discount: DiscountSpec,
    /// Subtotal, both discounts, VAT and total, rounded.
    pub totals: Totals,
    pub payment: PaymentDetails,
    pub currency: String,
    pub delivery: DeliveryPreferences,
}

impl Receipt {
    pub fn from_transaction(
        transaction: &Transaction,
        store: &StoreInfo,
        delivery: &DeliveryPreferences,
    ) -> Self {
        Receipt {
            key: receipt_key(&transaction.receipt_number),
            transaction_id: transaction.id.clone(),
            receipt_number: transaction.receipt_number.clone(),
            issued_at: transaction.created_at,
            store: store.clone(),
            items: transaction.items.clone(),
            customer: transaction
                .customer
                .as_ref()
                .map(|c| ReceiptCustomer::new(c, transaction.loyalty_points_earned)),
            discount: transaction.discount,
            totals: transaction.totals.clone(),
            payment: transaction.payment,
            currency: transaction.currency.clone(),
            delivery: delivery.clone(),
        }
    }

    pub fn grand_total(&self) -> Money {
        self.totals.total
    }
}

// =============================================================================
// Receipt Store
// =============================================================================

/// Write-once receipt storage.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Stores `receipt` under its key. An existing key is
    /// [`ReceiptStoreError::Duplicate`].
    async fn put(&self, receipt: &Receipt) -> Result<(), ReceiptStoreError>;

    async fn get(&self, key: &str) -> Result<Option<Receipt>, ReceiptStoreError>;
}

/// In-process receipt store.
#[derive(Debug, Default)]
pub struct MemoryReceiptStore {
    receipts: RwLock<HashMap<String, Receipt>>,
}

impl MemoryReceiptStore {
    pub fn new() -> Self {
        MemoryReceiptStore::default()
    }

    pub async fn len(&self) -> usize {
        self.receipts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.receipts.read().await.is_empty()
    }
}

#[async_trait]
impl ReceiptStore for MemoryReceiptStore {
    async fn put(&self, receipt: &Receipt) -> Result<(), ReceiptStoreError> {
        let mut receipts = self.receipts.write().await;
        if receipts.contains_key(&receipt.key) {
            return Err(ReceiptStoreError::Duplicate(receipt.key.clone()));
        }
        receipts.insert(receipt.key.clone(), receipt.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Receipt>, ReceiptStoreError> {
        Ok(self.receipts.read().await.get(key).cloned())
    }
}

#[async_trait]
impl ReceiptStore for ReceiptRepository {
    async fn put(&self, receipt: &Receipt) -> Result<(), ReceiptStoreError> {
        let record = ReceiptRecord {
            key: receipt.key.clone(),
            transaction_id: receipt.transaction_id.clone(),
            receipt_number: receipt.receipt_number.clone(),
            grand_total: receipt.grand_total().round_currency(),
            payload: serde_json::to_value(receipt)?,
            created_at: receipt.issued_at,
        };
        self.insert(&record).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Receipt>, ReceiptStoreError> {
        match ReceiptRepository::get(self, key).await? {
            Some(record) => Ok(Some(serde_json::from_value(record.payload)?)),
            None => Ok(None),
        }
    }
}
