//! # Receipt Repository
//!
//! Write-once storage for committed receipts.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backend accepted { id, receiptNumber }                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReceiptRecord { key: "receipt_<receiptNumber>", payload: <JSON> }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO receipts ...                                              │
//! │       │                                                                 │
//! │       ├── new key      → stored                                        │
//! │       └── existing key → DbError::UniqueViolation, row untouched        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The payload is opaque to this crate. Whoever renders the receipt owns
//! its shape.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use oud_core::Money;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Prefix of every receipt key.
pub const RECEIPT_KEY_PREFIX: &str = "receipt_";

/// Storage key for a receipt number: `receipt_<receiptNumber>`.
///
/// ```rust
/// assert_eq!(oud_db::receipt_key("R-000042"), "receipt_R-000042");
/// ```
pub fn receipt_key(receipt_number: &str) -> String {
    format!("{}{}", RECEIPT_KEY_PREFIX, receipt_number)
}

/// A stored receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptRecord {
    pub key: String,
    pub transaction_id: String,
    pub receipt_number: String,
    /// Rounded grand total, kept outside the payload for listing.
    pub grand_total: Money,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ReceiptRecord {
    /// Builds a record with the key derived from `receipt_number`.
    pub fn new(
        transaction_id: impl Into<String>,
        receipt_number: impl Into<String>,
        grand_total: Money,
        payload: serde_json::Value,
    ) -> Self {
        let receipt_number = receipt_number.into();
        ReceiptRecord {
            key: receipt_key(&receipt_number),
            transaction_id: transaction_id.into(),
            receipt_number,
            grand_total: grand_total.round_currency(),
            payload,
            created_at: Utc::now(),
        }
    }

    fn from_row(row: &SqliteRow) -> DbResult<Self> {
        let grand_total: String = row.try_get("grand_total")?;
        let grand_total = Decimal::from_str(&grand_total)
            .map_err(|e| DbError::Serialization(format!("grand_total '{}': {}", grand_total, e)))?;
        let payload: String = row.try_get("payload")?;

        Ok(ReceiptRecord {
            key: row.try_get("key")?,
            transaction_id: row.try_get("transaction_id")?,
            receipt_number: row.try_get("receipt_number")?,
            grand_total: Money::new(grand_total),
            payload: serde_json::from_str(&payload)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Repository for receipt rows.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// Stores a receipt. A key that already exists is rejected with
    /// [`DbError::UniqueViolation`] and the stored row is left as it was.
    pub async fn insert(&self, record: &ReceiptRecord) -> DbResult<()> {
        debug!(key = %record.key, transaction_id = %record.transaction_id, "Storing receipt");

        let payload = serde_json::to_string(&record.payload)?;

        sqlx::query(
            r#"
            INSERT INTO receipts (
                key, transaction_id, receipt_number, grand_total, payload, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.key)
        .bind(&record.transaction_id)
        .bind(&record.receipt_number)
        .bind(record.grand_total.amount().to_string())
        .bind(payload)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, record.key.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Looks a receipt up by key.
    pub async fn get(&self, key: &str) -> DbResult<Option<ReceiptRecord>> {
        let row = sqlx::query(
            r#"
            SELECT key, transaction_id, receipt_number, grand_total, payload, created_at
            FROM receipts
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(ReceiptRecord::from_row).transpose()
    }

    /// Like [`get`](Self::get) but a missing key is an error.
    pub async fn get_required(&self, key: &str) -> DbResult<ReceiptRecord> {
        self.get(key)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", key))
    }

    /// Looks a receipt up by the backend-issued receipt number.
    pub async fn get_by_receipt_number(&self, receipt_number: &str) -> DbResult<Option<ReceiptRecord>> {
        self.get(&receipt_key(receipt_number)).await
    }

    pub async fn exists(&self, key: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts WHERE key = ?1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Most recent receipts first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<ReceiptRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT key, transaction_id, receipt_number, grand_total, payload, created_at
            FROM receipts
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(ReceiptRecord::from_row).collect()
    }

    pub async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use serde_json::json;

    async fn repo() -> ReceiptRepository {
        Database::in_memory().await.unwrap().receipts()
    }

    fn record(number: &str) -> ReceiptRecord {
        ReceiptRecord::new(
            format!("txn-{}", number),
            number,
            Money::from_minor(16_800),
            json!({ "receiptNumber": number, "items": [] }),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let stored = record("R-0001");
        repo.insert(&stored).await.unwrap();

        let loaded = repo.get("receipt_R-0001").await.unwrap().unwrap();
        assert_eq!(loaded.transaction_id, "txn-R-0001");
        assert_eq!(loaded.grand_total, Money::from_minor(16_800));
        assert_eq!(loaded.payload["receiptNumber"], "R-0001");
        assert_eq!(loaded.created_at.timestamp(), stored.created_at.timestamp());

        let by_number = repo.get_by_receipt_number("R-0001").await.unwrap();
        assert_eq!(by_number.map(|r| r.key), Some("receipt_R-0001".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_key_is_rejected() {
        let repo = repo().await;
        repo.insert(&record("R-0001")).await.unwrap();

        let mut again = record("R-0001");
        again.transaction_id = "txn-other".to_string();
        let err = repo.insert(&again).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::UniqueViolation { ref value, .. } if value == "receipt_R-0001"
        ));
        let kept = repo.get_required("receipt_R-0001").await.unwrap();
        assert_eq!(kept.transaction_id, "txn-R-0001");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_receipt() {
        let repo = repo().await;
        assert!(repo.get("receipt_nope").await.unwrap().is_none());
        assert!(!repo.exists("receipt_nope").await.unwrap());
        assert!(matches!(
            repo.get_required("receipt_nope").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let repo = repo().await;
        for number in ["R-1", "R-2", "R-3"] {
            repo.insert(&record(number)).await.unwrap();
        }

        let recent = repo.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].receipt_number, "R-3");
        assert_eq!(recent[1].receipt_number, "R-2");
    }
}
