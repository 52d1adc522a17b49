//! # oud-db: Receipt Store for Oud POS
//!
//! Local SQLite storage for receipts of committed checkouts.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Oud POS Data Flow                                │
//! │                                                                         │
//! │  TransactionSubmitter (oud-checkout), after the backend accepts        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     oud-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  ReceiptRepo   │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file from [receipts] database_path                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Receipt repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oud_db::{Database, DbConfig, ReceiptRecord};
//!
//! let db = Database::new(DbConfig::new("receipts.db")).await?;
//! db.receipts().insert(&ReceiptRecord::new(id, number, total, payload)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::receipt::{receipt_key, ReceiptRecord, ReceiptRepository};
