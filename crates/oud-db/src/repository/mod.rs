//! # Repository Module
//!
//! Database repositories for Oud POS.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TransactionSubmitter                                                   │
//! │       │                                                                 │
//! │       │  db.receipts().insert(&record)                                  │
//! │       ▼                                                                 │
//! │  ReceiptRepository                                                      │
//! │  ├── insert(&self, record)     write-once                               │
//! │  ├── get(&self, key)                                                    │
//! │  ├── exists(&self, key)                                                 │
//! │  └── list_recent(&self, n)     reprint screen                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod receipt;
