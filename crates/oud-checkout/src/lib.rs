//! # oud-checkout: Checkout Orchestration for Oud POS
//!
//! Connects the pricing engine ([`oud_core`]) to the sales backend, the
//! receipt store ([`oud_db`]), configuration and logging.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Architecture                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 Terminal (wired from PosConfig)                  │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │    Catalog     │  │CheckoutSession │  │ TransactionSubmitter   │    │
//! │  │                │  │                │  │                        │    │
//! │  │ products and   │  │ cart, customer │  │ spawned task + timeout │    │
//! │  │ customers,     │  │ discount,      │  │ POST to SalesBackend   │    │
//! │  │ fetched once   │  │ payment draft  │  │ receipt to ReceiptStore│    │
//! │  └───────┬────────┘  └────────────────┘  └───────────┬────────────┘    │
//! │          │                                           │                  │
//! │          ▼                                           ▼                  │
//! │  ┌─────────────────────────────────┐   ┌──────────────────────────┐    │
//! │  │ SalesBackend (reqwest) + wire   │   │ ReceiptRepository (SQLite)│   │
//! │  └─────────────────────────────────┘   └──────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Layered `pos.toml` + `OUD_*` configuration
//! - [`telemetry`] - tracing subscriber setup
//! - [`error`] - Checkout, backend, config and receipt errors
//! - [`backend`] - `SalesBackend` trait and its HTTP client
//! - [`wire`] - Loose backend JSON to closed core types
//! - [`catalog`] - Product and customer lookups
//! - [`session`] - `CheckoutSession`
//! - [`transaction`] - Request body and committed `Transaction`
//! - [`receipt`] - `Receipt` and write-once receipt stores
//! - [`submitter`] - `TransactionSubmitter` state machine
//! - [`terminal`] - Startup wiring
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oud_checkout::{PosConfig, Terminal};
//!
//! let terminal = Terminal::start(PosConfig::load_or_default(None)).await?;
//! let mut session = terminal.new_session();
//!
//! session.scan("6291234567890", terminal.catalog())?;
//! session.set_amount_received(Some(Money::from_major(200)))?;
//!
//! let transaction = terminal.submitter().submit(&mut session).await?;
//! println!("Receipt {}", transaction.receipt_number);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod receipt;
pub mod session;
pub mod submitter;
pub mod telemetry;
pub mod terminal;
pub mod transaction;
pub mod wire;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{HttpSalesBackend, SalesBackend};
pub use catalog::Catalog;
pub use config::PosConfig;
pub use error::{
    BackendError, CheckoutError, CheckoutResult, ConfigError, ErrorCode, ErrorPayload,
    ReceiptStoreError, TerminalError,
};
pub use receipt::{DeliveryPreferences, MemoryReceiptStore, Receipt, ReceiptStore, StoreInfo};
pub use session::{CheckoutSession, PaymentDraft};
pub use submitter::{SubmissionState, TransactionSubmitter};
pub use telemetry::init_tracing;
pub use terminal::Terminal;
pub use transaction::{LineRecord, PendingTransaction, Transaction, TransactionRequest};
pub use wire::TransactionAccepted;
