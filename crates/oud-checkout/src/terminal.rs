//! # Terminal
//!
//! Wires one POS terminal together from its [`PosConfig`].
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Terminal::start(config)                           │
//! │                                                                         │
//! │  1. Validate config                                                     │
//! │  2. Initialize logging ([logging] filter, RUST_LOG wins)               │
//! │  3. Open receipt database ([receipts] database_path)                   │
//! │     • SQLite with WAL mode, migrations applied                          │
//! │  4. Build HTTP backend ([backend] base_url, request timeout)           │
//! │  5. Load catalog (failures leave it empty, never abort startup)        │
//! │  6. Build submitter ([backend] submit timeout, [store] header)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use oud_core::{CartNotifier, NoopNotifier};
use oud_db::{Database, DbConfig};
use tracing::info;

use crate::backend::{HttpSalesBackend, SalesBackend};
use crate::catalog::Catalog;
use crate::config::PosConfig;
use crate::error::{ConfigError, TerminalError};
use crate::receipt::StoreInfo;
use crate::session::CheckoutSession;
use crate::submitter::TransactionSubmitter;
use crate::telemetry::init_tracing;

/// A running terminal: catalog, receipt store and submitter.
pub struct Terminal {
    config: PosConfig,
    database: Database,
    backend: Arc<dyn SalesBackend>,
    catalog: Catalog,
    submitter: TransactionSubmitter,
    notifier: Arc<dyn CartNotifier>,
}

impl Terminal {
    pub async fn start(config: PosConfig) -> Result<Self, TerminalError> {
        config.validate()?;
        init_tracing(Some(&config.logging.filter));
        info!(store = %config.store.name, backend = %config.backend.base_url, "Starting terminal");

        let mut db_config = DbConfig::new(config.receipt_database_path());
        if db_config.is_in_memory() {
            db_config = DbConfig::in_memory();
        } else if let Some(dir) = db_config
            .database_path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
        {
            std::fs::create_dir_all(dir).map_err(ConfigError::from)?;
        }
        info!(path = ?db_config.database_path, "Opening receipt database");
        let database = Database::new(db_config).await?;

        let backend: Arc<dyn SalesBackend> = Arc::new(HttpSalesBackend::new(
            config.backend.base_url.clone(),
            config.request_timeout(),
        )?);
        let catalog = Catalog::load(backend.as_ref()).await;

        let submitter = TransactionSubmitter::new(
            Arc::clone(&backend),
            Arc::new(database.receipts()),
            StoreInfo::from(&config.store),
            config.submit_timeout(),
        );

        info!("Terminal ready");
        Ok(Terminal {
            config,
            database,
            backend,
            catalog,
            submitter,
            notifier: Arc::new(NoopNotifier),
        })
    }

    /// Sessions created afterwards report to `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn CartNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn new_session(&self) -> CheckoutSession {
        CheckoutSession::with_notifier(Arc::clone(&self.notifier))
    }

    pub fn config(&self) -> &PosConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn submitter(&self) -> &TransactionSubmitter {
        &self.submitter
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Fetches products and customers again.
    pub async fn reload_catalog(&mut self) {
        self.catalog = Catalog::load(self.backend.as_ref()).await;
    }

    pub async fn shutdown(self) {
        info!("Shutting down terminal");
        self.database.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn offline_config(db_path: PathBuf) -> PosConfig {
        let mut config = PosConfig::default();
        config.backend.base_url = "http://127.0.0.1:9/api".to_string();
        config.backend.request_timeout_secs = 1;
        config.receipts.database_path = Some(db_path);
        config
    }

    #[tokio::test]
    async fn test_starts_with_empty_catalog_when_backend_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("receipts.db");
        let terminal = Terminal::start(offline_config(db_path)).await.unwrap();

        assert!(terminal.catalog().products().is_empty());
        assert!(terminal.database().health_check().await);
        assert!(terminal.new_session().cart().is_empty());

        terminal.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = offline_config(PathBuf::from(":memory:"));
        config.backend.submit_timeout_secs = 0;

        let result = Terminal::start(config).await;
        assert!(matches!(result, Err(TerminalError::Config(ConfigError::Invalid(_)))));
    }
}
