//! # Sales Backend
//!
//! The collaborator that owns the catalog and records transactions.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesBackend (trait)                                                   │
//! │  ├── fetch_products()        GET  {base}/products                       │
//! │  ├── fetch_customers()       GET  {base}/customers                      │
//! │  └── submit_transaction()    POST {base}/sales/transaction              │
//! │                                                                         │
//! │  HttpSalesBackend  - reqwest, used by terminals                         │
//! │  MockSalesBackend  - mockall, unit tests                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use oud_core::{Customer, Product};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};
use crate::transaction::TransactionRequest;
use crate::wire::{self, TransactionAccepted};

/// Sales backend operations used by a terminal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SalesBackend: Send + Sync {
    /// Full product catalog, already converted to closed types.
    async fn fetch_products(&self) -> BackendResult<Vec<Product>>;

    /// Full customer list, already converted to closed types.
    async fn fetch_customers(&self) -> BackendResult<Vec<Customer>>;

    /// Records a sale. Any non-2xx answer is an error.
    async fn submit_transaction(
        &self,
        request: &TransactionRequest,
    ) -> BackendResult<TransactionAccepted>;
}

/// HTTP client for the sales backend.
///
/// Catalog reads carry `request_timeout`. The sale POST carries none of its
/// own: the submitter bounds it with the submit timeout.
#[derive(Debug, Clone)]
pub struct HttpSalesBackend {
    base_url: String,
    http: Client,
    request_timeout: Option<Duration>,
}

impl HttpSalesBackend {
    /// Creates a client for `base_url` whose catalog reads time out after
    /// `request_timeout`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> BackendResult<Self> {
        let http = Client::builder().build()?;
        Ok(HttpSalesBackend {
            request_timeout: Some(request_timeout),
            ..Self::with_client(base_url, http)
        })
    }

    /// Uses an existing reqwest client and its own timeout settings.
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        HttpSalesBackend {
            base_url,
            http,
            request_timeout: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> BackendResult<Value> {
        let url = self.url(path);
        debug!(%url, "GET");

        let mut request = self.http.get(&url);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        Self::json_body(response).await
    }

    async fn json_body(response: reqwest::Response) -> BackendResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "Backend returned an error status");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SalesBackend for HttpSalesBackend {
    async fn fetch_products(&self) -> BackendResult<Vec<Product>> {
        wire::decode_products(self.get_json("products").await?)
    }

    async fn fetch_customers(&self) -> BackendResult<Vec<Customer>> {
        wire::decode_customers(self.get_json("customers").await?)
    }

    async fn submit_transaction(
        &self,
        request: &TransactionRequest,
    ) -> BackendResult<TransactionAccepted> {
        let url = self.url("sales/transaction");
        debug!(%url, items = request.items.len(), grand_total = %request.grand_total, "POST");

        let response = self.http.post(&url).json(request).send().await?;
        wire::decode_accepted(Self::json_body(response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CheckoutSession;

    use oud_core::{Money, PaymentMethod, PaymentReconciler};

    #[test]
    fn test_urls_are_joined_without_double_slashes() {
        let backend =
            HttpSalesBackend::with_client("https://sales.example.ae/api/ ", Client::new());
        assert_eq!(backend.base_url(), "https://sales.example.ae/api");
        assert_eq!(
            backend.url("sales/transaction"),
            "https://sales.example.ae/api/sales/transaction"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_http_error() {
        // Nothing listens on the discard port locally.
        let backend =
            HttpSalesBackend::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = backend.fetch_products().await.unwrap_err();
        assert!(matches!(err, BackendError::Http(_)));
    }

    /// Accepts connections and never answers.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_request_timeout_bounds_reads_only() {
        let base_url = silent_server().await;
        let backend = HttpSalesBackend::new(base_url, Duration::from_millis(100)).unwrap();
        assert_eq!(backend.request_timeout(), Some(Duration::from_millis(100)));

        let err = backend.fetch_customers().await.unwrap_err();
        assert!(matches!(err, BackendError::Http(ref e) if e.is_timeout()));

        // The POST is still waiting well after the read timeout.
        let payment =
            PaymentReconciler::reconcile(PaymentMethod::Card, Money::zero(), None).unwrap();
        let request = TransactionRequest::build(&CheckoutSession::new(), payment);
        let submit = backend.submit_transaction(&request);
        assert!(tokio::time::timeout(Duration::from_millis(400), submit).await.is_err());
    }
}
