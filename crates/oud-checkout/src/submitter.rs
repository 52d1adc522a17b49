//! # Transaction Submitter
//!
//! Sends a checked-out session to the sales backend and records the receipt.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──submit()──► Submitting ──accepted──► Committed { receipt }     │
//! │    ▲                     │                        │                     │
//! │    │                     ├──error / timeout──► Failed { reason }        │
//! │    │                     │                        │                     │
//! │    └─────────────────────┴──── next submit() ◄────┘                     │
//! │                                                                         │
//! │   submit() while Submitting ──► SubmissionInProgress                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submission Task
//! The backend call, the receipt write and the terminal state transition run
//! in their own tokio task under `tokio::time::timeout`. Dropping the
//! caller's future therefore never leaves the submitter in `Submitting`.
//!
//! Only on success does the session get cleared. A failed submission leaves
//! cart, customer and discount exactly as they were.
//!
//! If the caller's future is dropped and the task still commits, the session
//! is left uncleared. The submitter keeps the last committed [`Transaction`];
//! submitting that same session again clears it and returns the stored
//! transaction without another POST.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use oud_core::CartEvent;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::backend::SalesBackend;
use crate::error::{CheckoutError, CheckoutResult};
use crate::receipt::{DeliveryPreferences, Receipt, ReceiptStore, StoreInfo};
use crate::session::CheckoutSession;
use crate::transaction::{PendingTransaction, Transaction};

/// Where the submitter is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    #[serde(rename_all = "camelCase")]
    Committed {
        receipt_number: String,
        session_id: String,
    },
    Failed { reason: String },
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

#[derive(Default)]
struct Shared {
    state: SubmissionState,
    /// Last transaction the backend accepted.
    committed: Option<Transaction>,
}

type SharedState = Arc<Mutex<Shared>>;

fn lock(shared: &SharedState) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_state(shared: &SharedState, next: SubmissionState) {
    lock(shared).state = next;
}

// =============================================================================
// Submitter
// =============================================================================

/// Submits sessions, one at a time per terminal.
#[derive(Clone)]
pub struct TransactionSubmitter {
    backend: Arc<dyn SalesBackend>,
    receipts: Arc<dyn ReceiptStore>,
    store: StoreInfo,
    timeout: Duration,
    state: SharedState,
}

impl TransactionSubmitter {
    pub fn new(
        backend: Arc<dyn SalesBackend>,
        receipts: Arc<dyn ReceiptStore>,
        store: StoreInfo,
        timeout: Duration,
    ) -> Self {
        TransactionSubmitter {
            backend,
            receipts,
            store,
            timeout,
            state: Arc::new(Mutex::new(Shared::default())),
        }
    }

    pub fn state(&self) -> SubmissionState {
        lock(&self.state).state.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks out `session`.
    ///
    /// ## Errors
    /// - `EmptyCart` / `InsufficientCash` / validation: nothing was sent
    /// - `SubmissionInProgress`: another checkout on this submitter is in flight
    /// - `SubmissionFailed`: backend error, non-2xx, timeout or task panic
    ///
    /// The session is reset only when `Ok` is returned. A session that
    /// already committed gets its stored transaction back, with no POST.
    pub async fn submit(&self, session: &mut CheckoutSession) -> CheckoutResult<Transaction> {
        if let Some(transaction) = self.committed_for(session) {
            info!(
                receipt_number = %transaction.receipt_number,
                session_id = %transaction.session_id,
                "Session already committed, returning stored transaction"
            );
            Self::complete(session, &transaction);
            return Ok(transaction);
        }

        if session.cart().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let payment = session.reconcile_payment()?;

        self.begin()?;

        let pending = PendingTransaction::capture(session, payment);
        let task = SubmissionTask {
            backend: Arc::clone(&self.backend),
            receipts: Arc::clone(&self.receipts),
            store: self.store.clone(),
            delivery: session.payment().delivery.clone(),
            timeout: self.timeout,
            state: Arc::clone(&self.state),
        };

        let outcome = match tokio::spawn(task.run(pending)).await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                let reason = format!("Submission task failed: {}", join_error);
                error!(%reason, "Submission task did not complete");
                set_state(&self.state, SubmissionState::Failed {
                    reason: reason.clone(),
                });
                Err(reason)
            }
        };

        match outcome {
            Ok(transaction) => {
                Self::complete(session, &transaction);
                Ok(transaction)
            }
            Err(reason) => {
                session.notify(CartEvent::CheckoutFailed {
                    reason: reason.clone(),
                });
                Err(CheckoutError::submission_failed(reason))
            }
        }
    }

    fn begin(&self) -> CheckoutResult<()> {
        let mut shared = lock(&self.state);
        if shared.state.is_submitting() {
            return Err(CheckoutError::SubmissionInProgress);
        }
        shared.state = SubmissionState::Submitting;
        Ok(())
    }

    fn committed_for(&self, session: &CheckoutSession) -> Option<Transaction> {
        let session_id = session.session_id().to_string();
        lock(&self.state)
            .committed
            .as_ref()
            .filter(|transaction| transaction.session_id == session_id)
            .cloned()
    }

    fn complete(session: &mut CheckoutSession, transaction: &Transaction) {
        session.reset_after_commit();
        session.notify(CartEvent::CheckoutCompleted {
            receipt_number: transaction.receipt_number.clone(),
            total: transaction.grand_total(),
        });
    }
}

// =============================================================================
// Submission Task
// =============================================================================

struct SubmissionTask {
    backend: Arc<dyn SalesBackend>,
    receipts: Arc<dyn ReceiptStore>,
    store: StoreInfo,
    delivery: DeliveryPreferences,
    timeout: Duration,
    state: SharedState,
}

impl SubmissionTask {
    /// Always leaves `state` in `Committed` or `Failed`.
    async fn run(self, pending: PendingTransaction) -> Result<Transaction, String> {
        let call = self.backend.submit_transaction(&pending.request);
        let submitted = tokio::time::timeout(self.timeout, call).await;

        let accepted = match submitted {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => return Err(self.fail(e.to_string())),
            Err(_) => {
                return Err(self.fail(format!(
                    "Backend did not respond within {} ms",
                    self.timeout.as_millis()
                )))
            }
        };

        let transaction = Transaction::from_accepted(pending, accepted, Utc::now());
        let receipt = Receipt::from_transaction(&transaction, &self.store, &self.delivery);
        if let Err(e) = self.receipts.put(&receipt).await {
            warn!(
                receipt_number = %transaction.receipt_number,
                error = %e,
                "Receipt write failed, transaction stays committed"
            );
        }

        info!(
            transaction_id = %transaction.id,
            receipt_number = %transaction.receipt_number,
            total = %transaction.grand_total(),
            items = transaction.items.len(),
            "Transaction committed"
        );
        let mut shared = lock(&self.state);
        shared.state = SubmissionState::Committed {
            receipt_number: transaction.receipt_number.clone(),
            session_id: transaction.session_id.clone(),
        };
        shared.committed = Some(transaction.clone());
        drop(shared);
        Ok(transaction)
    }

    fn fail(&self, reason: String) -> String {
        warn!(%reason, "Transaction submission failed");
        set_state(&self.state, SubmissionState::Failed {
            reason: reason.clone(),
        });
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use oud_core::{
        Customer, CustomerTier, DiscountSpec, Money, PaymentMethod, Product, RecordingNotifier,
    };
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::backend::MockSalesBackend;
    use crate::error::{BackendError, BackendResult, ReceiptStoreError};
    use crate::receipt::MemoryReceiptStore;
    use crate::transaction::TransactionRequest;
    use crate::wire::TransactionAccepted;

    /// Accepts every request after `delay`, counting the calls.
    struct SlowBackend {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl SlowBackend {
        fn new(delay: Duration) -> Self {
            SlowBackend {
                delay,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl SalesBackend for SlowBackend {
        async fn fetch_products(&self) -> BackendResult<Vec<Product>> {
            Ok(Vec::new())
        }

        async fn fetch_customers(&self) -> BackendResult<Vec<Customer>> {
            Ok(Vec::new())
        }

        async fn submit_transaction(
            &self,
            _request: &TransactionRequest,
        ) -> BackendResult<TransactionAccepted> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(accepted("R-SLOW"))
        }
    }

    struct BrokenReceipts;

    #[async_trait]
    impl ReceiptStore for BrokenReceipts {
        async fn put(&self, _receipt: &Receipt) -> Result<(), ReceiptStoreError> {
            Err(ReceiptStoreError::Storage("disk full".to_string()))
        }

        async fn get(&self, _key: &str) -> Result<Option<Receipt>, ReceiptStoreError> {
            Ok(None)
        }
    }

    fn accepted(receipt_number: &str) -> TransactionAccepted {
        TransactionAccepted {
            id: format!("t-{}", receipt_number),
            receipt_number: receipt_number.to_string(),
        }
    }

    fn submitter(
        backend: impl SalesBackend + 'static,
        receipts: Arc<dyn ReceiptStore>,
        timeout: Duration,
    ) -> TransactionSubmitter {
        TransactionSubmitter::new(Arc::new(backend), receipts, StoreInfo::default(), timeout)
    }

    fn ready_session(notifier: Arc<RecordingNotifier>) -> CheckoutSession {
        let product = Product {
            id: "p-1".to_string(),
            sku: Some("OUD-001".to_string()),
            barcode: None,
            name: "Cambodi Oud".to_string(),
            name_ar: None,
            category: None,
            brand: None,
            price: Money::from_major(200),
            base_price: None,
            units: Vec::new(),
            stock_quantity: Decimal::ONE,
            is_weight_based: false,
        };
        let customer = Customer {
            id: "c-7".to_string(),
            name: "Khalid".to_string(),
            name_ar: None,
            phone: None,
            email: None,
            tier: CustomerTier::Vip,
            discount_rate: Decimal::TEN,
            loyalty_points: 0,
        };

        let mut session = CheckoutSession::with_notifier(notifier);
        session.add_product(&product, Decimal::ONE, None).unwrap();
        session.select_customer(customer);
        session.set_discount(DiscountSpec::fixed(Money::from_major(20))).unwrap();
        session.set_amount_received(Some(Money::from_major(200))).unwrap();
        session
    }

    #[tokio::test]
    async fn test_success_commits_stores_receipt_and_resets() {
        let mut backend = MockSalesBackend::new();
        backend
            .expect_submit_transaction()
            .times(1)
            .returning(|request| {
                assert_eq!(request.grand_total, Money::from_major(168));
                Ok(accepted("R-000042"))
            });

        let receipts = Arc::new(MemoryReceiptStore::new());
        let submitter = submitter(backend, receipts.clone(), Duration::from_secs(5));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut session = ready_session(notifier.clone());

        let session_id = session.session_id().to_string();

        let transaction = submitter.submit(&mut session).await.unwrap();

        assert_eq!(transaction.receipt_number, "R-000042");
        assert_eq!(transaction.payment.change_given, Money::from_major(32));
        assert_eq!(transaction.loyalty_points_earned, 16);
        assert_eq!(
            submitter.state(),
            SubmissionState::Committed {
                receipt_number: "R-000042".to_string(),
                session_id,
            }
        );

        assert!(session.cart().is_empty());
        assert!(session.customer().is_none());
        assert!(session.discount().is_none());

        let receipt = receipts.get("receipt_R-000042").await.unwrap().unwrap();
        assert_eq!(receipt.grand_total(), Money::from_major(168));
        assert!(matches!(
            notifier.last(),
            Some(CartEvent::CheckoutCompleted { ref receipt_number, .. })
                if receipt_number == "R-000042"
        ));
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_the_session() {
        let mut backend = MockSalesBackend::new();
        backend.expect_submit_transaction().times(1).returning(|_| {
            Err(BackendError::Status {
                status: 500,
                body: "database unavailable".to_string(),
            })
        });

        let receipts = Arc::new(MemoryReceiptStore::new());
        let submitter = submitter(backend, receipts.clone(), Duration::from_secs(5));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut session = ready_session(notifier.clone());
        let session_id = session.session_id();

        let err = submitter.submit(&mut session).await.unwrap_err();

        assert!(matches!(err, CheckoutError::SubmissionFailed { .. }));
        assert!(matches!(submitter.state(), SubmissionState::Failed { .. }));
        assert_eq!(session.cart().len(), 1);
        assert_eq!(session.customer().map(|c| c.id.as_str()), Some("c-7"));
        assert_eq!(*session.discount(), DiscountSpec::fixed(Money::from_major(20)));
        assert_eq!(session.session_id(), session_id);
        assert!(receipts.is_empty().await);
        assert!(matches!(notifier.last(), Some(CartEvent::CheckoutFailed { .. })));
    }

    #[tokio::test]
    async fn test_timeout_fails_the_submission() {
        let submitter = submitter(
            SlowBackend::new(Duration::from_secs(5)),
            Arc::new(MemoryReceiptStore::new()),
            Duration::from_millis(50),
        );
        let mut session = ready_session(Arc::new(RecordingNotifier::new()));

        let err = submitter.submit(&mut session).await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::SubmissionFailed { ref reason } if reason.contains("50 ms")
        ));
        assert!(matches!(submitter.state(), SubmissionState::Failed { .. }));
        assert_eq!(session.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_rejected() {
        let submitter = submitter(
            SlowBackend::new(Duration::from_millis(100)),
            Arc::new(MemoryReceiptStore::new()),
            Duration::from_secs(5),
        );
        let mut first = ready_session(Arc::new(RecordingNotifier::new()));
        let mut second = ready_session(Arc::new(RecordingNotifier::new()));

        let (a, b) = tokio::join!(submitter.submit(&mut first), submitter.submit(&mut second));

        assert!(a.is_ok());
        assert!(matches!(b, Err(CheckoutError::SubmissionInProgress)));
        assert_eq!(second.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_and_short_cash_never_reach_the_backend() {
        let mut backend = MockSalesBackend::new();
        backend.expect_submit_transaction().never();
        let receipts = Arc::new(MemoryReceiptStore::new());
        let submitter = submitter(backend, receipts, Duration::from_secs(5));

        let mut empty = CheckoutSession::new();
        assert!(matches!(
            submitter.submit(&mut empty).await,
            Err(CheckoutError::EmptyCart)
        ));

        let mut short = ready_session(Arc::new(RecordingNotifier::new()));
        short.set_payment_method(PaymentMethod::Cash);
        short.set_amount_received(Some(Money::from_major(100))).unwrap();
        let err = submitter.submit(&mut short).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InsufficientCash);

        assert_eq!(submitter.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_receipt_write_failure_still_commits() {
        let submitter = submitter(
            SlowBackend::new(Duration::ZERO),
            Arc::new(BrokenReceipts),
            Duration::from_secs(5),
        );
        let mut session = ready_session(Arc::new(RecordingNotifier::new()));

        let transaction = submitter.submit(&mut session).await.unwrap();

        assert_eq!(transaction.receipt_number, "R-SLOW");
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let mut backend = MockSalesBackend::new();
        let mut calls = 0;
        backend.expect_submit_transaction().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(BackendError::Decode("truncated body".to_string()))
            } else {
                Ok(accepted("R-000043"))
            }
        });
        let receipts = Arc::new(MemoryReceiptStore::new());
        let submitter = submitter(backend, receipts, Duration::from_secs(5));
        let mut session = ready_session(Arc::new(RecordingNotifier::new()));

        assert!(submitter.submit(&mut session).await.is_err());
        let transaction = submitter.submit(&mut session).await.unwrap();

        assert_eq!(transaction.receipt_number, "R-000043");
    }

    #[tokio::test]
    async fn test_resubmit_after_dropped_call_returns_committed_sale() {
        let backend = SlowBackend::new(Duration::from_millis(100));
        let calls = Arc::clone(&backend.calls);
        let receipts = Arc::new(MemoryReceiptStore::new());
        let submitter = submitter(backend, receipts.clone(), Duration::from_secs(5));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut session = ready_session(notifier.clone());
        let session_id = session.session_id();

        // The operator closes the dialog while the POST is in flight.
        let dropped =
            tokio::time::timeout(Duration::from_millis(10), submitter.submit(&mut session)).await;
        assert!(dropped.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(matches!(submitter.state(), SubmissionState::Committed { .. }));
        assert_eq!(session.cart().len(), 1);

        let transaction = submitter.submit(&mut session).await.unwrap();

        assert_eq!(transaction.receipt_number, "R-SLOW");
        assert_eq!(transaction.session_id, session_id.to_string());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(session.cart().is_empty());
        assert!(session.customer().is_none());
        assert_ne!(session.session_id(), session_id);
        assert!(receipts.get("receipt_R-SLOW").await.unwrap().is_some());
        assert!(matches!(notifier.last(), Some(CartEvent::CheckoutCompleted { .. })));

        // The next sale on the fresh session goes to the backend again.
        let mut next = ready_session(Arc::new(RecordingNotifier::new()));
        submitter.submit(&mut next).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
