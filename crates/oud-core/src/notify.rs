//! # Cart Notifications
//!
//! Outbound port for operator feedback (beeps, toasts, line flashes).
//!
//! ```text
//! CheckoutSession ──► CartNotifier::notify(CartEvent) ──► audio / toast / nothing
//! ```
//!
//! The engine only emits events. What the terminal does with them lives
//! behind the trait, so the session never touches audio or UI code.

use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Something the operator may want to hear or see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CartEvent {
    #[serde(rename_all = "camelCase")]
    ItemAdded {
        product_id: String,
        unit: String,
        #[serde(with = "rust_decimal::serde::float")]
        #[ts(type = "number")]
        quantity: Decimal,
    },

    #[serde(rename_all = "camelCase")]
    QuantityChanged {
        product_id: String,
        #[serde(with = "rust_decimal::serde::float")]
        #[ts(type = "number")]
        quantity: Decimal,
    },

    #[serde(rename_all = "camelCase")]
    UnitChanged { product_id: String, unit: String },

    #[serde(rename_all = "camelCase")]
    ItemRemoved { product_id: String },

    CartCleared,

    /// A scan or lookup missed; the cart is untouched.
    ProductNotFound { code: String },

    #[serde(rename_all = "camelCase")]
    CheckoutCompleted { receipt_number: String, total: Money },

    CheckoutFailed { reason: String },
}

/// Receives cart events.
pub trait CartNotifier: Send + Sync {
    fn notify(&self, event: &CartEvent);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl CartNotifier for NoopNotifier {
    fn notify(&self, _event: &CartEvent) {}
}

/// Keeps every event in memory. Handy in tests and for replaying feedback.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<CartEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    /// Snapshot of the events seen so far, oldest first.
    pub fn events(&self) -> Vec<CartEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<CartEvent> {
        self.events().pop()
    }
}

impl CartNotifier for RecordingNotifier {
    fn notify(&self, event: &CartEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(&CartEvent::CartCleared);
        notifier.notify(&CartEvent::ProductNotFound {
            code: "000".to_string(),
        });

        let events = notifier.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], CartEvent::CartCleared);
        assert_eq!(
            notifier.last(),
            Some(CartEvent::ProductNotFound {
                code: "000".to_string()
            })
        );
    }

    #[test]
    fn test_noop_notifier_is_object_safe() {
        let notifier: Box<dyn CartNotifier> = Box::new(NoopNotifier);
        notifier.notify(&CartEvent::CartCleared);
    }

    #[test]
    fn test_event_wire_shape() {
        let event = CartEvent::ItemRemoved {
            product_id: "p-1".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "itemRemoved");
        assert_eq!(json["productId"], "p-1");
    }
}
