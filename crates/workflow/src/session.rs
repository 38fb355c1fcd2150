//! Session pointers for resuming an in-flight payment.
//!
//! Hosted-checkout payments leave the application entirely; when the actor
//! comes back the flow only needs two ids to pick up where it left off. The
//! store holds exactly those two pointers and nothing else.

use async_trait::async_trait;
use common::{AppointmentId, PaymentIntentId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// The pointers a redirect return flow needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayment {
    pub intent_id: PaymentIntentId,
    pub appointment_id: AppointmentId,
}

/// Where the pending-payment pointers live between page loads.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Records the payment the actor is in the middle of.
    async fn save_pending(&self, pending: PendingPayment);

    /// Returns the recorded payment, if any.
    async fn pending(&self) -> Option<PendingPayment>;

    /// Forgets the recorded payment.
    async fn clear_pending(&self);
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: Mutex<Option<PendingPayment>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_pending(&self, pending: PendingPayment) {
        *self.inner.lock().await = Some(pending);
    }

    async fn pending(&self) -> Option<PendingPayment> {
        *self.inner.lock().await
    }

    async fn clear_pending(&self) {
        *self.inner.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = InMemorySessionStore::new();
        assert!(store.pending().await.is_none());

        let pending = PendingPayment {
            intent_id: PaymentIntentId::new(),
            appointment_id: AppointmentId::new(),
        };
        store.save_pending(pending).await;
        assert_eq!(store.pending().await, Some(pending));

        store.clear_pending().await;
        assert!(store.pending().await.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = InMemorySessionStore::new();
        let first = PendingPayment {
            intent_id: PaymentIntentId::new(),
            appointment_id: AppointmentId::new(),
        };
        let second = PendingPayment {
            intent_id: PaymentIntentId::new(),
            appointment_id: AppointmentId::new(),
        };

        store.save_pending(first).await;
        store.save_pending(second).await;
        assert_eq!(store.pending().await, Some(second));
    }
}
