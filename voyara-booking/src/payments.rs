use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use voyara_core::cache::{CacheNotifier, CacheScope};
use voyara_core::models::{BookingStatus, Payment, PaymentMethod, PaymentStatus};
use voyara_core::repository::{BookingStore, PaymentStore};
use voyara_core::{CoreError, CoreResult};
use voyara_shared::pii::Masked;

/// Card payload accepted with CARD submissions. Opaque to this core: it is
/// held for a future gateway hand-off and is never persisted. The PAN stays
/// inside `Masked` so it cannot surface in logs or responses.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub card_number: Masked<String>,
    pub expiry: String,
    pub holder_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment_id: i64,
    pub transaction_id: String,
    pub status: PaymentStatus,
}

/// Owns payment record creation and its status machine, gated by booking
/// state. Completion is unconditional once the preconditions pass; there is
/// no gateway failure path yet, and the FAILED status is the hook for one.
pub struct PaymentProcessor {
    bookings: Arc<dyn BookingStore>,
    payments: Arc<dyn PaymentStore>,
    cache: Arc<dyn CacheNotifier>,
}

impl PaymentProcessor {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        payments: Arc<dyn PaymentStore>,
        cache: Arc<dyn CacheNotifier>,
    ) -> Self {
        Self { bookings, payments, cache }
    }

    /// The payment for one of the caller's bookings. Admin callers may read
    /// any booking's payment.
    pub async fn payment_for_booking(
        &self,
        booking_id: i64,
        caller_user_id: i64,
        caller_is_admin: bool,
    ) -> CoreResult<Payment> {
        let found = if caller_is_admin {
            self.bookings.get_booking(booking_id).await
        } else {
            self.bookings.get_booking_for_user(booking_id, caller_user_id).await
        }
        .map_err(|e| CoreError::internal("get_payment", booking_id, e))?;

        if found.is_none() {
            return Err(CoreError::NotFound("booking"));
        }

        self.payments
            .get_payment_by_booking(booking_id)
            .await
            .map_err(|e| CoreError::internal("get_payment", booking_id, e))?
            .ok_or(CoreError::NotFound("payment"))
    }

    /// Settle a confirmed booking.
    ///
    /// The booking is resolved through the caller's own bookings, never by
    /// bare id, so foreign booking ids cannot be probed. The pending row is
    /// inserted with a conflict-free create and completed with a conditional
    /// update; when two submissions race, the storage constraints let
    /// exactly one of them complete and the other reports
    /// "payment already completed".
    pub async fn submit_payment(
        &self,
        booking_id: i64,
        caller_user_id: i64,
        method: PaymentMethod,
        card: Option<CardDetails>,
    ) -> CoreResult<PaymentReceipt> {
        let booking = self
            .bookings
            .get_booking_for_user(booking_id, caller_user_id)
            .await
            .map_err(|e| CoreError::internal("submit_payment", booking_id, e))?
            .ok_or(CoreError::NotFound("booking"))?;

        if booking.status != BookingStatus::Confirmed {
            return Err(CoreError::invalid_state("booking is not confirmed"));
        }

        let existing = self
            .payments
            .get_payment_by_booking(booking_id)
            .await
            .map_err(|e| CoreError::internal("submit_payment", booking_id, e))?;

        if let Some(payment) = &existing {
            if payment.status == PaymentStatus::Completed {
                return Err(CoreError::invalid_state("payment already completed"));
            }
        }

        if existing.is_none() {
            // A concurrent submission may win this insert; the conditional
            // completion below settles the race either way.
            self.payments
                .create_pending_payment(booking_id, booking.total_price, method)
                .await
                .map_err(|e| CoreError::internal("submit_payment", booking_id, e))?;
        }

        if let (PaymentMethod::Card, Some(card)) = (method, &card) {
            debug!(booking_id, last4 = card.card_number.last4(), "card payload held for gateway");
        }

        let transaction_id = new_transaction_id(booking_id);
        let payment = self
            .payments
            .complete_payment(booking_id, &transaction_id, Utc::now())
            .await
            .map_err(|e| CoreError::internal("submit_payment", booking_id, e))?
            .ok_or_else(|| CoreError::invalid_state("payment already completed"))?;

        info!(booking_id, payment_id = payment.id, "payment completed");
        self.cache.notify(CacheScope::Bookings);

        let transaction_id = payment.transaction_id.clone().unwrap_or(transaction_id);
        Ok(PaymentReceipt { payment_id: payment.id, transaction_id, status: payment.status })
    }
}

/// Transaction references combine epoch milliseconds with the booking id,
/// so concurrent submissions for different bookings cannot collide.
fn new_transaction_id(booking_id: i64) -> String {
    format!("txn_{}_{}", Utc::now().timestamp_millis(), booking_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::{MemoryStore, RecordingNotifier};

    fn processor(store: &Arc<MemoryStore>) -> PaymentProcessor {
        PaymentProcessor::new(
            store.clone(),
            store.clone(),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn card() -> CardDetails {
        CardDetails {
            card_number: Masked("4242424242424242".to_string()),
            expiry: "12/29".to_string(),
            holder_name: "A Traveller".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_payment_completes_confirmed_booking() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(7000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        let svc = processor(&store);

        let receipt = svc
            .submit_payment(booking_id, 1, PaymentMethod::Card, Some(card()))
            .await
            .unwrap();
        assert_eq!(receipt.status, PaymentStatus::Completed);
        assert!(receipt.transaction_id.starts_with("txn_"));

        // Exactly one payment row, completed, priced from the booking
        let payment = svc.payment_for_booking(booking_id, 1, false).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.amount, 7000);
        assert!(payment.paid_at.is_some());
        assert_eq!(store.payment_count(), 1);
    }

    #[tokio::test]
    async fn test_second_submission_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(7000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        let svc = processor(&store);

        svc.submit_payment(booking_id, 1, PaymentMethod::InternetBanking, None)
            .await
            .unwrap();
        let err = svc
            .submit_payment(booking_id, 1, PaymentMethod::InternetBanking, None)
            .await
            .unwrap_err();
        match err {
            CoreError::InvalidState(msg) => assert_eq!(msg, "payment already completed"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.payment_count(), 1);
    }

    #[tokio::test]
    async fn test_unconfirmed_booking_cannot_pay() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(7000, None, None);
        let pending = store.seed_booking(1, tour_id, BookingStatus::Pending);
        let cancelled = store.seed_booking(1, tour_id, BookingStatus::Cancelled);
        let svc = processor(&store);

        for booking_id in [pending, cancelled] {
            let err = svc
                .submit_payment(booking_id, 1, PaymentMethod::Card, Some(card()))
                .await
                .unwrap_err();
            match err {
                CoreError::InvalidState(msg) => assert_eq!(msg, "booking is not confirmed"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(store.payment_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_booking_cannot_be_paid() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(7000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        let svc = processor(&store);

        let err = svc
            .submit_payment(booking_id, 2, PaymentMethod::Card, Some(card()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(store.payment_count(), 0);
    }

    #[tokio::test]
    async fn test_payment_read_requires_ownership() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(7000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        let svc = processor(&store);
        svc.submit_payment(booking_id, 1, PaymentMethod::Card, Some(card())).await.unwrap();

        let err = svc.payment_for_booking(booking_id, 2, false).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        // Admin override reads any booking's payment
        let payment = svc.payment_for_booking(booking_id, 2, true).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn test_transaction_ids_differ_per_booking() {
        assert_ne!(new_transaction_id(1), new_transaction_id(2));
    }

    #[test]
    fn test_receipt_serializes_statuses_for_the_api() {
        let receipt = PaymentReceipt {
            payment_id: 3,
            transaction_id: "txn_1754000000000_42".to_string(),
            status: PaymentStatus::Completed,
        };
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["payment_id"], 3);
    }
}
