use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use voyara_core::cache::{CacheNotifier, CacheScope};
use voyara_core::models::{Booking, BookingStatus, NewBooking};
use voyara_core::repository::{BookingStore, TourStore};
use voyara_core::{CoreError, CoreResult};

/// Manages booking lifecycle and state transitions.
///
/// Ownership policy: non-admin callers resolve bookings through queries
/// scoped to their own user id, so a booking they do not own reports
/// NotFound. Admin callers resolve by id alone.
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingStore>,
    tours: Arc<dyn TourStore>,
    cache: Arc<dyn CacheNotifier>,
}

impl BookingLifecycle {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        tours: Arc<dyn TourStore>,
        cache: Arc<dyn CacheNotifier>,
    ) -> Self {
        Self { bookings, tours, cache }
    }

    /// Create a booking in PENDING for the caller, priced from the tour.
    pub async fn create_booking(
        &self,
        caller_user_id: i64,
        tour_id: i64,
        num_guests: i32,
        booking_date: Option<DateTime<Utc>>,
    ) -> CoreResult<Booking> {
        if num_guests < 1 {
            return Err(CoreError::validation("num_guests must be at least 1"));
        }

        let tour = self
            .tours
            .get_tour(tour_id)
            .await
            .map_err(|e| CoreError::internal("create_booking", tour_id, e))?
            .ok_or(CoreError::NotFound("tour"))?;

        let booking = self
            .bookings
            .create_booking(&NewBooking {
                user_id: caller_user_id,
                tour_id,
                num_guests,
                total_price: tour.price * num_guests as i64,
                booking_date: booking_date.unwrap_or_else(Utc::now),
            })
            .await
            .map_err(|e| CoreError::internal("create_booking", tour_id, e))?;

        info!(booking_id = booking.id, tour_id, user_id = caller_user_id, "booking created");
        self.cache.notify(CacheScope::Bookings);
        Ok(booking)
    }

    pub async fn get_booking(
        &self,
        booking_id: i64,
        caller_user_id: i64,
        caller_is_admin: bool,
    ) -> CoreResult<Booking> {
        self.fetch_scoped(booking_id, caller_user_id, caller_is_admin).await
    }

    pub async fn bookings_for_user(&self, user_id: i64) -> CoreResult<Vec<Booking>> {
        self.bookings
            .list_bookings_for_user(user_id)
            .await
            .map_err(|e| CoreError::internal("list_bookings", user_id, e))
    }

    /// Newest bookings across all users, for admin moderation views.
    pub async fn recent_bookings(&self, limit: i64) -> CoreResult<Vec<Booking>> {
        self.bookings
            .list_recent_bookings(limit)
            .await
            .map_err(|e| CoreError::internal("list_recent_bookings", limit, e))
    }

    /// Transition: PENDING | CONFIRMED -> CANCELLED.
    ///
    /// Cancelling an already-cancelled booking reports "already cancelled";
    /// the same answer covers a concurrent cancel that wins the race, since
    /// the conditional update below only matches cancellable states.
    pub async fn cancel(
        &self,
        booking_id: i64,
        caller_user_id: i64,
        caller_is_admin: bool,
    ) -> CoreResult<Booking> {
        let booking = self.fetch_scoped(booking_id, caller_user_id, caller_is_admin).await?;

        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::invalid_state("already cancelled"));
        }

        let updated = self
            .bookings
            .transition_status(
                booking_id,
                &[BookingStatus::Pending, BookingStatus::Confirmed],
                BookingStatus::Cancelled,
            )
            .await
            .map_err(|e| CoreError::internal("cancel_booking", booking_id, e))?
            .ok_or_else(|| CoreError::invalid_state("already cancelled"))?;

        info!(booking_id, "booking cancelled");
        self.cache.notify(CacheScope::Bookings);
        self.cache.notify(CacheScope::Tours);
        Ok(updated)
    }

    /// Remove the booking row entirely. Owner or admin only; a missing (or
    /// non-owned) row is NotFound.
    pub async fn delete(
        &self,
        booking_id: i64,
        caller_user_id: i64,
        caller_is_admin: bool,
    ) -> CoreResult<()> {
        let removed = if caller_is_admin {
            self.bookings.delete_booking(booking_id).await
        } else {
            self.bookings.delete_booking_for_user(booking_id, caller_user_id).await
        }
        .map_err(|e| CoreError::internal("delete_booking", booking_id, e))?;

        if !removed {
            return Err(CoreError::NotFound("booking"));
        }

        info!(booking_id, "booking deleted");
        self.cache.notify(CacheScope::Bookings);
        self.cache.notify(CacheScope::Tours);
        Ok(())
    }

    /// Admin moderation override: set any status directly. Reached only
    /// through the admin-guarded route; still validates existence.
    pub async fn update_status(
        &self,
        booking_id: i64,
        new_status: BookingStatus,
    ) -> CoreResult<Booking> {
        let updated = self
            .bookings
            .set_status(booking_id, new_status)
            .await
            .map_err(|e| CoreError::internal("update_booking_status", booking_id, e))?
            .ok_or(CoreError::NotFound("booking"))?;

        info!(booking_id, status = %new_status, "booking status overridden");
        self.cache.notify(CacheScope::Bookings);
        self.cache.notify(CacheScope::Tours);
        Ok(updated)
    }

    async fn fetch_scoped(
        &self,
        booking_id: i64,
        caller_user_id: i64,
        caller_is_admin: bool,
    ) -> CoreResult<Booking> {
        let found = if caller_is_admin {
            self.bookings.get_booking(booking_id).await
        } else {
            self.bookings.get_booking_for_user(booking_id, caller_user_id).await
        }
        .map_err(|e| CoreError::internal("get_booking", booking_id, e))?;

        found.ok_or(CoreError::NotFound("booking"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::{MemoryStore, RecordingNotifier};

    fn lifecycle(store: &Arc<MemoryStore>) -> (BookingLifecycle, Arc<RecordingNotifier>) {
        let cache = Arc::new(RecordingNotifier::default());
        let svc = BookingLifecycle::new(store.clone(), store.clone(), cache.clone());
        (svc, cache)
    }

    #[tokio::test]
    async fn test_create_booking_prices_from_tour() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(5000, Some(3), None);
        let (svc, cache) = lifecycle(&store);

        let booking = svc.create_booking(1, tour_id, 4, None).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_price, 20000);
        assert_eq!(cache.seen(), vec![CacheScope::Bookings]);
    }

    #[tokio::test]
    async fn test_create_booking_rejects_zero_guests() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(5000, None, None);
        let (svc, _) = lifecycle(&store);

        let err = svc.create_booking(1, tour_id, 0, None).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_twice_fails_second_time() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(5000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        let (svc, _) = lifecycle(&store);

        // First cancel succeeds
        let cancelled = svc.cancel(booking_id, 1, false).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        // Second is rejected, status unchanged
        let err = svc.cancel(booking_id, 1, false).await.unwrap_err();
        match err {
            CoreError::InvalidState(msg) => assert_eq!(msg, "already cancelled"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.booking_status(booking_id), Some(BookingStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_foreign_booking_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(5000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        let (svc, _) = lifecycle(&store);

        let err = svc.cancel(booking_id, 2, false).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(store.booking_status(booking_id), Some(BookingStatus::Confirmed));
    }

    #[tokio::test]
    async fn test_admin_can_cancel_any_booking() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(5000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Pending);
        let (svc, _) = lifecycle(&store);

        let cancelled = svc.cancel(booking_id, 99, true).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_delete_owner_and_missing() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(5000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Pending);
        let (svc, _) = lifecycle(&store);

        svc.delete(booking_id, 1, false).await.unwrap();
        assert_eq!(store.booking_status(booking_id), None);

        let err = svc.delete(booking_id, 1, false).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_foreign_booking_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(5000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Pending);
        let (svc, _) = lifecycle(&store);

        let err = svc.delete(booking_id, 2, false).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(store.booking_status(booking_id), Some(BookingStatus::Pending));
    }

    #[tokio::test]
    async fn test_update_status_override() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour(5000, None, None);
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Cancelled);
        let (svc, _) = lifecycle(&store);

        // Moderation may leave CANCELLED, unlike caller-initiated transitions
        let updated = svc.update_status(booking_id, BookingStatus::Confirmed).await.unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);

        let err = svc.update_status(9999, BookingStatus::Pending).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
