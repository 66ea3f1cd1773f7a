use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use voyara_core::cache::{CacheNotifier, CacheScope};
use voyara_core::models::{Booking, BookingStatus, BookingWithTour, PaymentStatus, Review, Tour};
use voyara_core::repository::{BookingStore, ReviewStore};
use voyara_core::{CoreError, CoreResult};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// The date the trip counts as completed: tour start (falling back to the
/// booking date) plus the tour duration, never less than one day.
pub fn completion_date(
    start_date: Option<DateTime<Utc>>,
    booking_date: DateTime<Utc>,
    duration_days: Option<i32>,
) -> DateTime<Utc> {
    let start = start_date.unwrap_or(booking_date);
    let days = i64::from(duration_days.unwrap_or(0).max(1));
    start + Duration::days(days)
}

/// A booking may be reviewed once the trip has completed, the booking is
/// confirmed, and its payment has settled.
pub fn is_eligible(candidate: &BookingWithTour, now: DateTime<Utc>) -> bool {
    let completed = completion_date(
        candidate.tour.start_date,
        candidate.booking.booking_date,
        candidate.tour.duration_days,
    );
    now >= completed
        && candidate.booking.status == BookingStatus::Confirmed
        && candidate.payment_status == Some(PaymentStatus::Completed)
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibleBooking {
    pub booking: Booking,
    pub tour: Tour,
    pub review: Option<Review>,
}

/// Computes review eligibility and owns the one-review-per-(user, tour)
/// upsert.
pub struct ReviewEvaluator {
    bookings: Arc<dyn BookingStore>,
    reviews: Arc<dyn ReviewStore>,
    cache: Arc<dyn CacheNotifier>,
}

impl ReviewEvaluator {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        reviews: Arc<dyn ReviewStore>,
        cache: Arc<dyn CacheNotifier>,
    ) -> Self {
        Self { bookings, reviews, cache }
    }

    /// The caller's booking enriched with its tour snapshot and any review
    /// they already wrote for the tour. Ineligible bookings get a single
    /// opaque refusal, with no finer reason disclosed.
    pub async fn eligible_booking(
        &self,
        booking_id: i64,
        caller_user_id: i64,
    ) -> CoreResult<EligibleBooking> {
        let candidate = self
            .bookings
            .get_booking_with_tour(booking_id, caller_user_id)
            .await
            .map_err(|e| CoreError::internal("review_eligibility", booking_id, e))?
            .ok_or(CoreError::NotFound("booking"))?;

        if !is_eligible(&candidate, Utc::now()) {
            return Err(CoreError::invalid_state("booking is not eligible for review"));
        }

        let review = self
            .reviews
            .get_review(caller_user_id, candidate.tour.id)
            .await
            .map_err(|e| CoreError::internal("review_eligibility", booking_id, e))?;

        Ok(EligibleBooking { booking: candidate.booking, tour: candidate.tour, review })
    }

    /// Write or overwrite the caller's single review for a tour. Rating
    /// bounds are enforced here so invalid data never reaches storage; the
    /// storage unique key makes the overwrite race-safe.
    pub async fn upsert_review(
        &self,
        caller_user_id: i64,
        tour_id: i64,
        rating: i32,
        comment: Option<&str>,
    ) -> CoreResult<Review> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(CoreError::validation("rating must be between 1 and 5"));
        }

        let candidates = self
            .bookings
            .list_bookings_for_tour(caller_user_id, tour_id)
            .await
            .map_err(|e| CoreError::internal("upsert_review", tour_id, e))?;

        let now = Utc::now();
        if !candidates.iter().any(|candidate| is_eligible(candidate, now)) {
            return Err(CoreError::invalid_state("booking is not eligible for review"));
        }

        let review = self
            .reviews
            .upsert_review(caller_user_id, tour_id, rating, comment)
            .await
            .map_err(|e| CoreError::internal("upsert_review", tour_id, e))?;

        info!(user_id = caller_user_id, tour_id, rating, "review upserted");
        self.cache.notify(CacheScope::Tours);
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::{MemoryStore, RecordingNotifier};
    use chrono::TimeZone;

    fn evaluator(store: &Arc<MemoryStore>) -> ReviewEvaluator {
        ReviewEvaluator::new(
            store.clone(),
            store.clone(),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap()
    }

    fn candidate(
        start_date: Option<DateTime<Utc>>,
        booking_date: DateTime<Utc>,
        duration_days: Option<i32>,
        status: BookingStatus,
        payment_status: Option<PaymentStatus>,
    ) -> BookingWithTour {
        BookingWithTour {
            booking: Booking {
                id: 1,
                user_id: 1,
                tour_id: 7,
                status,
                num_guests: 2,
                total_price: 10000,
                booking_date,
                created_at: booking_date,
                updated_at: booking_date,
            },
            tour: Tour {
                id: 7,
                title: "Fjord crossing".to_string(),
                location: "Bergen".to_string(),
                price: 5000,
                duration_days,
                start_date,
                created_at: booking_date,
            },
            payment_status,
        }
    }

    #[test]
    fn test_completion_date_from_start_and_duration() {
        // start = D, duration 5: ineligible at D+4, eligible at D+5
        let c = candidate(
            Some(day(1)),
            day(1),
            Some(5),
            BookingStatus::Confirmed,
            Some(PaymentStatus::Completed),
        );
        assert!(!is_eligible(&c, day(5)));
        assert!(is_eligible(&c, day(6)));
    }

    #[test]
    fn test_completion_date_defaults_to_booking_date_plus_one() {
        let completed = completion_date(None, day(10), None);
        assert_eq!(completed, day(11));
    }

    #[test]
    fn test_eligibility_requires_confirmed_and_paid() {
        let now = day(20);
        let paid_pending = candidate(
            Some(day(1)),
            day(1),
            Some(2),
            BookingStatus::Pending,
            Some(PaymentStatus::Completed),
        );
        let unpaid_confirmed =
            candidate(Some(day(1)), day(1), Some(2), BookingStatus::Confirmed, None);
        let pending_payment = candidate(
            Some(day(1)),
            day(1),
            Some(2),
            BookingStatus::Confirmed,
            Some(PaymentStatus::Pending),
        );
        assert!(!is_eligible(&paid_pending, now));
        assert!(!is_eligible(&unpaid_confirmed, now));
        assert!(!is_eligible(&pending_payment, now));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_single_row() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour_with_id(7, 5000, Some(1), Some(day(1)));
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        store.seed_completed_payment(booking_id);
        let svc = evaluator(&store);

        svc.upsert_review(1, tour_id, 4, Some("ok")).await.unwrap();
        let second = svc.upsert_review(1, tour_id, 2, Some("meh")).await.unwrap();

        assert_eq!(second.rating, 2);
        assert_eq!(second.comment.as_deref(), Some("meh"));
        assert_eq!(store.review_count(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_out_of_range_rating() {
        let store = Arc::new(MemoryStore::new());
        let svc = evaluator(&store);

        for rating in [0, 6, -3] {
            let err = svc.upsert_review(1, 7, rating, None).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_upsert_requires_eligible_booking() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour_with_id(7, 5000, Some(1), Some(day(1)));
        // Confirmed but unpaid
        store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        let svc = evaluator(&store);

        let err = svc.upsert_review(1, tour_id, 4, Some("ok")).await.unwrap_err();
        match err {
            CoreError::InvalidState(msg) => {
                assert_eq!(msg, "booking is not eligible for review")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.review_count(), 0);
    }

    #[tokio::test]
    async fn test_eligible_booking_carries_existing_review() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour_with_id(7, 5000, Some(1), Some(day(1)));
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        store.seed_completed_payment(booking_id);
        let svc = evaluator(&store);

        let before = svc.eligible_booking(booking_id, 1).await.unwrap();
        assert!(before.review.is_none());

        svc.upsert_review(1, tour_id, 5, Some("great")).await.unwrap();
        let after = svc.eligible_booking(booking_id, 1).await.unwrap();
        assert_eq!(after.review.map(|r| r.rating), Some(5));
    }

    #[tokio::test]
    async fn test_eligible_booking_scoped_to_owner() {
        let store = Arc::new(MemoryStore::new());
        let tour_id = store.seed_tour_with_id(7, 5000, Some(1), Some(day(1)));
        let booking_id = store.seed_booking(1, tour_id, BookingStatus::Confirmed);
        store.seed_completed_payment(booking_id);
        let svc = evaluator(&store);

        let err = svc.eligible_booking(booking_id, 2).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
