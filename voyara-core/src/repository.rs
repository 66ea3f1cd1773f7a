use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    Booking, BookingStatus, BookingWithTour, NewBooking, Payment, PaymentMethod, Review, Tour,
};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for tour catalog reads
#[async_trait]
pub trait TourStore: Send + Sync {
    async fn get_tour(&self, id: i64) -> Result<Option<Tour>, RepoError>;

    async fn list_tours(&self) -> Result<Vec<Tour>, RepoError>;
}

/// Repository trait for booking data access.
///
/// The `_for_user` variants scope the row by `(id, user_id)` so a non-owned
/// booking is indistinguishable from a missing one. Status mutations are
/// single conditional statements; a `None`/`false` return means no row
/// matched the condition, and the caller decides what that means.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, RepoError>;

    async fn get_booking(&self, id: i64) -> Result<Option<Booking>, RepoError>;

    async fn get_booking_for_user(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Booking>, RepoError>;

    async fn list_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, RepoError>;

    async fn list_recent_bookings(&self, limit: i64) -> Result<Vec<Booking>, RepoError>;

    /// Atomically move the booking to `to` iff its current status is one of
    /// `from`. Returns the updated row, or `None` when no row satisfied the
    /// condition.
    async fn transition_status(
        &self,
        id: i64,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<Option<Booking>, RepoError>;

    /// Unconditional status write (admin moderation). `None` when the
    /// booking does not exist.
    async fn set_status(&self, id: i64, to: BookingStatus)
        -> Result<Option<Booking>, RepoError>;

    async fn delete_booking(&self, id: i64) -> Result<bool, RepoError>;

    async fn delete_booking_for_user(&self, id: i64, user_id: i64) -> Result<bool, RepoError>;

    async fn get_booking_with_tour(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<BookingWithTour>, RepoError>;

    /// All of a user's bookings for one tour, joined with the tour snapshot
    /// and payment status. Feeds the review eligibility check.
    async fn list_bookings_for_tour(
        &self,
        user_id: i64,
        tour_id: i64,
    ) -> Result<Vec<BookingWithTour>, RepoError>;
}

/// Repository trait for payment data access. Uniqueness per booking is a
/// storage constraint; `create_pending_payment` reports a conflict as
/// `None` instead of erroring so concurrent submissions converge.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn get_payment_by_booking(&self, booking_id: i64)
        -> Result<Option<Payment>, RepoError>;

    /// Insert a PENDING payment unless one already exists for the booking.
    async fn create_pending_payment(
        &self,
        booking_id: i64,
        amount: i64,
        method: PaymentMethod,
    ) -> Result<Option<Payment>, RepoError>;

    /// Move the booking's payment to COMPLETED iff it is not completed yet.
    /// `None` when there is no payment row or it is already completed.
    async fn complete_payment(
        &self,
        booking_id: i64,
        transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, RepoError>;
}

/// Repository trait for review data access. The (user, tour) unique key is
/// a storage constraint; `upsert_review` overwrites on conflict.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn get_review(&self, user_id: i64, tour_id: i64) -> Result<Option<Review>, RepoError>;

    async fn upsert_review(
        &self,
        user_id: i64,
        tour_id: i64,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, RepoError>;
}
