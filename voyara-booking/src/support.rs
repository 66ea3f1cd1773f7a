//! In-memory store implementations backing the service tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use voyara_core::cache::{CacheNotifier, CacheScope};
use voyara_core::models::{
    Booking, BookingStatus, BookingWithTour, NewBooking, Payment, PaymentMethod, PaymentStatus,
    Review, Tour,
};
use voyara_core::repository::{
    BookingStore, PaymentStore, RepoError, ReviewStore, TourStore,
};

#[derive(Default)]
pub struct RecordingNotifier {
    scopes: Mutex<Vec<CacheScope>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<CacheScope> {
        self.scopes.lock().unwrap().clone()
    }
}

impl CacheNotifier for RecordingNotifier {
    fn notify(&self, scope: CacheScope) {
        self.scopes.lock().unwrap().push(scope);
    }
}

/// One store for all entities, keyed the way the schema is: payments by
/// booking id (unique per booking), reviews by (user, tour).
pub struct MemoryStore {
    tours: Mutex<HashMap<i64, Tour>>,
    bookings: Mutex<HashMap<i64, Booking>>,
    payments: Mutex<HashMap<i64, Payment>>,
    reviews: Mutex<HashMap<(i64, i64), Review>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tours: Mutex::new(HashMap::new()),
            bookings: Mutex::new(HashMap::new()),
            payments: Mutex::new(HashMap::new()),
            reviews: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn seed_tour(
        &self,
        price: i64,
        duration_days: Option<i32>,
        start_date: Option<DateTime<Utc>>,
    ) -> i64 {
        let id = self.next_id();
        self.seed_tour_with_id(id, price, duration_days, start_date)
    }

    pub fn seed_tour_with_id(
        &self,
        id: i64,
        price: i64,
        duration_days: Option<i32>,
        start_date: Option<DateTime<Utc>>,
    ) -> i64 {
        self.tours.lock().unwrap().insert(
            id,
            Tour {
                id,
                title: format!("Tour {id}"),
                location: "Test Valley".to_string(),
                price,
                duration_days,
                start_date,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn seed_booking(&self, user_id: i64, tour_id: i64, status: BookingStatus) -> i64 {
        let id = self.next_id();
        let now = Utc::now();
        let price = self
            .tours
            .lock()
            .unwrap()
            .get(&tour_id)
            .map(|t| t.price)
            .unwrap_or(0);
        self.bookings.lock().unwrap().insert(
            id,
            Booking {
                id,
                user_id,
                tour_id,
                status,
                num_guests: 1,
                total_price: price,
                booking_date: now,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn seed_completed_payment(&self, booking_id: i64) -> i64 {
        let id = self.next_id();
        let now = Utc::now();
        let amount = self
            .bookings
            .lock()
            .unwrap()
            .get(&booking_id)
            .map(|b| b.total_price)
            .unwrap_or(0);
        self.payments.lock().unwrap().insert(
            booking_id,
            Payment {
                id,
                booking_id,
                amount,
                payment_method: PaymentMethod::Card,
                status: PaymentStatus::Completed,
                transaction_id: Some(format!("txn_seed_{booking_id}")),
                paid_at: Some(now),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn booking_status(&self, id: i64) -> Option<BookingStatus> {
        self.bookings.lock().unwrap().get(&id).map(|b| b.status)
    }

    pub fn payment_count(&self) -> usize {
        self.payments.lock().unwrap().len()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.lock().unwrap().len()
    }

    fn joined(&self, booking: &Booking) -> Option<BookingWithTour> {
        let tour = self.tours.lock().unwrap().get(&booking.tour_id).cloned()?;
        let payment_status = self
            .payments
            .lock()
            .unwrap()
            .get(&booking.id)
            .map(|p| p.status);
        Some(BookingWithTour { booking: booking.clone(), tour, payment_status })
    }
}

#[async_trait]
impl TourStore for MemoryStore {
    async fn get_tour(&self, id: i64) -> Result<Option<Tour>, RepoError> {
        Ok(self.tours.lock().unwrap().get(&id).cloned())
    }

    async fn list_tours(&self) -> Result<Vec<Tour>, RepoError> {
        Ok(self.tours.lock().unwrap().values().cloned().collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, RepoError> {
        let id = self.next_id();
        let now = Utc::now();
        let row = Booking {
            id,
            user_id: booking.user_id,
            tour_id: booking.tour_id,
            status: BookingStatus::Pending,
            num_guests: booking.num_guests,
            total_price: booking.total_price,
            booking_date: booking.booking_date,
            created_at: now,
            updated_at: now,
        };
        self.bookings.lock().unwrap().insert(id, row.clone());
        Ok(row)
    }

    async fn get_booking(&self, id: i64) -> Result<Option<Booking>, RepoError> {
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn get_booking_for_user(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Booking>, RepoError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .get(&id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    async fn list_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, RepoError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_recent_bookings(&self, limit: i64) -> Result<Vec<Booking>, RepoError> {
        let mut rows: Vec<Booking> = self.bookings.lock().unwrap().values().cloned().collect();
        rows.sort_by_key(|b| std::cmp::Reverse(b.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn transition_status(
        &self,
        id: i64,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<Option<Booking>, RepoError> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if from.contains(&b.status) => {
                b.status = to;
                b.updated_at = Utc::now();
                Ok(Some(b.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_status(
        &self,
        id: i64,
        to: BookingStatus,
    ) -> Result<Option<Booking>, RepoError> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) => {
                b.status = to;
                b.updated_at = Utc::now();
                Ok(Some(b.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_booking(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.bookings.lock().unwrap().remove(&id).is_some())
    }

    async fn delete_booking_for_user(&self, id: i64, user_id: i64) -> Result<bool, RepoError> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get(&id) {
            Some(b) if b.user_id == user_id => {
                bookings.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_booking_with_tour(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<BookingWithTour>, RepoError> {
        let booking = match self.get_booking_for_user(id, user_id).await? {
            Some(b) => b,
            None => return Ok(None),
        };
        Ok(self.joined(&booking))
    }

    async fn list_bookings_for_tour(
        &self,
        user_id: i64,
        tour_id: i64,
    ) -> Result<Vec<BookingWithTour>, RepoError> {
        let bookings: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id && b.tour_id == tour_id)
            .cloned()
            .collect();
        Ok(bookings.iter().filter_map(|b| self.joined(b)).collect())
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn get_payment_by_booking(
        &self,
        booking_id: i64,
    ) -> Result<Option<Payment>, RepoError> {
        Ok(self.payments.lock().unwrap().get(&booking_id).cloned())
    }

    async fn create_pending_payment(
        &self,
        booking_id: i64,
        amount: i64,
        method: PaymentMethod,
    ) -> Result<Option<Payment>, RepoError> {
        let mut payments = self.payments.lock().unwrap();
        if payments.contains_key(&booking_id) {
            return Ok(None);
        }
        let now = Utc::now();
        let row = Payment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            booking_id,
            amount,
            payment_method: method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        payments.insert(booking_id, row.clone());
        Ok(Some(row))
    }

    async fn complete_payment(
        &self,
        booking_id: i64,
        transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, RepoError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.get_mut(&booking_id) {
            Some(p) if p.status != PaymentStatus::Completed => {
                p.status = PaymentStatus::Completed;
                p.transaction_id = Some(transaction_id.to_string());
                p.paid_at = Some(paid_at);
                p.updated_at = Utc::now();
                Ok(Some(p.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn get_review(&self, user_id: i64, tour_id: i64) -> Result<Option<Review>, RepoError> {
        Ok(self.reviews.lock().unwrap().get(&(user_id, tour_id)).cloned())
    }

    async fn upsert_review(
        &self,
        user_id: i64,
        tour_id: i64,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, RepoError> {
        let mut reviews = self.reviews.lock().unwrap();
        let now = Utc::now();
        let row = reviews
            .entry((user_id, tour_id))
            .and_modify(|r| {
                r.rating = rating;
                r.comment = comment.map(str::to_string);
                r.updated_at = now;
            })
            .or_insert_with(|| Review {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                user_id,
                tour_id,
                rating,
                comment: comment.map(str::to_string),
                created_at: now,
                updated_at: now,
            });
        Ok(row.clone())
    }
}
