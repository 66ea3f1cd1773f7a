use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Booking status in the lifecycle. CANCELLED is terminal for
/// caller-initiated transitions; admin moderation may set any status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status. COMPLETED is absorbing: once reached, no further
/// submission may touch the record. FAILED is reserved for a future
/// gateway integration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    InternetBanking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::InternetBanking => "INTERNET_BANKING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CARD" => Some(PaymentMethod::Card),
            "INTERNET_BANKING" => Some(PaymentMethod::InternetBanking),
            _ => None,
        }
    }
}

/// Catalog snapshot of a tour. The booking core only reads tours; catalog
/// management lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub id: i64,
    pub title: String,
    pub location: String,
    /// Per-guest price in minor units.
    pub price: i64,
    pub duration_days: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A reservation of a tour by a user, carrying its own status independent
/// of payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub tour_id: i64,
    pub status: BookingStatus,
    pub num_guests: i32,
    pub total_price: i64,
    pub booking_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Caller-initiated cancellation is only legal out of these states.
    pub fn is_cancellable(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

/// Insert payload for a new booking. Ids and timestamps are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub tour_id: i64,
    pub num_guests: i32,
    pub total_price: i64,
    pub booking_date: DateTime<Utc>,
}

/// The monetary settlement record for exactly one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's rating for a tour; at most one row per (user, tour).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub tour_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking joined with its tour snapshot and the status of its payment,
/// as needed by the review eligibility check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingWithTour {
    pub booking: Booking,
    pub tour: Tour,
    pub payment_status: Option<PaymentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("REFUNDED"), None);
    }

    #[test]
    fn test_cancellable_states() {
        let mut booking = Booking {
            id: 1,
            user_id: 1,
            tour_id: 1,
            status: BookingStatus::Pending,
            num_guests: 2,
            total_price: 10000,
            booking_date: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(booking.is_cancellable());
        booking.status = BookingStatus::Confirmed;
        assert!(booking.is_cancellable());
        booking.status = BookingStatus::Cancelled;
        assert!(!booking.is_cancellable());
    }
}
