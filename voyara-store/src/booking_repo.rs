use async_trait::async_trait;
use sqlx::PgPool;

use voyara_core::models::{
    Booking, BookingStatus, BookingWithTour, NewBooking, PaymentStatus, Tour,
};
use voyara_core::repository::{BookingStore, RepoError};

pub struct SqlBookingStore {
    pool: PgPool,
}

impl SqlBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    user_id: i64,
    tour_id: i64,
    status: String,
    num_guests: i32,
    total_price: i64,
    booking_date: chrono::DateTime<chrono::Utc>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
struct BookingTourRow {
    id: i64,
    user_id: i64,
    tour_id: i64,
    status: String,
    num_guests: i32,
    total_price: i64,
    booking_date: chrono::DateTime<chrono::Utc>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    tour_title: String,
    tour_location: String,
    tour_price: i64,
    duration_days: Option<i32>,
    start_date: Option<chrono::DateTime<chrono::Utc>>,
    tour_created_at: chrono::DateTime<chrono::Utc>,
    payment_status: Option<String>,
}

const BOOKING_COLS: &str =
    "id, user_id, tour_id, status, num_guests, total_price, booking_date, created_at, updated_at";

const BOOKING_TOUR_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.tour_id, b.status, b.num_guests, b.total_price,
           b.booking_date, b.created_at, b.updated_at,
           t.title AS tour_title, t.location AS tour_location, t.price AS tour_price,
           t.duration_days, t.start_date, t.created_at AS tour_created_at,
           p.status AS payment_status
    FROM bookings b
    JOIN tours t ON t.id = b.tour_id
    LEFT JOIN payments p ON p.booking_id = b.id
"#;

fn map_booking(row: BookingRow) -> Result<Booking, RepoError> {
    let status = BookingStatus::parse(&row.status)
        .ok_or_else(|| format!("unknown booking status: {}", row.status))?;
    Ok(Booking {
        id: row.id,
        user_id: row.user_id,
        tour_id: row.tour_id,
        status,
        num_guests: row.num_guests,
        total_price: row.total_price,
        booking_date: row.booking_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn map_booking_tour(row: BookingTourRow) -> Result<BookingWithTour, RepoError> {
    let status = BookingStatus::parse(&row.status)
        .ok_or_else(|| format!("unknown booking status: {}", row.status))?;
    let payment_status = match row.payment_status {
        Some(s) => Some(
            PaymentStatus::parse(&s).ok_or_else(|| format!("unknown payment status: {s}"))?,
        ),
        None => None,
    };
    Ok(BookingWithTour {
        booking: Booking {
            id: row.id,
            user_id: row.user_id,
            tour_id: row.tour_id,
            status,
            num_guests: row.num_guests,
            total_price: row.total_price,
            booking_date: row.booking_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
        tour: Tour {
            id: row.tour_id,
            title: row.tour_title,
            location: row.tour_location,
            price: row.tour_price,
            duration_days: row.duration_days,
            start_date: row.start_date,
            created_at: row.tour_created_at,
        },
        payment_status,
    })
}

#[async_trait]
impl BookingStore for SqlBookingStore {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, RepoError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "INSERT INTO bookings (user_id, tour_id, status, num_guests, total_price, booking_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, user_id, tour_id, status, num_guests, total_price, booking_date, created_at, updated_at",
        )
        .bind(booking.user_id)
        .bind(booking.tour_id)
        .bind(BookingStatus::Pending.as_str())
        .bind(booking.num_guests)
        .bind(booking.total_price)
        .bind(booking.booking_date)
        .fetch_one(&self.pool)
        .await?;

        map_booking(row)
    }

    async fn get_booking(&self, id: i64) -> Result<Option<Booking>, RepoError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_booking).transpose()
    }

    async fn get_booking_for_user(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Booking>, RepoError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLS} FROM bookings WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_booking).transpose()
    }

    async fn list_bookings_for_user(&self, user_id: i64) -> Result<Vec<Booking>, RepoError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_booking).collect()
    }

    async fn list_recent_bookings(&self, limit: i64) -> Result<Vec<Booking>, RepoError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLS} FROM bookings ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_booking).collect()
    }

    async fn transition_status(
        &self,
        id: i64,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<Option<Booking>, RepoError> {
        // Single conditional statement; concurrent transitions on the same
        // booking are serialized by the row lock and the loser matches zero
        // rows.
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let row = sqlx::query_as::<_, BookingRow>(
            "UPDATE bookings SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status = ANY($3)
             RETURNING id, user_id, tour_id, status, num_guests, total_price, booking_date, created_at, updated_at",
        )
        .bind(id)
        .bind(to.as_str())
        .bind(from)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_booking).transpose()
    }

    async fn set_status(
        &self,
        id: i64,
        to: BookingStatus,
    ) -> Result<Option<Booking>, RepoError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "UPDATE bookings SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING id, user_id, tour_id, status, num_guests, total_price, booking_date, created_at, updated_at",
        )
        .bind(id)
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_booking).transpose()
    }

    async fn delete_booking(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_booking_for_user(&self, id: i64, user_id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_booking_with_tour(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<BookingWithTour>, RepoError> {
        let row = sqlx::query_as::<_, BookingTourRow>(&format!(
            "{BOOKING_TOUR_SELECT} WHERE b.id = $1 AND b.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_booking_tour).transpose()
    }

    async fn list_bookings_for_tour(
        &self,
        user_id: i64,
        tour_id: i64,
    ) -> Result<Vec<BookingWithTour>, RepoError> {
        let rows = sqlx::query_as::<_, BookingTourRow>(&format!(
            "{BOOKING_TOUR_SELECT} WHERE b.user_id = $1 AND b.tour_id = $2 ORDER BY b.created_at DESC"
        ))
        .bind(user_id)
        .bind(tour_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_booking_tour).collect()
    }
}
