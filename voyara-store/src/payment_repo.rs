use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use voyara_core::models::{Payment, PaymentMethod, PaymentStatus};
use voyara_core::repository::{PaymentStore, RepoError};

pub struct SqlPaymentStore {
    pool: PgPool,
}

impl SqlPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    booking_id: i64,
    amount: i64,
    payment_method: String,
    status: String,
    transaction_id: Option<String>,
    paid_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

const PAYMENT_COLS: &str = "id, booking_id, amount, payment_method, status, transaction_id, paid_at, created_at, updated_at";

fn map_payment(row: PaymentRow) -> Result<Payment, RepoError> {
    let status = PaymentStatus::parse(&row.status)
        .ok_or_else(|| format!("unknown payment status: {}", row.status))?;
    let payment_method = PaymentMethod::parse(&row.payment_method)
        .ok_or_else(|| format!("unknown payment method: {}", row.payment_method))?;
    Ok(Payment {
        id: row.id,
        booking_id: row.booking_id,
        amount: row.amount,
        payment_method,
        status,
        transaction_id: row.transaction_id,
        paid_at: row.paid_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl PaymentStore for SqlPaymentStore {
    async fn get_payment_by_booking(
        &self,
        booking_id: i64,
    ) -> Result<Option<Payment>, RepoError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLS} FROM payments WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_payment).transpose()
    }

    async fn create_pending_payment(
        &self,
        booking_id: i64,
        amount: i64,
        method: PaymentMethod,
    ) -> Result<Option<Payment>, RepoError> {
        // The unique key on booking_id decides concurrent submissions; the
        // loser gets no row back instead of a constraint error.
        let row = sqlx::query_as::<_, PaymentRow>(
            "INSERT INTO payments (booking_id, amount, payment_method, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (booking_id) DO NOTHING
             RETURNING id, booking_id, amount, payment_method, status, transaction_id, paid_at, created_at, updated_at",
        )
        .bind(booking_id)
        .bind(amount)
        .bind(method.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_payment).transpose()
    }

    async fn complete_payment(
        &self,
        booking_id: i64,
        transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, RepoError> {
        // COMPLETED is absorbing: the guard keeps a second submission from
        // overwriting the original transaction reference.
        let row = sqlx::query_as::<_, PaymentRow>(
            "UPDATE payments
             SET status = $2, transaction_id = $3, paid_at = $4, updated_at = NOW()
             WHERE booking_id = $1 AND status <> $2
             RETURNING id, booking_id, amount, payment_method, status, transaction_id, paid_at, created_at, updated_at",
        )
        .bind(booking_id)
        .bind(PaymentStatus::Completed.as_str())
        .bind(transaction_id)
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_payment).transpose()
    }
}
