use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use voyara_booking::{CardDetails, PaymentReceipt};
use voyara_core::models::{Payment, PaymentMethod};
use voyara_core::session::Session;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    pub payment_method: PaymentMethod,
    /// Opaque card payload, required by a future gateway, ignored for
    /// internet banking. Never persisted.
    pub card: Option<CardDetails>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/{id}/payment", get(get_payment).post(submit_payment))
}

async fn get_payment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<i64>,
) -> Result<Json<Payment>, AppError> {
    let payment = state
        .payments
        .payment_for_booking(booking_id, session.user_id, session.is_admin())
        .await?;
    Ok(Json(payment))
}

async fn submit_payment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<i64>,
    Json(req): Json<SubmitPaymentRequest>,
) -> Result<Json<PaymentReceipt>, AppError> {
    let receipt = state
        .payments
        .submit_payment(booking_id, session.user_id, req.payment_method, req.card)
        .await?;
    Ok(Json(receipt))
}
