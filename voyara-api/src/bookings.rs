use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use voyara_core::models::Booking;
use voyara_core::session::Session;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub tour_id: i64,
    pub num_guests: i32,
    pub booking_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking_id: i64,
    status: String,
    total_price: i64,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.id,
            status: booking.status.to_string(),
            total_price: booking.total_price,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking).delete(delete_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .lifecycle
        .create_booking(session.user_id, req.tour_id, req.num_guests, req.booking_date)
        .await?;

    info!(booking_id = booking.id, "booking committed");
    Ok(Json(booking.into()))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.lifecycle.bookings_for_user(session.user_id).await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .lifecycle
        .get_booking(booking_id, session.user_id, session.is_admin())
        .await?;
    Ok(Json(booking))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<i64>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .lifecycle
        .cancel(booking_id, session.user_id, session.is_admin())
        .await?;
    Ok(Json(booking.into()))
}

async fn delete_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state
        .lifecycle
        .delete(booking_id, session.user_id, session.is_admin())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
