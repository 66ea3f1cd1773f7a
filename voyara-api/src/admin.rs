use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use voyara_core::models::{Booking, BookingStatus};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub limit: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/bookings", get(list_bookings))
        .route("/v1/admin/bookings/{id}/status", patch(update_status))
}

/// GET /v1/admin/bookings
/// Newest bookings across all users, for moderation
async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state
        .lifecycle
        .recent_bookings(query.limit.unwrap_or(50).clamp(1, 200))
        .await?;
    Ok(Json(bookings))
}

/// PATCH /v1/admin/bookings/:id/status
/// Moderation override for any booking status
async fn update_status(
    State(state): State<AppState>,
    Path(booking_id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.lifecycle.update_status(booking_id, req.status).await?;
    Ok(Json(booking))
}
