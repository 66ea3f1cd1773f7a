use axum::{
    extract::{Path, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use voyara_booking::EligibleBooking;
use voyara_core::models::Review;
use voyara_core::session::Session;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpsertReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/{id}/review-eligibility", get(review_eligibility))
        .route("/v1/tours/{id}/review", put(upsert_review))
}

async fn review_eligibility(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(booking_id): Path<i64>,
) -> Result<Json<EligibleBooking>, AppError> {
    let eligible = state.reviews.eligible_booking(booking_id, session.user_id).await?;
    Ok(Json(eligible))
}

async fn upsert_review(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(tour_id): Path<i64>,
    Json(req): Json<UpsertReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let review = state
        .reviews
        .upsert_review(session.user_id, tour_id, req.rating, req.comment.as_deref())
        .await?;
    Ok(Json(review))
}
