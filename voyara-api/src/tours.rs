use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use voyara_core::models::Tour;
use voyara_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tours", get(list_tours))
        .route("/v1/tours/{id}", get(get_tour))
}

async fn list_tours(State(state): State<AppState>) -> Result<Json<Vec<Tour>>, AppError> {
    let tours = state
        .tours
        .list_tours()
        .await
        .map_err(|e| CoreError::internal("list_tours", 0, e))?;
    Ok(Json(tours))
}

async fn get_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<i64>,
) -> Result<Json<Tour>, AppError> {
    let tour = state
        .tours
        .get_tour(tour_id)
        .await
        .map_err(|e| CoreError::internal("get_tour", tour_id, e))?
        .ok_or(CoreError::NotFound("tour"))?;
    Ok(Json(tour))
}
