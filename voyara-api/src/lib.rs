use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod reviews;
pub mod state;
pub mod tours;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let session_routes = Router::new()
        .merge(bookings::routes())
        .merge(payments::routes())
        .merge(reviews::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_middleware,
        ));

    let admin_routes = admin::routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::admin_middleware,
    ));

    Router::new()
        .merge(tours::routes())
        .merge(session_routes)
        .merge(admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
