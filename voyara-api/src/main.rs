use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voyara_api::{app, state::{AppState, AuthConfig}};
use voyara_booking::{BookingLifecycle, PaymentProcessor, ReviewEvaluator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voyara_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = voyara_store::app_config::Config::load()?;
    tracing::info!("Starting Voyara API on port {}", config.server.port);

    let db = voyara_store::DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    // Cache invalidation drain task
    let cache = Arc::new(voyara_store::CacheQueue::start());

    let booking_store = Arc::new(voyara_store::SqlBookingStore::new(db.pool.clone()));
    let payment_store = Arc::new(voyara_store::SqlPaymentStore::new(db.pool.clone()));
    let review_store = Arc::new(voyara_store::SqlReviewStore::new(db.pool.clone()));
    let tour_store = Arc::new(voyara_store::SqlTourStore::new(db.pool.clone()));

    let state = AppState {
        lifecycle: Arc::new(BookingLifecycle::new(
            booking_store.clone(),
            tour_store.clone(),
            cache.clone(),
        )),
        payments: Arc::new(PaymentProcessor::new(
            booking_store.clone(),
            payment_store,
            cache.clone(),
        )),
        reviews: Arc::new(ReviewEvaluator::new(booking_store, review_store, cache)),
        tours: tour_store,
        auth: AuthConfig { secret: config.auth.jwt_secret.clone() },
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
