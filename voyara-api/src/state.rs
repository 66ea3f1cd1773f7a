use std::sync::Arc;

use voyara_booking::{BookingLifecycle, PaymentProcessor, ReviewEvaluator};
use voyara_core::repository::TourStore;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<BookingLifecycle>,
    pub payments: Arc<PaymentProcessor>,
    pub reviews: Arc<ReviewEvaluator>,
    pub tours: Arc<dyn TourStore>,
    pub auth: AuthConfig,
}
