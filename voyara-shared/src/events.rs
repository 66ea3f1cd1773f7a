use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Downstream caches that can be told to refresh after a mutation.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheScope {
    Bookings,
    Tours,
    Users,
}

impl CacheScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheScope::Bookings => "BOOKINGS",
            CacheScope::Tours => "TOURS",
            CacheScope::Users => "USERS",
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CacheInvalidation {
    pub event_id: Uuid,
    pub scope: CacheScope,
    pub emitted_at: DateTime<Utc>,
}

impl CacheInvalidation {
    pub fn new(scope: CacheScope) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            scope,
            emitted_at: Utc::now(),
        }
    }
}
