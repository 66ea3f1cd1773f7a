pub mod cache;
pub mod models;
pub mod repository;
pub mod session;

/// Closed error taxonomy for every public operation in the booking core.
/// Callers pattern-match on the kind; `Internal` deliberately carries no
/// payload so store/notifier error text never reaches a caller.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Validation(String),
    #[error("internal error")]
    Internal,
}

impl CoreError {
    pub fn invalid_state(msg: &str) -> Self {
        CoreError::InvalidState(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        CoreError::Validation(msg.to_string())
    }

    /// Log an underlying fault with its operation context, then collapse it
    /// to the opaque `Internal` kind.
    pub fn internal(
        action: &'static str,
        entity_id: i64,
        err: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        tracing::error!(action, entity_id, error = %err, "operation failed");
        CoreError::Internal
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
