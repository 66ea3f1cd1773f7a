use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use voyara_core::CoreError;

/// HTTP boundary wrapper around the domain error taxonomy. Internal faults
/// are logged where they happen; by the time they reach here only the
/// opaque kind is left.
#[derive(Debug)]
pub struct AppError(CoreError);

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.0 {
            CoreError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            CoreError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            CoreError::InvalidState(msg) => (StatusCode::CONFLICT, msg),
            CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            CoreError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_maps_to_status_codes() {
        let cases = [
            (CoreError::Unauthorized, StatusCode::UNAUTHORIZED),
            (CoreError::NotFound("booking"), StatusCode::NOT_FOUND),
            (
                CoreError::invalid_state("already cancelled"),
                StatusCode::CONFLICT,
            ),
            (
                CoreError::validation("rating must be between 1 and 5"),
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
