//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use belfry_domain::error::BelfryError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`BelfryError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(BelfryError),
    /// The request body lacks what the endpoint needs.
    MissingParameters(&'static str),
}

impl From<BelfryError> for ApiError {
    fn from(err: BelfryError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MissingParameters(msg) => (StatusCode::UNPROCESSABLE_ENTITY, (*msg).to_string()),
            Self::Domain(BelfryError::Validation(err)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            Self::Domain(BelfryError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(err @ (BelfryError::Storage(_) | BelfryError::Actuator(_))) => {
                tracing::error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
