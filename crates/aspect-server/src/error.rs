//! Error taxonomy for aspect resolution and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum AspectError {
    /// Malformed or out-of-range input. Never retried.
    #[error("{0}")]
    Validation(String),
    /// Upstream elevation service failure. Retryable by the caller.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Unexpected defect.
    #[error("{0}")]
    Internal(String),
}

impl AspectError {
    pub fn status(&self) -> StatusCode {
        match self {
            AspectError::Validation(_) => StatusCode::BAD_REQUEST,
            AspectError::Provider(_) => StatusCode::BAD_GATEWAY,
            AspectError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            AspectError::Validation(_) => "Invalid request",
            AspectError::Provider(_) => "Elevation provider error",
            AspectError::Internal(_) => "Error calculating terrain aspect",
        }
    }
}

impl IntoResponse for AspectError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AspectError::Internal(_) => tracing::error!("Internal aspect error: {}", self),
            AspectError::Provider(_) => tracing::warn!("Provider error: {}", self),
            AspectError::Validation(_) => tracing::debug!("Rejected request: {}", self),
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.summary(),
                "details": self.to_string(),
            })),
        )
            .into_response()
    }
}
