use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Title not found: {0}")]
    TitleNotFound(String),

    #[error("Row index {index} out of range for catalog of {len} titles")]
    InvalidIndex { index: usize, len: usize },

    #[error("Catalog out of sync: {0}")]
    Desync(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::HttpClient(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            AppError::Timeout(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::TitleNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidIndex { .. } | AppError::Desync(_) => {
                tracing::error!(error = %self, "Catalog desync detected, artifact reload required");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Artifact(_) | AppError::Cache(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::HttpClient(_) | AppError::UpstreamStatus { .. } => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_not_found_maps_to_404() {
        let response = AppError::TitleNotFound("Nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_argument_maps_to_400() {
        let response = AppError::InvalidArgument("k must be positive".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_desync_maps_to_500() {
        let response = AppError::InvalidIndex { index: 9, len: 4 }.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_status_transient() {
        let server_error = AppError::UpstreamStatus {
            status: 503,
            body: String::new(),
        };
        let not_found = AppError::UpstreamStatus {
            status: 404,
            body: String::new(),
        };
        assert!(server_error.is_transient());
        assert!(!not_found.is_transient());
        assert!(!AppError::TitleNotFound("x".to_string()).is_transient());
    }
}
