use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to load captioning model: {0}")]
    ModelLoad(String),

    #[error("Caption generation failed: {0}")]
    Inference(String),

    #[error("The model produced an empty caption")]
    EmptyCaption,

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load image from URL: {0}")]
    Fetch(String),

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Unsupported image format: {0} (expected PNG or JPEG)")]
    UnsupportedFormat(String),

    #[error("Image is larger than the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("No image was provided")]
    MissingImage,

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Inference(_) | AppError::EmptyCaption | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
            AppError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidUrl(_)
            | AppError::Decode(_)
            | AppError::UnsupportedFormat(_)
            | AppError::MissingImage
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {}", err))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        } else {
            tracing::warn!("⚠️ {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_failures_read_like_the_ui_message() {
        let err = AppError::Fetch("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to load image from URL: connection refused"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn client_mistakes_are_bad_requests() {
        assert_eq!(AppError::MissingImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::UnsupportedFormat("Gif".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::TooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn model_load_failure_is_unavailable() {
        let err = AppError::ModelLoad("missing encoder".into());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_string().starts_with("Failed to load captioning model"));
    }
}
