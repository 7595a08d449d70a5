use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{AppError, Result};
use crate::page;
use crate::service::{CaptionResponse, CaptionService};
use crate::source::ImageSource;

/// Room for multipart boundaries and headers on top of the image itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

pub fn router(service: Arc<CaptionService>) -> Router {
    let body_limit = (service.max_image_bytes() + MULTIPART_OVERHEAD) as usize;

    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_image))
        .route("/url", post(caption_url))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn index() -> Html<&'static str> {
    Html(page::INDEX_HTML)
}

async fn upload_image(
    State(service): State<Arc<CaptionService>>,
    mut multipart: Multipart,
) -> Result<Json<CaptionResponse>> {
    let limit = service.max_image_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("image") && field.file_name().is_none() {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        let response = service
            .caption(ImageSource::Upload {
                bytes: bytes.to_vec(),
                file_name,
                content_type,
            })
            .await?;
        return Ok(Json(response));
    }

    Err(AppError::MissingImage)
}

async fn caption_url(
    State(service): State<Arc<CaptionService>>,
    payload: std::result::Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<CaptionResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = service.caption(ImageSource::Url(request.url)).await?;
    Ok(Json(response))
}

async fn health(State(service): State<Arc<CaptionService>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: service.model().is_loaded(),
    })
}

fn multipart_error(err: MultipartError, limit: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::TooLarge { limit }
    } else {
        AppError::BadRequest(err.body_text())
    }
}
