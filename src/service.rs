use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::captioner::ModelCell;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::imaging::{self, FormatPolicy};
use crate::source::{self, FetchLimits, ImageSource};

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
    pub model: String,
    pub processing_time_ms: u128,
    pub width: u32,
    pub height: u32,
    /// JPEG data URL of the decoded image.
    pub preview: String,
}

/// Runs one image through fetch, decode, inference and preview encoding.
pub struct CaptionService {
    model: ModelCell,
    client: reqwest::Client,
    max_image_bytes: u64,
    block_private_hosts: bool,
    jpeg_quality: u8,
}

impl CaptionService {
    pub fn new(config: &Config, model: ModelCell) -> Result<Self> {
        // Redirect targets would skip the private-host check.
        let redirects = if config.block_private_hosts {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::default()
        };

        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .redirect(redirects)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            model,
            client,
            max_image_bytes: config.max_image_bytes,
            block_private_hosts: config.block_private_hosts,
            jpeg_quality: config.jpeg_quality,
        })
    }

    pub fn model(&self) -> &ModelCell {
        &self.model
    }

    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_bytes
    }

    pub async fn caption(&self, source: ImageSource) -> Result<CaptionResponse> {
        let start = Instant::now();
        tracing::info!("🖼️ Captioning {}", source.describe());

        let (bytes, policy) = match source {
            ImageSource::Upload { bytes, .. } => {
                if bytes.len() as u64 > self.max_image_bytes {
                    return Err(AppError::TooLarge {
                        limit: self.max_image_bytes,
                    });
                }
                (bytes, FormatPolicy::PngOrJpeg)
            }
            ImageSource::Url(url) => {
                let limits = FetchLimits {
                    max_bytes: self.max_image_bytes,
                    block_private_hosts: self.block_private_hosts,
                };
                (
                    source::fetch_url(&self.client, &url, limits).await?,
                    FormatPolicy::Any,
                )
            }
        };

        let image =
            tokio::task::spawn_blocking(move || imaging::decode_rgb(&bytes, policy)).await??;
        let image = Arc::new(image);
        let (width, height) = image.dimensions();
        tracing::debug!("Decoded {}x{} image", width, height);

        let model = self.model.get().await?;

        let raw_caption = {
            let model = Arc::clone(&model);
            let image = Arc::clone(&image);
            tokio::task::spawn_blocking(move || model.caption(&image)).await??
        };
        let caption = raw_caption.trim().to_string();
        if caption.is_empty() {
            return Err(AppError::EmptyCaption);
        }

        let preview = imaging::preview_data_url(&image, self.jpeg_quality)?;
        let elapsed = start.elapsed().as_millis();

        tracing::info!("✅ Caption in {} ms: {}", elapsed, caption);

        Ok(CaptionResponse {
            caption,
            model: model.name().to_string(),
            processing_time_ms: elapsed,
            width,
            height,
            preview,
        })
    }
}
