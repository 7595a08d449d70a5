use image::RgbImage;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};

/// A pretrained image-to-text model.
///
/// `caption` is blocking and CPU heavy; callers run it on the blocking pool.
pub trait Captioner: Send + Sync {
    /// Display name reported alongside each caption.
    fn name(&self) -> &str;

    fn caption(&self, image: &RgbImage) -> Result<String>;
}

type LoadFn = dyn Fn() -> Result<Arc<dyn Captioner>> + Send + Sync;

/// Loads the model once and hands out shared references afterwards.
///
/// A failed load is returned to the caller and not remembered, so the next
/// request tries again.
pub struct ModelCell {
    cell: OnceCell<Arc<dyn Captioner>>,
    loader: Arc<LoadFn>,
}

impl ModelCell {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Captioner>> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Arc::new(loader),
        }
    }

    /// A cell that already holds a model.
    pub fn ready(captioner: Arc<dyn Captioner>) -> Self {
        let loaded = Arc::clone(&captioner);
        Self {
            cell: OnceCell::new_with(Some(captioner)),
            loader: Arc::new(move || Ok(Arc::clone(&loaded))),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> Result<Arc<dyn Captioner>> {
        let captioner = self
            .cell
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let started = Instant::now();
                tracing::info!("⏳ Loading captioning model...");

                let loaded: Result<Arc<dyn Captioner>> =
                    match tokio::task::spawn_blocking(move || loader()).await {
                        Ok(result) => result,
                        Err(join_err) => Err(AppError::ModelLoad(join_err.to_string())),
                    };

                match &loaded {
                    Ok(model) => tracing::info!(
                        "✅ Model '{}' ready in {} ms",
                        model.name(),
                        started.elapsed().as_millis()
                    ),
                    Err(e) => tracing::error!("❌ {}", e),
                }
                loaded
            })
            .await?;

        Ok(Arc::clone(captioner))
    }
}
