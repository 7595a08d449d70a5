pub mod captioner;
pub mod config;
pub mod error;
pub mod imaging;
pub mod logger;
pub mod model;
pub mod page;
pub mod server;
pub mod service;
pub mod source;

pub use captioner::{Captioner, ModelCell};
pub use config::Config;
pub use error::{AppError, Result};
pub use model::{DistilVitCaptioner, ModelSettings};
pub use service::{CaptionResponse, CaptionService};
