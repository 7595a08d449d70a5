use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings. Every flag can also come from the environment (or a
/// `.env` file loaded by `dotenvy` before parsing).
#[derive(Debug, Clone, Parser)]
#[command(name = "img-captions")]
#[command(about = "Web demo that captions images with a pretrained model")]
pub struct Config {
    #[arg(long, env = "CAPTIONER_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    #[arg(long, env = "CAPTIONER_ENCODER_MODEL", default_value = "models/encoder_model.rten")]
    pub encoder_model: PathBuf,

    #[arg(long, env = "CAPTIONER_DECODER_MODEL", default_value = "models/decoder_model.rten")]
    pub decoder_model: PathBuf,

    #[arg(long, env = "CAPTIONER_TOKENIZER", default_value = "models/tokenizer.json")]
    pub tokenizer: PathBuf,

    #[arg(long, env = "CAPTIONER_MODEL_NAME", default_value = "Mozilla DistilViT")]
    pub model_name: String,

    /// Square input resolution expected by the image encoder
    #[arg(long, env = "CAPTIONER_IMAGE_SIZE", default_value = "224")]
    pub image_size: u32,

    #[arg(long, env = "CAPTIONER_MAX_TOKENS", default_value = "40")]
    pub max_tokens: usize,

    #[arg(long, env = "CAPTIONER_BOS_TOKEN", default_value = "50256")]
    pub bos_token: u32,

    #[arg(long, env = "CAPTIONER_EOS_TOKEN", default_value = "50256")]
    pub eos_token: u32,

    #[arg(long, env = "CAPTIONER_MAX_IMAGE_BYTES", default_value = "10485760")]
    pub max_image_bytes: u64,

    #[arg(long, env = "CAPTIONER_FETCH_TIMEOUT_SECS", default_value = "15")]
    pub fetch_timeout_secs: u64,

    #[arg(long, env = "CAPTIONER_JPEG_QUALITY", default_value = "85")]
    pub jpeg_quality: u8,

    #[arg(
        long,
        env = "CAPTIONER_BLOCK_PRIVATE_HOSTS",
        help = "Refuse image URLs on loopback, private or link-local addresses"
    )]
    pub block_private_hosts: bool,

    #[arg(long, env = "CAPTIONER_PRELOAD", help = "Load the model before accepting requests")]
    pub preload: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Configuration error: {message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.image_size == 0 {
            return Err(ConfigError::new("image_size must be greater than zero"));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::new("max_tokens must be greater than zero"));
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::new("max_image_bytes must be greater than zero"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::new("fetch_timeout_secs must be greater than zero"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::new(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::new(format!("invalid bind address '{}': {}", self.bind, e)))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
