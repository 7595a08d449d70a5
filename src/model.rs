//! Vision encoder / text decoder captioning model executed with `rten`.
//!
//! The default weights are Mozilla's DistilViT (a ViT encoder paired with a
//! distilled GPT-2 decoder), exported to ONNX and converted with
//! `rten-convert`:
//!
//! ```sh
//! rten-convert encoder_model.onnx
//! rten-convert decoder_model_with_past.onnx decoder_model.rten
//! ```
//!
//! together with the `tokenizer.json` from the same model repository.

use image::imageops::{self, FilterType};
use image::RgbImage;
use rten::Model;
use rten_generate::{Generator, GeneratorUtils};
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;
use rten_text::tokenizer::Tokenizer;
use std::fmt::Display;
use std::path::PathBuf;

use crate::captioner::Captioner;
use crate::config::Config;
use crate::error::{AppError, Result};

/// Input name the decoder expects the image embedding under.
const ENCODER_HIDDEN_STATES: &str = "encoder_hidden_states";

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub name: String,
    pub encoder_model: PathBuf,
    pub decoder_model: PathBuf,
    pub tokenizer: PathBuf,
    pub image_size: u32,
    pub max_tokens: usize,
    pub bos_token: u32,
    pub eos_token: u32,
}

impl From<&Config> for ModelSettings {
    fn from(config: &Config) -> Self {
        Self {
            name: config.model_name.clone(),
            encoder_model: config.encoder_model.clone(),
            decoder_model: config.decoder_model.clone(),
            tokenizer: config.tokenizer.clone(),
            image_size: config.image_size,
            max_tokens: config.max_tokens,
            bos_token: config.bos_token,
            eos_token: config.eos_token,
        }
    }
}

pub struct DistilVitCaptioner {
    settings: ModelSettings,
    encoder: Model,
    decoder: Model,
    // Kept as JSON and parsed per call; `Tokenizer` is not guaranteed to be Send.
    tokenizer_json: String,
}

impl DistilVitCaptioner {
    pub fn load(settings: &ModelSettings) -> Result<Self> {
        tracing::debug!("Loading encoder from {}", settings.encoder_model.display());
        let encoder = Model::load_file(&settings.encoder_model)
            .map_err(|e| load_error("encoder", &settings.encoder_model, e))?;

        tracing::debug!("Loading decoder from {}", settings.decoder_model.display());
        let decoder = Model::load_file(&settings.decoder_model)
            .map_err(|e| load_error("decoder", &settings.decoder_model, e))?;

        let tokenizer_json = std::fs::read_to_string(&settings.tokenizer)
            .map_err(|e| load_error("tokenizer", &settings.tokenizer, e))?;
        Tokenizer::from_json(&tokenizer_json)
            .map_err(|e| load_error("tokenizer", &settings.tokenizer, e))?;

        Ok(Self {
            settings: settings.clone(),
            encoder,
            decoder,
            tokenizer_json,
        })
    }
}

impl Captioner for DistilVitCaptioner {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn caption(&self, image: &RgbImage) -> Result<String> {
        let tokenizer = Tokenizer::from_json(&self.tokenizer_json).map_err(inference_error)?;
        let input = image_to_tensor(image, self.settings.image_size).into_dyn();

        let encoded = self
            .encoder
            .run_one(input.view().into(), None)
            .map_err(inference_error)?;
        let encoded = NdTensor::<f32, 3>::try_from(encoded).map_err(inference_error)?;

        let hidden_states_id = self
            .decoder
            .node_id(ENCODER_HIDDEN_STATES)
            .map_err(inference_error)?;

        let prompt = vec![self.settings.bos_token];
        let tokens = Generator::from_model(&self.decoder)
            .map_err(inference_error)?
            .with_prompt(&prompt)
            .with_constant_input(hidden_states_id, encoded.view().into())
            .stop_on_tokens([self.settings.eos_token])
            .take(self.settings.max_tokens)
            .decode(&tokenizer);

        let mut caption = String::new();
        for token in tokens {
            caption.push_str(&token.map_err(inference_error)?);
        }

        Ok(caption.trim().to_string())
    }
}

/// Resizes to `size` x `size` and lays the pixels out as a `[1, 3, H, W]`
/// tensor with values in `[0, 1]`.
pub fn image_to_tensor(image: &RgbImage, size: u32) -> NdTensor<f32, 4> {
    let resized = imageops::resize(image, size, size, FilterType::Triangle);
    let side = size as usize;
    let plane = side * side;

    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = y as usize * side + x as usize;
        for (channel, value) in pixel.0.iter().enumerate() {
            data[channel * plane + offset] = *value as f32 / 255.0;
        }
    }

    NdTensor::from_data([1, 3, side, side], data)
}

fn load_error(what: &str, path: &std::path::Path, err: impl Display) -> AppError {
    AppError::ModelLoad(format!("{} {}: {}", what, path.display(), err))
}

fn inference_error(err: impl Display) -> AppError {
    AppError::Inference(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn tensor_is_planar_and_scaled() {
        let image = RgbImage::from_pixel(10, 6, Rgb([255, 0, 51]));
        let tensor = image_to_tensor(&image, 4);

        assert_eq!(tensor.shape(), [1, 3, 4, 4]);
        assert!((tensor[[0, 0, 2, 3]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 1, 2, 3]].abs() < 1e-6);
        assert!((tensor[[0, 2, 0, 0]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn missing_weights_report_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ModelSettings {
            name: "test".to_string(),
            encoder_model: dir.path().join("encoder.rten"),
            decoder_model: dir.path().join("decoder.rten"),
            tokenizer: dir.path().join("tokenizer.json"),
            image_size: 224,
            max_tokens: 40,
            bos_token: 50256,
            eos_token: 50256,
        };

        let err = match DistilVitCaptioner::load(&settings) {
            Err(e) => e,
            Ok(_) => panic!("loading from an empty directory should fail"),
        };
        assert!(matches!(err, AppError::ModelLoad(_)));
        assert!(err.to_string().contains("encoder"));
    }
}
