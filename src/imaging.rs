use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, ImageOutputFormat, RgbImage};

use crate::error::{AppError, Result};

/// Which encodings a source is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPolicy {
    /// PNG and JPEG only, as offered by the file picker.
    PngOrJpeg,
    /// Anything the decoder understands.
    Any,
}

impl FormatPolicy {
    fn allows(self, format: ImageFormat) -> bool {
        match self {
            FormatPolicy::PngOrJpeg => matches!(format, ImageFormat::Png | ImageFormat::Jpeg),
            FormatPolicy::Any => true,
        }
    }
}

/// Decodes raw bytes into an 8-bit, three-channel image.
pub fn decode_rgb(bytes: &[u8], policy: FormatPolicy) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(AppError::MissingImage);
    }

    let format = image::guess_format(bytes)
        .map_err(|_| AppError::Decode("unrecognised image data".to_string()))?;
    if !policy.allows(format) {
        return Err(AppError::UnsupportedFormat(format!("{:?}", format)));
    }

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| AppError::Decode(e.to_string()))?;

    Ok(img.to_rgb8())
}

/// Re-encodes the decoded image as a JPEG data URL for the page preview.
pub fn preview_data_url(image: &RgbImage, quality: u8) -> Result<String> {
    let mut jpeg_bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut jpeg_bytes),
            ImageOutputFormat::Jpeg(quality),
        )
        .map_err(|e| AppError::Internal(format!("preview encoding failed: {}", e)))?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        general_purpose::STANDARD.encode(&jpeg_bytes)
    ))
}
