//! Converts a pixel source into the fixed-shape tensor a model expects.

use crate::error::ClassifyError;
use crate::models::classify_types::NormalizedTensor;
use crate::models::descriptor::{ColorMode, ModelDescriptor};
use crate::models::pixel_types::{PixelBuffer, PixelSource};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{imageops::FilterType, DynamicImage, RgbaImage};
use ndarray::Array4;

// Luminance projection weights for the grayscale datasets.
const GRAY_WEIGHTS: [f32; 3] = [0.2989, 0.587, 0.114];

/// Decode, resample, and scale `source` into `[1, height, width, channels]`
/// with every sample in [0,1], per the descriptor's input contract.
pub fn normalize(
    source: PixelSource,
    descriptor: &ModelDescriptor,
) -> Result<NormalizedTensor, ClassifyError> {
    let img = decode_source(source)?;
    let (width, height) = (descriptor.width(), descriptor.height());

    let resized = if (img.width(), img.height()) == (width, height) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };

    let rgb = resized.to_rgb8();
    let channels = descriptor.color.channels();
    let mut data = Vec::with_capacity((width * height) as usize * channels);

    match descriptor.color {
        ColorMode::Grayscale => {
            for pixel in rgb.pixels() {
                let luma = GRAY_WEIGHTS[0] * pixel[0] as f32
                    + GRAY_WEIGHTS[1] * pixel[1] as f32
                    + GRAY_WEIGHTS[2] * pixel[2] as f32;
                data.push(luma / 255.0);
            }
        }
        ColorMode::Rgb => {
            for value in rgb.as_raw() {
                data.push(*value as f32 / 255.0);
            }
        }
    }

    let array = Array4::from_shape_vec(
        (1, height as usize, width as usize, channels),
        data,
    )
    .map_err(|e| ClassifyError::Inference(format!("failed to shape tensor: {}", e)))?;

    Ok(NormalizedTensor::new(array))
}

fn decode_source(source: PixelSource) -> Result<DynamicImage, ClassifyError> {
    match source {
        PixelSource::Raw(buffer) => decode_raw(buffer),
        PixelSource::Encoded(bytes) => Ok(image::load_from_memory(&bytes)?),
        PixelSource::DataUrl(url) => {
            let payload = url
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or_else(|| ClassifyError::Decode("not a data URL".to_string()))?;
            let bytes = BASE64.decode(payload.trim())?;
            Ok(image::load_from_memory(&bytes)?)
        }
    }
}

fn decode_raw(buffer: PixelBuffer) -> Result<DynamicImage, ClassifyError> {
    let expected = buffer.width as usize * buffer.height as usize * 4;
    if buffer.pixels.len() != expected {
        return Err(ClassifyError::Decode(format!(
            "pixel buffer is {} bytes, expected {} for {}x{} RGBA",
            buffer.pixels.len(),
            expected,
            buffer.width,
            buffer.height
        )));
    }
    RgbaImage::from_raw(buffer.width, buffer.height, buffer.pixels)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| ClassifyError::Decode("pixel buffer does not fit its geometry".to_string()))
}
