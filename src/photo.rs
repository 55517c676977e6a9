//! Shrinks uploaded pictures before they are stored inline in the document.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, GenericImageView};
use tracing::debug;

use crate::error::{Error, Result};

/// Longest side of a stored photo, in pixels.
pub const MAX_DIMENSION: u32 = 800;
/// JPEG quality, 0-100.
pub const JPEG_QUALITY: u8 = 70;

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Size that fits inside `MAX_DIMENSION` keeping the aspect ratio. Smaller
/// images keep their size.
pub fn fitted_size(width: u32, height: u32) -> (u32, u32) {
    if width >= height {
        if width <= MAX_DIMENSION {
            return (width, height);
        }
        let scaled = (height as f64 * MAX_DIMENSION as f64 / width as f64).round() as u32;
        (MAX_DIMENSION, scaled.max(1))
    } else {
        if height <= MAX_DIMENSION {
            return (width, height);
        }
        let scaled = (width as f64 * MAX_DIMENSION as f64 / height as f64).round() as u32;
        (scaled.max(1), MAX_DIMENSION)
    }
}

/// Decodes any supported image, shrinks it and re-encodes it as a JPEG
/// data URI.
pub fn encode_photo(bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory(bytes)?;
    let (w, h) = img.dimensions();
    let (fw, fh) = fitted_size(w, h);
    let img = if (fw, fh) == (w, h) {
        img
    } else {
        DynamicImage::ImageRgba8(imageops::resize(&img, fw, fh, imageops::FilterType::Triangle))
    };

    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&rgb)?;
    debug!(from = ?(w, h), to = ?(fw, fh), bytes = jpeg.len(), "encoded photo");

    Ok(format!("{}{}", DATA_URI_PREFIX, B64.encode(&jpeg)))
}

/// Reads and encodes a picture on the blocking pool.
pub async fn encode_photo_file(path: PathBuf) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let bytes = std::fs::read(&path)?;
        encode_photo(&bytes)
    })
    .await
    .map_err(|_| Error::ImageTask)?
}

/// The JPEG bytes inside a data URI produced by [`encode_photo`].
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let payload = uri.strip_prefix(DATA_URI_PREFIX)?;
    B64.decode(payload).ok()
}
