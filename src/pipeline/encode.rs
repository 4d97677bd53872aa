//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! Vision APIs accept images as base64 data embedded in the JSON request
//! body. PNG is lossless, which keeps small print legible for OCR; uploads
//! larger than the pixel cap are downscaled first to stay under provider
//! upload limits.

use crate::error::DocClassError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Encode an image as a base64 PNG ready for the vision model.
///
/// `detail: "high"` lets GPT-4-class models tile the image at full
/// resolution instead of a single low-res overview.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

/// Shrink `img` so neither side exceeds `max_pixels`, keeping aspect ratio.
pub fn fit_within(img: DynamicImage, max_pixels: u32) -> DynamicImage {
    if img.width() <= max_pixels && img.height() <= max_pixels {
        return img;
    }
    img.resize(max_pixels, max_pixels, FilterType::Lanczos3)
}

/// Decode an image file, downscale it and encode it for the vision model.
pub async fn load_image(path: &Path, max_pixels: u32) -> Result<ImageData, DocClassError> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let to_err = |e: image::ImageError| DocClassError::ImageDecode {
            path: owned.clone(),
            detail: e.to_string(),
        };
        let img = image::open(&owned).map_err(to_err)?;
        debug!("Decoded {} → {}x{} px", owned.display(), img.width(), img.height());
        encode_page(&fit_within(img, max_pixels)).map_err(to_err)
    })
    .await
    .map_err(|e| DocClassError::Internal(format!("Image task panicked: {}", e)))?
}
