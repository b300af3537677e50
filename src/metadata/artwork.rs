//! Artwork loading and resizing
//!
//! Every artwork path ends in the same place: decode, shrink to fit the
//! target box (aspect preserved), re-encode as JPEG.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use reqwest::Url;

/// Resized, JPEG-encoded artwork
#[derive(Clone, PartialEq, Eq)]
pub struct ArtworkImage {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl fmt::Debug for ArtworkImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtworkImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl ArtworkImage {
    /// Encoded JPEG bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Decode `data` and fit it into a `target_size` square
pub fn resize_artwork(data: &[u8], target_size: u32) -> Result<ArtworkImage> {
    let img = image::load_from_memory(data).context("Failed to decode artwork")?;

    let img = if img.width() > target_size || img.height() > target_size {
        img.resize(target_size, target_size, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut output = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut output), ImageFormat::Jpeg)
        .context("Failed to encode artwork")?;

    Ok(ArtworkImage {
        data: output.into(),
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// Read and resize an image file (blocking)
pub fn load_local_artwork(path: &Path, target_size: u32) -> Result<ArtworkImage> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read artwork file {}", path.display()))?;
    resize_artwork(&data, target_size)
}

/// Download and resize a remote image
pub async fn fetch_remote_artwork(
    client: &reqwest::Client,
    url: &Url,
    target_size: u32,
) -> Result<ArtworkImage> {
    let bytes = client
        .get(url.clone())
        .send()
        .await
        .context("Artwork request failed")?
        .error_for_status()
        .context("Artwork request rejected")?
        .bytes()
        .await
        .context("Failed to read artwork body")?;

    tokio::task::spawn_blocking(move || resize_artwork(&bytes, target_size))
        .await
        .context("Artwork resize task panicked")?
}
