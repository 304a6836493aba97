//! Product image uploads.
//!
//! Images are checked before anything touches the disk: the declared content
//! type and the sniffed format must both be JPEG, PNG, GIF or WebP, the image
//! must be at least 600 px wide, and its aspect ratio must lie between 4:3
//! and 16:9. Accepted files get a random UUID name.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use image::{ImageFormat, ImageReader};
use thiserror::Error;
use uuid::Uuid;

/// Minimum accepted image width in pixels.
pub const MIN_IMAGE_WIDTH: u32 = 600;

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Reasons an uploaded image is refused.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image must be a JPEG, PNG, GIF or WebP file")]
    UnsupportedType,

    #[error("Image could not be read")]
    Unreadable,

    #[error("Image must be at least 600 pixels wide (got {0})")]
    TooNarrow(u32),

    #[error("Image aspect ratio must be between 4:3 and 16:9 (got {width}x{height})")]
    AspectRatio { width: u32, height: u32 },
}

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// An upload that passed every check.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    bytes: Bytes,
}

/// Validates and stores product images in one directory.
#[derive(Debug, Clone)]
pub struct ImageUploader {
    dir: PathBuf,
}

impl ImageUploader {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check an upload's type, width and aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns the first check the image fails.
    pub fn validate(&self, upload: &ImageUpload) -> Result<ValidatedImage, UploadError> {
        if let Some(declared) = &upload.content_type {
            let declared = declared.split(';').next().unwrap_or_default().trim();
            if !ALLOWED_CONTENT_TYPES.contains(&declared.to_ascii_lowercase().as_str()) {
                return Err(UploadError::UnsupportedType);
            }
        }

        let format = image::guess_format(&upload.bytes).map_err(|_| UploadError::UnsupportedType)?;
        if !matches!(
            format,
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP
        ) {
            return Err(UploadError::UnsupportedType);
        }

        let (width, height) = ImageReader::with_format(Cursor::new(&upload.bytes[..]), format)
            .into_dimensions()
            .map_err(|_| UploadError::Unreadable)?;

        if width < MIN_IMAGE_WIDTH {
            return Err(UploadError::TooNarrow(width));
        }
        if !aspect_ratio_allowed(width, height) {
            return Err(UploadError::AspectRatio { width, height });
        }

        Ok(ValidatedImage {
            format,
            width,
            height,
            bytes: upload.bytes.clone(),
        })
    }

    /// Write a validated image under a fresh name, returning that name.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub async fn store(&self, image: &ValidatedImage) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let extension = image.format.extensions_str().first().copied().unwrap_or("img");
        let name = format!("{}.{extension}", Uuid::new_v4().simple());
        tokio::fs::write(self.dir.join(&name), &image.bytes).await?;

        tracing::debug!(file = %name, width = image.width, height = image.height, "Stored image");
        Ok(name)
    }

    /// Remove a stored image. Missing files are ignored; other failures are
    /// logged and otherwise ignored.
    pub async fn remove(&self, name: &str) {
        // Only bare file names produced by `store` are accepted
        if name.contains(['/', '\\']) || name.starts_with('.') {
            tracing::warn!(file = %name, "Refusing to remove suspicious image path");
            return;
        }
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => tracing::debug!(file = %name, "Removed image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove image"),
        }
    }
}

/// Whether `width / height` lies within `[4/3, 16/9]`.
fn aspect_ratio_allowed(width: u32, height: u32) -> bool {
    let (w, h) = (u64::from(width), u64::from(height));
    h > 0 && w * 3 >= h * 4 && w * 9 <= h * 16
}
