//! Image watermark stamps.
//!
//! Loads a logo or signature image from disk and turns it into a stamp:
//! opacity first, then Lanczos3 scaling (optionally capped), then rotation.
//!
//! # Caching
//!
//! Decoded sources are kept in memory as RGBA images keyed by path and file
//! modification time, so a batch decodes the logo once and an edited file is
//! picked up on the next render.

use super::transform::{apply_opacity, needs_rotation, resize_rgba, rotate_expand, scaled_size};
use super::{ImageSpec, WatermarkError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Decoded source image with the modification time it was read at.
#[derive(Clone)]
struct CachedImage {
    modified: Option<SystemTime>,
    image: Arc<image::RgbaImage>,
}

impl std::fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedImage")
            .field("modified", &self.modified)
            .field("dimensions", &self.image.dimensions())
            .finish()
    }
}

/// Builds image stamps, caching decoded sources.
#[derive(Debug, Default)]
pub struct ImageStampBuilder {
    cache: Mutex<HashMap<PathBuf, CachedImage>>,
}

impl ImageStampBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and decode a source image; alpha is synthesized when missing.
    ///
    /// # Errors
    ///
    /// - `MissingSource` if the file does not exist
    /// - `DecodeError` if it cannot be read or decoded
    pub fn load(&self, path: &Path) -> Result<Arc<image::RgbaImage>, WatermarkError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WatermarkError::MissingSource(path.to_path_buf())
            } else {
                WatermarkError::DecodeError(format!("{}: {}", path.display(), e))
            }
        })?;
        if !metadata.is_file() {
            return Err(WatermarkError::MissingSource(path.to_path_buf()));
        }
        let modified = metadata.modified().ok();

        if let Some(cached) = self.cache.lock().get(path) {
            if cached.modified == modified {
                return Ok(Arc::clone(&cached.image));
            }
        }

        let decoded = image::open(path)
            .map_err(|e| WatermarkError::DecodeError(format!("{}: {}", path.display(), e)))?;
        let image = Arc::new(decoded.to_rgba8());

        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Decoded watermark image"
        );

        self.cache.lock().insert(
            path.to_path_buf(),
            CachedImage {
                modified,
                image: Arc::clone(&image),
            },
        );
        Ok(image)
    }

    /// Render a stamp from `spec`.
    ///
    /// `cap` bounds the scaled size as `(max_width, max_height)`, preserving
    /// the aspect ratio.
    pub fn render(
        &self,
        spec: &ImageSpec,
        opacity: u8,
        rotation: f32,
        cap: Option<(u32, u32)>,
    ) -> Result<image::RgbaImage, WatermarkError> {
        if !spec.scale.is_finite() || spec.scale <= 0.0 {
            return Err(WatermarkError::ConfigError(format!(
                "Image scale must be a positive finite number, got {}",
                spec.scale
            )));
        }

        let source = self.load(&spec.path)?;

        let mut stamp = source.as_ref().clone();
        apply_opacity(&mut stamp, opacity);

        let (width, height) = scaled_size(stamp.width(), stamp.height(), spec.scale, cap);
        let mut stamp = resize_rgba(&stamp, width, height)?;

        if needs_rotation(rotation) {
            stamp = rotate_expand(&stamp, rotation);
        }

        Ok(stamp)
    }

    /// Number of cached sources.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}
