//! Post-watermark resize.

use super::ExportError;
use crate::watermark::transform::resize_rgba;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Optional resize applied after compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ResizeRule {
    /// Scale both sides to `percent`% (truncating).
    Percentage { percent: u32 },
    /// Resize to an exact size, ignoring aspect ratio.
    Exact { width: u32, height: u32 },
}

impl ResizeRule {
    pub fn validate(&self) -> Result<(), ExportError> {
        match *self {
            Self::Percentage { percent } if percent == 0 => Err(ExportError::InvalidOption(
                "resize percentage must be positive".to_string(),
            )),
            Self::Exact { width, height } if width == 0 || height == 0 => {
                Err(ExportError::InvalidOption(format!(
                    "resize target {}x{} must be non-zero",
                    width, height
                )))
            }
            _ => Ok(()),
        }
    }

    /// Target size for an image of `width` x `height`.
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        match *self {
            Self::Percentage { percent } => (
                ((width as u64 * percent as u64) / 100).clamp(1, u32::MAX as u64) as u32,
                ((height as u64 * percent as u64) / 100).clamp(1, u32::MAX as u64) as u32,
            ),
            Self::Exact { width, height } => (width, height),
        }
    }

    /// Resize with Lanczos3, keeping the colour type (RGB stays RGB).
    pub fn apply(&self, image: DynamicImage) -> Result<DynamicImage, ExportError> {
        self.validate()?;
        let (w, h) = self.target_size(image.width(), image.height());
        if (w, h) == (image.width(), image.height()) {
            return Ok(image);
        }

        let had_alpha = image.color().has_alpha();
        let resized = DynamicImage::ImageRgba8(resize_rgba(&image.to_rgba8(), w, h)?);
        Ok(if had_alpha {
            resized
        } else {
            DynamicImage::ImageRgb8(resized.to_rgb8())
        })
    }
}
