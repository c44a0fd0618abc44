//! Output formats and the image writer.

use super::ExportError;
use crate::watermark::flatten;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder, ImageFormat, Rgb};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 95;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Bmp,
    #[serde(alias = "tif")]
    Tiff,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// Whether `ext` (without the dot, any case) already denotes this format.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            Self::Jpeg => ext == "jpg" || ext == "jpeg",
            Self::Png => ext == "png",
            Self::Bmp => ext == "bmp",
            Self::Tiff => ext == "tif" || ext == "tiff",
        }
    }

    /// Whether the format stores an alpha channel.
    pub fn supports_transparency(&self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "bmp" => Ok(OutputFormat::Bmp),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            _ => Err(ExportError::InvalidOption(format!(
                "unknown output format: {}",
                s
            ))),
        }
    }
}

/// Write an image, creating parent directories as needed.
///
/// Formats without an alpha channel get the image flattened over white first;
/// the others keep alpha.
/// `quality` (clamped to 1-100) only affects JPEG.
pub fn save_image(
    image: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: u8,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let flattened;
    let image = if !format.supports_transparency() && image.color().has_alpha() {
        flattened = DynamicImage::ImageRgb8(flatten(&image.to_rgba8(), Rgb([255, 255, 255])));
        &flattened
    } else {
        image
    };

    match format {
        OutputFormat::Jpeg => {
            let rgb = image.to_rgb8();
            let writer = BufWriter::new(File::create(path)?);
            let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)?;
        }
        other => {
            image.save_with_format(path, other.image_format())?;
        }
    }

    Ok(())
}
