//! Watermark processor for applying watermarks to images.
//!
//! This module provides the high-level API: pick a stamp builder from the
//! configuration, build the stamp against the host size, resolve its
//! position and composite it onto a copy of the host.
//!
//! # Failure Policy
//!
//! [`WatermarkRenderer::try_apply`] reports every failure. [`WatermarkRenderer::apply`]
//! is the render boundary used by preview and export: errors and panics are
//! logged and the original image is returned unchanged.
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, RgbImage};
//! use photo_watermark::watermark::{WatermarkConfig, WatermarkRenderer};
//!
//! let renderer = WatermarkRenderer::builtin_only();
//! let host = DynamicImage::ImageRgb8(RgbImage::new(400, 300));
//! let result = renderer.apply(&host, &WatermarkConfig::text("TEST"));
//! assert_eq!((result.width(), result.height()), (400, 300));
//! ```

use super::compositor::{composite, downscale_to_fit, Stamp};
use super::fonts::FontResolver;
use super::image_stamp::ImageStampBuilder;
use super::position::{resolve_position, ImageDimensions};
use super::text_renderer::TextStampBuilder;
use super::{WatermarkConfig, WatermarkError, WatermarkKind};
use image::{DynamicImage, RgbaImage};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Default preview bounds.
pub const DEFAULT_PREVIEW_SIZE: (u32, u32) = (800, 600);

/// Outcome of building a stamp.
pub type StampBuildResult = Result<Stamp, WatermarkError>;

/// Builds a stamp for one configuration and host size.
pub trait StampBuilder {
    fn build(&self, config: &WatermarkConfig, host: ImageDimensions) -> StampBuildResult;
}

impl StampBuilder for TextStampBuilder {
    fn build(&self, config: &WatermarkConfig, _host: ImageDimensions) -> StampBuildResult {
        match &config.kind {
            WatermarkKind::Text(style) => self
                .render(style, config.opacity, config.rotation)
                .map(Stamp::new),
            WatermarkKind::Image(_) => Err(WatermarkError::ConfigError(
                "Text builder received an image watermark".to_string(),
            )),
        }
    }
}

impl StampBuilder for ImageStampBuilder {
    /// Caps the stamp to half of the host's shorter side.
    fn build(&self, config: &WatermarkConfig, host: ImageDimensions) -> StampBuildResult {
        match &config.kind {
            WatermarkKind::Image(spec) => {
                let cap = (host.width.min(host.height) / 2).max(1);
                self.render(spec, config.opacity, config.rotation, Some((cap, cap)))
                    .map(Stamp::new)
            }
            WatermarkKind::Text(_) => Err(WatermarkError::ConfigError(
                "Image builder received a text watermark".to_string(),
            )),
        }
    }
}

/// Applies watermarks, owning one builder of each kind.
#[derive(Debug, Default)]
pub struct WatermarkRenderer {
    text: TextStampBuilder,
    image: ImageStampBuilder,
}

impl WatermarkRenderer {
    pub fn new(fonts: FontResolver) -> Self {
        Self {
            text: TextStampBuilder::new(fonts),
            image: ImageStampBuilder::new(),
        }
    }

    /// Renderer that never scans system font directories.
    pub fn builtin_only() -> Self {
        Self::new(FontResolver::builtin_only())
    }

    pub fn text_builder(&self) -> &TextStampBuilder {
        &self.text
    }

    pub fn image_builder(&self) -> &ImageStampBuilder {
        &self.image
    }

    fn builder_for(&self, config: &WatermarkConfig) -> &dyn StampBuilder {
        match config.kind {
            WatermarkKind::Text(_) => &self.text,
            WatermarkKind::Image(_) => &self.image,
        }
    }

    /// Validate the configuration and build its stamp.
    pub fn build_stamp(&self, config: &WatermarkConfig, host: ImageDimensions) -> StampBuildResult {
        config.validate()?;
        self.builder_for(config).build(config, host)
    }

    /// Composite the configured watermark onto a copy of `host`.
    pub fn try_apply(
        &self,
        host: &DynamicImage,
        config: &WatermarkConfig,
    ) -> Result<RgbaImage, WatermarkError> {
        let dims = ImageDimensions::of(host);
        let stamp = self.build_stamp(config, dims)?;
        let position = resolve_position(&dims, &stamp.dimensions(), config.placement);

        debug!(
            host_w = dims.width,
            host_h = dims.height,
            stamp_w = stamp.dimensions().width,
            stamp_h = stamp.dimensions().height,
            x = position.x,
            y = position.y,
            "Compositing watermark"
        );

        Ok(composite(host, &stamp, position))
    }

    /// Composite the watermark, returning the original image on any failure.
    pub fn apply(&self, host: &DynamicImage, config: &WatermarkConfig) -> DynamicImage {
        match catch_unwind(AssertUnwindSafe(|| self.try_apply(host, config))) {
            Ok(Ok(image)) => DynamicImage::ImageRgba8(image),
            Ok(Err(e)) => {
                warn!(error = %e, "Watermark not applied");
                host.clone()
            }
            Err(_) => {
                warn!("Watermark rendering panicked, returning original image");
                host.clone()
            }
        }
    }

    /// Watermarked copy downscaled to fit `max_size`, never upscaled.
    pub fn render_preview(
        &self,
        host: &DynamicImage,
        config: &WatermarkConfig,
        max_size: (u32, u32),
    ) -> RgbaImage {
        let composed = self.apply(host, config).to_rgba8();
        let fallback = composed.clone();
        match downscale_to_fit(composed, max_size.0, max_size.1) {
            Ok(preview) => preview,
            Err(e) => {
                warn!(error = %e, "Preview downscale failed, using full-size image");
                fallback
            }
        }
    }
}
