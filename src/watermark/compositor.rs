//! Watermark compositor for blending stamps onto images.
//!
//! This module handles alpha blending of a stamp onto a copy of the host
//! image at a resolved position, plus the two format-boundary helpers the
//! export and preview paths need.
//!
//! # Blending
//!
//! Under the stamp footprint, with `a = stamp_alpha / 255`:
//!
//! ```text
//! dst.rgb   = a * stamp.rgb + (1 - a) * dst.rgb
//! dst.alpha = stamp_alpha + dst.alpha * (1 - a)
//! ```
//!
//! Opaque hosts stay opaque, and `a = 0` leaves the pixel unchanged. Pixels
//! outside the footprint are never touched; stamps past the image edge are
//! cropped to the intersection.
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, Rgba, RgbaImage};
//! use photo_watermark::watermark::compositor::{composite, Stamp};
//! use photo_watermark::watermark::PlacementPosition;
//!
//! let host = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255])));
//! let stamp = Stamp::new(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])));
//!
//! let result = composite(&host, &stamp, PlacementPosition::new(5, 5));
//! assert_eq!(result.dimensions(), (100, 100));
//! assert_eq!(result.get_pixel(5, 5), &Rgba([255, 255, 255, 255]));
//! ```

use super::position::{PlacementPosition, WatermarkDimensions};
use super::transform::resize_rgba;
use super::WatermarkError;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// A rendered watermark, bounded to its content plus margin.
#[derive(Clone, PartialEq)]
pub struct Stamp {
    image: RgbaImage,
}

impl std::fmt::Debug for Stamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stamp")
            .field("dimensions", &self.image.dimensions())
            .finish()
    }
}

impl Stamp {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn dimensions(&self) -> WatermarkDimensions {
        WatermarkDimensions {
            width: self.image.width(),
            height: self.image.height(),
        }
    }
}

/// Composite `stamp` onto a copy of `host` with its top-left at `position`.
///
/// The host is promoted to RGBA; it is never modified.
pub fn composite(host: &DynamicImage, stamp: &Stamp, position: PlacementPosition) -> RgbaImage {
    let mut target = host.to_rgba8();
    blend_stamp(&mut target, stamp.image(), position);
    target
}

/// Blend a stamp onto the target image in place.
pub fn blend_stamp(target: &mut RgbaImage, stamp: &RgbaImage, position: PlacementPosition) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;

    let px = position.x as i64;
    let py = position.y as i64;

    // Visible region (clamp to target bounds)
    let x_start = px.max(0);
    let y_start = py.max(0);
    let x_end = (px + stamp.width() as i64).min(target_width);
    let y_end = (py + stamp.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = stamp.get_pixel((tx - px) as u32, (ty - py) as u32);
            if src[3] == 0 {
                continue;
            }
            let dst = target.get_pixel_mut(tx as u32, ty as u32);
            *dst = blend_pixel(*dst, *src);
        }
    }
}

/// Blend one stamp pixel over one host pixel.
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = src[3] as f32 / 255.0;
    let channel = |s: u8, d: u8| -> u8 {
        (a * s as f32 + (1.0 - a) * d as f32)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let alpha = (src[3] as f32 + dst[3] as f32 * (1.0 - a))
        .round()
        .clamp(0.0, 255.0) as u8;

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        alpha,
    ])
}

/// Composite an RGBA image over an opaque background, dropping alpha.
pub fn flatten(image: &RgbaImage, background: Rgb<u8>) -> RgbImage {
    let mut flat = RgbImage::new(image.width(), image.height());
    for (x, y, p) in image.enumerate_pixels() {
        let a = p[3] as f32 / 255.0;
        let channel = |s: u8, b: u8| -> u8 {
            (a * s as f32 + (1.0 - a) * b as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        flat.put_pixel(
            x,
            y,
            Rgb([
                channel(p[0], background[0]),
                channel(p[1], background[1]),
                channel(p[2], background[2]),
            ]),
        );
    }
    flat
}

/// Largest size within `(max_width, max_height)` keeping the aspect ratio.
///
/// Never upscales; no dimension drops below 1 pixel.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let scale = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);
    if scale >= 1.0 {
        return (width, height);
    }
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}

/// Downscale to fit `(max_width, max_height)`; smaller images are returned as is.
pub fn downscale_to_fit(
    image: RgbaImage,
    max_width: u32,
    max_height: u32,
) -> Result<RgbaImage, WatermarkError> {
    let (w, h) = fit_within(image.width(), image.height(), max_width, max_height);
    if (w, h) == image.dimensions() {
        return Ok(image);
    }
    resize_rgba(&image, w, h)
}
