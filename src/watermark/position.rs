//! Position calculation for watermark placement.
//!
//! Maps a [`Placement`] to the top-left pixel offset of the stamp on the host.
//!
//! # Placement Modes
//!
//! - **Anchors**: nine named positions. Each anchor is a fraction `(fx, fy)` of
//!   the free space, so the offset is `(round((W - w) * fx), round((H - h) * fy))`.
//! - **Custom**: an explicit top-left coordinate, used verbatim.
//!
//! Both modes clamp so the stamp box stays inside the host; a stamp larger
//! than the host clamps to 0 in that dimension.
//!
//! # Example
//!
//! ```
//! use photo_watermark::watermark::position::{resolve_position, ImageDimensions, WatermarkDimensions};
//! use photo_watermark::watermark::{Anchor, Placement};
//!
//! let image = ImageDimensions { width: 800, height: 600 };
//! let stamp = WatermarkDimensions { width: 100, height: 50 };
//!
//! let pos = resolve_position(&image, &stamp, Placement::Anchor(Anchor::BottomRight));
//! assert_eq!((pos.x, pos.y), (665, 523)); // round(700 * 0.95), round(550 * 0.95)
//! ```

use super::{Anchor, Placement};

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn of(image: &image::DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Dimensions of the stamp to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left position where a stamp should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Calculate the unclamped offset for an anchor.
///
/// Coordinates may be negative if the stamp is larger than the image.
pub fn anchor_position(
    anchor: Anchor,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let (fx, fy) = anchor.fraction();
    let free_w = image.width as i64 - watermark.width as i64;
    let free_h = image.height as i64 - watermark.height as i64;

    PlacementPosition::new(
        saturate((free_w as f64 * fx).round()),
        saturate((free_h as f64 * fy).round()),
    )
}

/// Resolve a placement to a clamped top-left offset.
pub fn resolve_position(
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
    placement: Placement,
) -> PlacementPosition {
    let pos = match placement {
        Placement::Anchor(anchor) => anchor_position(anchor, image, watermark),
        Placement::Custom { x, y } => PlacementPosition::new(x, y),
    };
    clamp_to_bounds(pos, image, watermark)
}

/// Clamp a position so the stamp stays within image bounds.
///
/// If the stamp is larger than the image in a dimension, that coordinate
/// becomes 0.
pub fn clamp_to_bounds(
    pos: PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let max_x = saturate((image.width as i64 - watermark.width as i64).max(0) as f64);
    let max_y = saturate((image.height as i64 - watermark.height as i64).max(0) as f64);

    PlacementPosition::new(pos.x.clamp(0, max_x), pos.y.clamp(0, max_y))
}

fn saturate(value: f64) -> i32 {
    value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}
