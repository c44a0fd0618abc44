//! Raster transforms shared by both stamp builders.
//!
//! - [`rotate_expand`]: counter-clockwise rotation that grows the canvas
//! - [`shear_horizontal`]: italic simulation
//! - [`apply_opacity`]: scales the alpha channel
//! - [`resize_rgba`]: Lanczos3 resampling with premultiplied alpha
//!
//! All transforms interpolate in premultiplied space so transparent pixels
//! never bleed dark fringes into the stamp edges.

use super::WatermarkError;
use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::{Rgba, RgbaImage};
use std::num::NonZeroU32;

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Whether a rotation changes the image at all.
pub fn needs_rotation(degrees: f32) -> bool {
    degrees.is_finite() && normalize_degrees(degrees) != 0.0
}

/// Premultiplied sample, or transparent black outside the image.
fn premultiplied(image: &RgbaImage, x: i64, y: i64) -> [f32; 4] {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return [0.0; 4];
    }
    let p = image.get_pixel(x as u32, y as u32);
    let a = p[3] as f32 / 255.0;
    [p[0] as f32 * a, p[1] as f32 * a, p[2] as f32 * a, p[3] as f32]
}

/// Convert an accumulated premultiplied sample back to a straight-alpha pixel.
fn unpremultiply(sum: [f32; 4]) -> Rgba<u8> {
    let alpha = sum[3].clamp(0.0, 255.0);
    if alpha < 0.5 {
        return Rgba([0, 0, 0, 0]);
    }
    let a = alpha / 255.0;
    let channel = |v: f32| (v / a).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(sum[0]),
        channel(sum[1]),
        channel(sum[2]),
        alpha.round() as u8,
    ])
}

fn bilinear(image: &RgbaImage, sx: f32, sy: f32) -> Rgba<u8> {
    let x0f = sx.floor();
    let y0f = sy.floor();
    let fx = sx - x0f;
    let fy = sy - y0f;
    let x0 = x0f as i64;
    let y0 = y0f as i64;

    let p00 = premultiplied(image, x0, y0);
    let p10 = premultiplied(image, x0 + 1, y0);
    let p01 = premultiplied(image, x0, y0 + 1);
    let p11 = premultiplied(image, x0 + 1, y0 + 1);

    let mut sum = [0.0f32; 4];
    for c in 0..4 {
        sum[c] = p00[c] * (1.0 - fx) * (1.0 - fy)
            + p10[c] * fx * (1.0 - fy)
            + p01[c] * (1.0 - fx) * fy
            + p11[c] * fx * fy;
    }
    unpremultiply(sum)
}

/// Rotate counter-clockwise by `degrees`, expanding the canvas to hold the
/// whole rotated image. New area is fully transparent.
///
/// Angles equal to 0 mod 360 return an unchanged copy.
pub fn rotate_expand(image: &RgbaImage, degrees: f32) -> RgbaImage {
    if !needs_rotation(degrees) || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let radians = normalize_degrees(degrees).to_radians();
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    // Rotated bounding box; the epsilon keeps right angles from gaining a pixel
    let dst_w = ((src_w * cos.abs() + src_h * sin.abs()) - 1e-3).ceil().max(1.0) as u32;
    let dst_h = ((src_w * sin.abs() + src_h * cos.abs()) - 1e-3).ceil().max(1.0) as u32;

    let mut rotated = RgbaImage::new(dst_w, dst_h);
    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            // Inverse mapping from destination pixel centre to source
            let rx = dx as f32 + 0.5 - dst_cx;
            let ry = dy as f32 + 0.5 - dst_cy;

            let sx = rx * cos - ry * sin + cx - 0.5;
            let sy = rx * sin + ry * cos + cy - 0.5;

            if sx <= -1.0 || sy <= -1.0 || sx >= src_w || sy >= src_h {
                continue;
            }
            rotated.put_pixel(dx, dy, bilinear(image, sx, sy));
        }
    }

    rotated
}

/// Horizontal shear that leans the top of the image to the right.
///
/// Row `y` shifts right by `factor * (h - 1 - y)` pixels; the canvas widens by
/// `ceil(factor * (h - 1))` so nothing is clipped.
pub fn shear_horizontal(image: &RgbaImage, factor: f32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || factor <= 0.0 || !factor.is_finite() {
        return image.clone();
    }

    let extra = (factor * (h - 1) as f32 - 1e-4).ceil().max(0.0) as u32;
    let mut sheared = RgbaImage::new(w + extra, h);

    for y in 0..h {
        let shift = factor * (h - 1 - y) as f32;
        for x in 0..w + extra {
            let sx = x as f32 - shift;
            if sx <= -1.0 || sx >= w as f32 {
                continue;
            }
            let x0f = sx.floor();
            let fx = sx - x0f;
            let left = premultiplied(image, x0f as i64, y as i64);
            let right = premultiplied(image, x0f as i64 + 1, y as i64);

            let mut sum = [0.0f32; 4];
            for c in 0..4 {
                sum[c] = left[c] * (1.0 - fx) + right[c] * fx;
            }
            sheared.put_pixel(x, y, unpremultiply(sum));
        }
    }

    sheared
}

/// Scale every alpha value by `opacity / 100`, truncating.
///
/// An opaque pixel at 50% becomes 127.
pub fn apply_opacity(image: &mut RgbaImage, opacity: u8) {
    let opacity = opacity.min(100) as u32;
    if opacity == 100 {
        return;
    }
    for pixel in image.pixels_mut() {
        pixel[3] = (pixel[3] as u32 * opacity / 100) as u8;
    }
}

/// Target size for a scale factor and an optional `(max_width, max_height)` cap.
///
/// The cap shrinks the result preserving aspect ratio; no dimension drops
/// below 1 pixel.
pub fn scaled_size(width: u32, height: u32, scale: f32, cap: Option<(u32, u32)>) -> (u32, u32) {
    let to_px = |v: f64| (v.max(1.0).min(u32::MAX as f64)) as u32;

    let mut new_w = to_px(width as f64 * scale as f64);
    let mut new_h = to_px(height as f64 * scale as f64);

    if let Some((max_w, max_h)) = cap {
        let max_w = max_w.max(1);
        let max_h = max_h.max(1);
        if new_w > max_w {
            new_h = to_px(new_h as f64 * max_w as f64 / new_w as f64);
            new_w = max_w;
        }
        if new_h > max_h {
            new_w = to_px(new_w as f64 * max_h as f64 / new_h as f64);
            new_h = max_h;
        }
    }

    (new_w, new_h)
}

/// Resample with a Lanczos3 filter in premultiplied-alpha space.
pub fn resize_rgba(
    image: &RgbaImage,
    target_w: u32,
    target_h: u32,
) -> Result<RgbaImage, WatermarkError> {
    if image.dimensions() == (target_w, target_h) {
        return Ok(image.clone());
    }

    let src_width = NonZeroU32::new(image.width())
        .ok_or_else(|| WatermarkError::TransformError("Source width is 0".to_string()))?;
    let src_height = NonZeroU32::new(image.height())
        .ok_or_else(|| WatermarkError::TransformError("Source height is 0".to_string()))?;
    let dst_width = NonZeroU32::new(target_w)
        .ok_or_else(|| WatermarkError::TransformError("Target width is 0".to_string()))?;
    let dst_height = NonZeroU32::new(target_h)
        .ok_or_else(|| WatermarkError::TransformError("Target height is 0".to_string()))?;

    let mut src_image = Image::from_vec_u8(
        src_width,
        src_height,
        image.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| {
        WatermarkError::TransformError(format!("Failed to create source image: {:?}", e))
    })?;

    let alpha_mul_div = MulDiv::default();
    alpha_mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| WatermarkError::TransformError(format!("Failed to premultiply: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut dst_view = dst_image.view_mut();

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_view)
        .map_err(|e| WatermarkError::TransformError(format!("Resize operation failed: {:?}", e)))?;

    alpha_mul_div
        .divide_alpha_inplace(&mut dst_view)
        .map_err(|e| WatermarkError::TransformError(format!("Failed to unpremultiply: {:?}", e)))?;

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec()).ok_or_else(|| {
        WatermarkError::TransformError("Failed to create output image buffer".to_string())
    })
}
