//! Text watermark rendering.
//!
//! This module rasterizes text into standalone RGBA stamps that can be
//! composited onto target images.
//!
//! # Features
//!
//! - System font lookup with fallback families and a built-in bitmap font
//! - Drop shadow and disc-shaped outline
//! - Simulated bold (3x3 spread) and italic (0.3 horizontal shear)
//! - Counter-clockwise rotation with an expanded canvas
//!
//! # Example
//!
//! ```
//! use photo_watermark::watermark::text_renderer::TextStampBuilder;
//! use photo_watermark::watermark::TextStyle;
//!
//! let builder = TextStampBuilder::builtin_only();
//! let stamp = builder.render(&TextStyle::new("Copyright 2025"), 80, 0.0).unwrap();
//! assert!(stamp.pixels().any(|p| p[3] > 0));
//! ```

use super::builtin_font::BitmapFont;
use super::fonts::{FontFace, FontHandle, FontResolver};
use super::transform::{needs_rotation, rotate_expand, shear_horizontal};
use super::{Color, TextStyle, WatermarkError};
use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

/// Largest stamp canvas side, in pixels.
pub const MAX_CANVAS_DIMENSION: u32 = 16_384;

/// Horizontal shear factor used to simulate italics.
pub const ITALIC_SHEAR: f32 = 0.3;

const SHADOW_OFFSET: i64 = 2;
const MINIMAL_MARGIN: u32 = 10;

/// Per-pixel glyph coverage for one line of text.
struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    fn add(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = (self.data[idx] + coverage).min(1.0);
    }

    /// Union of this mask stamped at `origin + offset` for every offset, on a
    /// `width` x `height` canvas. Overlaps keep the highest coverage.
    fn spread(&self, width: u32, height: u32, origin: i64, offsets: &[(i64, i64)]) -> CoverageMask {
        let mut layer = CoverageMask::new(width, height);
        for &(dx, dy) in offsets {
            for y in 0..self.height {
                for x in 0..self.width {
                    let coverage = self.data[y as usize * self.width as usize + x as usize];
                    if coverage > 0.0 {
                        layer.max_at(origin + dx + x as i64, origin + dy + y as i64, coverage);
                    }
                }
            }
        }
        layer
    }

    fn max_at(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = self.data[idx].max(coverage.min(1.0));
    }

    /// Fill `canvas` through this mask with a single RGBA ink.
    ///
    /// Pixels move toward the ink by their coverage, so the result never
    /// exceeds the ink's alpha where the canvas was below it.
    fn fill(&self, canvas: &mut RgbaImage, color: Color, alpha: u8) {
        let ink = Rgba([color.r, color.g, color.b, alpha]);
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            if x >= self.width || y >= self.height {
                continue;
            }
            let coverage = self.data[y as usize * self.width as usize + x as usize];
            if coverage > 0.0 {
                *pixel = fill_pixel(*pixel, ink, coverage);
            }
        }
    }
}

/// Move `dst` toward `ink` by `coverage`.
///
/// Colour follows the ink fully over transparent pixels, so antialiased
/// edges do not pick up the canvas's black.
fn fill_pixel(dst: Rgba<u8>, ink: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let coverage = coverage.clamp(0.0, 1.0);
    let color_coverage = 1.0 - (1.0 - coverage) * (dst[3] as f32 / 255.0);
    let lerp = |d: u8, s: u8, t: f32| -> u8 {
        (d as f32 + (s as f32 - d as f32) * t).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        lerp(dst[0], ink[0], color_coverage),
        lerp(dst[1], ink[1], color_coverage),
        lerp(dst[2], ink[2], color_coverage),
        lerp(dst[3], ink[3], coverage),
    ])
}

/// Offsets within a disc of `radius`.
fn disc_offsets(radius: i64) -> Vec<(i64, i64)> {
    let mut offsets = Vec::new();
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

const BOLD_OFFSETS: [(i64, i64); 9] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

fn check_dimensions(width: u64, height: u64) -> Result<(u32, u32), WatermarkError> {
    let limit = MAX_CANVAS_DIMENSION as u64;
    if width > limit || height > limit {
        return Err(WatermarkError::RenderError(format!(
            "Canvas {}x{} exceeds the {}px limit",
            width, height, MAX_CANVAS_DIMENSION
        )));
    }
    Ok((width as u32, height as u32))
}

/// Advance width including kerning, and line height.
fn measure_outline(font: &FontVec, text: &str, font_size: u32) -> (f32, f32) {
    let scaled_font = font.as_scaled(PxScale::from(font_size as f32));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;
    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    (width, scaled_font.height())
}

fn rasterize_outline(
    font: &FontVec,
    text: &str,
    font_size: u32,
) -> Result<CoverageMask, WatermarkError> {
    let (width, height) = measure_outline(font, text, font_size);
    let (w, h) = check_dimensions(
        width.ceil().max(1.0) as u64,
        height.ceil().max(1.0) as u64,
    )?;

    let scale = PxScale::from(font_size as f32);
    let scaled_font = font.as_scaled(scale);
    let baseline_y = scaled_font.ascent();

    let mut mask = CoverageMask::new(w, h);
    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                mask.add(
                    bounds.min.x as i64 + px as i64,
                    bounds.min.y as i64 + py as i64,
                    coverage,
                );
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    Ok(mask)
}

fn rasterize_bitmap(font: BitmapFont, text: &str) -> Result<CoverageMask, WatermarkError> {
    let (width, height) = font.measure(text);
    let (w, h) = check_dimensions(width.max(1) as u64, height.max(1) as u64)?;
    let mut mask = CoverageMask::new(w, h);
    font.draw(text, |x, y| mask.add(x as i64, y as i64, 1.0));
    Ok(mask)
}

fn rasterize(handle: &FontHandle, text: &str, font_size: u32) -> Result<CoverageMask, WatermarkError> {
    match &handle.face {
        FontFace::Outline(font) => rasterize_outline(font, text, font_size),
        FontFace::Builtin => rasterize_bitmap(BitmapFont::for_size(font_size), text),
    }
}

/// Alpha for a 0-100 opacity, truncating.
fn opacity_alpha(opacity: u8) -> u8 {
    (255 * opacity.min(100) as u32 / 100) as u8
}

/// Transparent padding around the text.
///
/// Leaves room for the outline and shadow, and for rotation to spread the
/// glyph antialiasing without touching the canvas edge.
pub fn stamp_margin(style: &TextStyle, text_size: (u32, u32), rotation: f32) -> u32 {
    let mut margin = (style.font_size / 20).max(8);
    if style.shadow || style.outline {
        margin = margin.saturating_add(style.outline_width.saturating_add(3));
    }
    if needs_rotation(rotation) {
        margin = margin.saturating_add(text_size.0.max(text_size.1) / 10);
    }
    margin
}

/// Renders text stamps.
///
/// Owns the [`FontResolver`], so the font index is built once per builder
/// and shared by every stamp it renders.
#[derive(Debug, Default)]
pub struct TextStampBuilder {
    fonts: FontResolver,
}

impl TextStampBuilder {
    pub fn new(fonts: FontResolver) -> Self {
        Self { fonts }
    }

    /// Builder that only uses explicit font file paths and the built-in font.
    pub fn builtin_only() -> Self {
        Self::new(FontResolver::builtin_only())
    }

    pub fn fonts(&self) -> &FontResolver {
        &self.fonts
    }

    /// Render a stamp, degrading to a minimal stamp if the styled path fails.
    ///
    /// Only empty text is reported as an error.
    pub fn render(
        &self,
        style: &TextStyle,
        opacity: u8,
        rotation: f32,
    ) -> Result<RgbaImage, WatermarkError> {
        if style.text.is_empty() {
            return Err(WatermarkError::ConfigError(
                "Text watermark 'text' field cannot be empty".to_string(),
            ));
        }

        match self.render_styled(style, opacity, rotation) {
            Ok(stamp) => Ok(stamp),
            Err(e) => {
                warn!(error = %e, "Styled text rendering failed, using minimal stamp");
                Ok(render_minimal(&style.text, style.color, opacity))
            }
        }
    }

    /// Render with every requested effect; errors propagate.
    pub fn render_styled(
        &self,
        style: &TextStyle,
        opacity: u8,
        rotation: f32,
    ) -> Result<RgbaImage, WatermarkError> {
        if style.font_size == 0 {
            return Err(WatermarkError::RenderError(
                "Font size must be positive".to_string(),
            ));
        }

        let resolution = self.fonts.resolve(&style.font_family, style.bold, style.italic);
        let handle = resolution.handle();
        let mask = rasterize(handle, &style.text, style.font_size)?;

        let margin = stamp_margin(style, (mask.width, mask.height), rotation);
        let (canvas_w, canvas_h) = check_dimensions(
            mask.width as u64 + 2 * margin as u64,
            mask.height as u64 + 2 * margin as u64,
        )?;

        debug!(
            text_len = style.text.len(),
            font_size = style.font_size,
            builtin = handle.is_builtin(),
            canvas_w,
            canvas_h,
            "Rendering text stamp"
        );

        let mut canvas = RgbaImage::new(canvas_w, canvas_h);
        let origin = margin as i64;
        let alpha = opacity_alpha(opacity);

        if style.shadow {
            let shadow_alpha = (255 * opacity.min(100) as u32 / 200) as u8;
            mask.spread(canvas_w, canvas_h, origin, &[(SHADOW_OFFSET, SHADOW_OFFSET)])
                .fill(&mut canvas, Color::black(), shadow_alpha);
        }

        if style.outline && style.outline_width > 0 {
            let offsets = disc_offsets(style.outline_width as i64);
            mask.spread(canvas_w, canvas_h, origin, &offsets)
                .fill(&mut canvas, style.outline_color, alpha);
        }

        let body: &[(i64, i64)] = if handle.synthetic_bold {
            &BOLD_OFFSETS
        } else {
            &[(0, 0)]
        };
        mask.spread(canvas_w, canvas_h, origin, body)
            .fill(&mut canvas, style.color, alpha);

        if handle.synthetic_italic {
            canvas = shear_horizontal(&canvas, ITALIC_SHEAR);
        }

        if needs_rotation(rotation) {
            canvas = rotate_expand(&canvas, rotation);
        }

        Ok(canvas)
    }
}

/// Built-in font at base size, no effects, fixed margin.
pub fn render_minimal(text: &str, color: Color, opacity: u8) -> RgbaImage {
    let font = BitmapFont::with_scale(1);
    let (tw, th) = font.measure(text);
    let mut canvas = RgbaImage::new(tw.max(1) + 2 * MINIMAL_MARGIN, th + 2 * MINIMAL_MARGIN);

    let top = Rgba([color.r, color.g, color.b, opacity_alpha(opacity)]);
    font.draw(text, |x, y| {
        canvas.put_pixel(x + MINIMAL_MARGIN, y + MINIMAL_MARGIN, top);
    });
    canvas
}
