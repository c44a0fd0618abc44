//! Preview fitting and drag placement.
//!
//! An interactive host shows a downscaled, centred copy of the image on a
//! canvas. These helpers map between canvas and image coordinates and turn
//! pointer drags into a custom [`Placement`].

use super::Placement;

/// How an image sits on a preview canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewFit {
    /// The canvas has not been laid out yet (≤ 1 px); retry later.
    NotReady,
    Ready {
        /// Image-to-canvas scale, never above 1.
        scale: f64,
        offset_x: i32,
        offset_y: i32,
        display_width: u32,
        display_height: u32,
    },
}

/// Fit an image into a canvas without upscaling, centred.
pub fn fit_to_canvas(image: (u32, u32), canvas: (u32, u32)) -> PreviewFit {
    let (w, h) = image;
    let (cw, ch) = canvas;
    if cw <= 1 || ch <= 1 || w == 0 || h == 0 {
        return PreviewFit::NotReady;
    }

    let scale = (cw as f64 / w as f64).min(ch as f64 / h as f64).min(1.0);
    let display_width = ((w as f64 * scale) as u32).max(1);
    let display_height = ((h as f64 * scale) as u32).max(1);

    PreviewFit::Ready {
        scale,
        offset_x: (cw as i32 - display_width as i32) / 2,
        offset_y: (ch as i32 - display_height as i32) / 2,
        display_width,
        display_height,
    }
}

/// Convert a canvas point to image coordinates, clamped to `[0, W] x [0, H]`.
///
/// Returns `None` while the canvas is not ready.
pub fn canvas_to_image(fit: PreviewFit, image: (u32, u32), point: (i32, i32)) -> Option<(i32, i32)> {
    match fit {
        PreviewFit::NotReady => None,
        PreviewFit::Ready {
            scale,
            offset_x,
            offset_y,
            ..
        } => {
            let x = ((point.0 - offset_x) as f64 / scale) as i32;
            let y = ((point.1 - offset_y) as f64 / scale) as i32;
            Some(clamp_to_image(x, y, image))
        }
    }
}

fn clamp_to_image(x: i32, y: i32, image: (u32, u32)) -> (i32, i32) {
    let max_x = image.0.min(i32::MAX as u32) as i32;
    let max_y = image.1.min(i32::MAX as u32) as i32;
    (x.clamp(0, max_x), y.clamp(0, max_y))
}

/// Tracks a pointer drag over the preview.
///
/// The first move after a press jumps the stamp to the pointer; later moves
/// shift it by the pointer delta scaled back to image pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragState {
    dragging: bool,
    last: (i32, i32),
    position: Option<(i32, i32)>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from an existing custom coordinate.
    pub fn with_position(x: i32, y: i32) -> Self {
        Self {
            position: Some((x, y)),
            ..Self::default()
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        self.position
    }

    pub fn begin(&mut self, canvas_x: i32, canvas_y: i32) {
        self.dragging = true;
        self.last = (canvas_x, canvas_y);
    }

    /// Handle a pointer move; returns the new placement.
    pub fn motion(
        &mut self,
        canvas_x: i32,
        canvas_y: i32,
        fit: PreviewFit,
        image: (u32, u32),
    ) -> Option<Placement> {
        if !self.dragging {
            return None;
        }

        let dx = canvas_x - self.last.0;
        let dy = canvas_y - self.last.1;
        self.last = (canvas_x, canvas_y);

        let scale = match fit {
            PreviewFit::Ready { scale, .. } => scale,
            PreviewFit::NotReady => return None,
        };

        let next = match self.position {
            None => canvas_to_image(fit, image, (canvas_x, canvas_y))?,
            Some((x, y)) => {
                let moved_x = x.saturating_add((dx as f64 / scale) as i32);
                let moved_y = y.saturating_add((dy as f64 / scale) as i32);
                clamp_to_image(moved_x, moved_y, image)
            }
        };

        self.position = Some(next);
        Some(Placement::Custom {
            x: next.0,
            y: next.1,
        })
    }

    pub fn end(&mut self) {
        self.dragging = false;
    }

    /// Forget the custom coordinate (an anchor was selected).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
