//! Watermark module for applying text and image watermarks to photographs.
//!
//! This is the compositing engine: it rasterizes text into a stamp, turns an
//! image file into a stamp, places the stamp against nine anchors or a free
//! drag coordinate, and alpha-blends it onto a copy of the host image.
//!
//! # Features
//!
//! - **Text stamps** with system fonts, shadow, outline and simulated bold/italic
//! - **Image stamps** with opacity, Lanczos3 scaling and a per-path decode cache
//! - **Placement** at 9 anchors (with a 5% inset) or a custom coordinate
//! - **Rotation** counter-clockwise by any angle, canvas expanded
//! - **Preview** fitting and drag-to-place helpers for interactive hosts
//!
//! # Template Example
//!
//! ```json
//! {
//!   "type": "text",
//!   "text": "© 2025 Studio",
//!   "font_family": "Arial",
//!   "font_size": 36,
//!   "font_color": "#FFFFFF",
//!   "opacity": 70,
//!   "rotation": -30,
//!   "position": "bottom_right",
//!   "shadow": true
//! }
//! ```

pub mod builtin_font;
pub mod compositor;
pub mod config;
pub mod error;
pub mod fonts;
pub mod image_stamp;
pub mod position;
pub mod preview;
pub mod processor;
pub mod text_renderer;
pub mod transform;

// Re-export main types for convenience
pub use compositor::{blend_stamp, composite, flatten, Stamp};
pub use config::{
    parse_hex_color, Anchor, Color, ImageSpec, Placement, TemplateKind, TemplateRecord, TextStyle,
    WatermarkConfig, WatermarkKind,
};
pub use error::WatermarkError;
pub use fonts::{FontFace, FontHandle, FontIndex, FontResolution, FontResolver};
pub use image_stamp::ImageStampBuilder;
pub use position::{
    clamp_to_bounds, resolve_position, ImageDimensions, PlacementPosition,
    WatermarkDimensions,
};
pub use preview::{canvas_to_image, fit_to_canvas, DragState, PreviewFit};
pub use processor::{StampBuildResult, StampBuilder, WatermarkRenderer, DEFAULT_PREVIEW_SIZE};
pub use text_renderer::TextStampBuilder;
