//! Watermark configuration types.
//!
//! This module defines the value objects a render call consumes:
//! - [`WatermarkConfig`]: opacity, rotation, placement and the text/image kind
//! - [`Anchor`] and [`Placement`]: nine-grid anchors or a custom coordinate
//! - [`TemplateRecord`]: the flat JSON record templates and settings persist
//!
//! A `WatermarkConfig` is never mutated by the engine; each render derives a
//! fresh stamp from the snapshot it is given.

use super::WatermarkError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Default values
fn default_text() -> String {
    "Watermark".to_string()
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    24
}

fn default_font_color() -> String {
    "#FFFFFF".to_string()
}

fn default_opacity() -> u8 {
    80
}

fn default_position() -> String {
    Anchor::BottomRight.as_str().to_string()
}

fn default_image_scale() -> f32 {
    1.0
}

fn default_outline_color() -> String {
    "#000000".to_string()
}

fn default_outline_width() -> u32 {
    2
}

/// RGB color parsed from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Format as `#RRGGBB`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```
/// use photo_watermark::watermark::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FFF").unwrap(), Color::new(255, 255, 255));
/// assert_eq!(parse_hex_color("#FF0000").unwrap(), Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::ConfigError(format!("Color must start with '#': {hex}")))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WatermarkError::ConfigError(format!(
            "Invalid hex digit in color '{hex}'"
        )));
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| WatermarkError::ConfigError(format!("Invalid hex digit in color '{hex}'")))
    };

    match digits.len() {
        // #RGB - each digit doubled: 0xF -> 0xFF, 0xA -> 0xAA
        3 => Ok(Color::new(
            component(0..1)? * 17,
            component(1..2)? * 17,
            component(2..3)? * 17,
        )),
        6 => Ok(Color::new(
            component(0..2)?,
            component(2..4)?,
            component(4..6)?,
        )),
        len => Err(WatermarkError::ConfigError(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            len
        ))),
    }
}

/// One of the nine named stamp anchors.
///
/// Anchors place the stamp at a fraction of the free space `(W - w, H - h)`,
/// with a 5% inset from the edges rather than sitting flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// All anchors, row by row.
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Fractional coordinates of this anchor in `[0, 1] x [0, 1]`.
    pub fn fraction(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (0.05, 0.05),
            Self::TopCenter => (0.5, 0.05),
            Self::TopRight => (0.95, 0.05),
            Self::CenterLeft => (0.05, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterRight => (0.95, 0.5),
            Self::BottomLeft => (0.05, 0.95),
            Self::BottomCenter => (0.5, 0.95),
            Self::BottomRight => (0.95, 0.95),
        }
    }

    /// Persisted name of the anchor (`bottom_right`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopCenter => "top_center",
            Self::TopRight => "top_right",
            Self::CenterLeft => "center_left",
            Self::Center => "center",
            Self::CenterRight => "center_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomCenter => "bottom_center",
            Self::BottomRight => "bottom_right",
        }
    }

    /// Look up an anchor by its persisted name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Look up an anchor by name; unknown names fall back to `bottom_right`.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_default()
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::BottomRight
    }
}

/// Where the stamp goes: a named anchor or an explicit top-left coordinate
/// in host-image pixels (interactive drag placement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Anchor(Anchor),
    Custom { x: i32, y: i32 },
}

impl Default for Placement {
    fn default() -> Self {
        Self::Anchor(Anchor::default())
    }
}

impl Placement {
    /// Build a placement from the persisted `position` / `custom_position` pair.
    ///
    /// `custom` without a coordinate behaves like an unknown anchor name.
    pub fn from_record(position: &str, custom_position: Option<[i32; 2]>) -> Self {
        match (position, custom_position) {
            ("custom", Some([x, y])) => Self::Custom { x, y },
            (name, _) => Self::Anchor(Anchor::from_name_or_default(name)),
        }
    }

    fn to_record(self) -> (String, Option<[i32; 2]>) {
        match self {
            Self::Anchor(anchor) => (anchor.as_str().to_string(), None),
            Self::Custom { x, y } => ("custom".to_string(), Some([x, y])),
        }
    }
}

/// Text watermark style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub text: String,
    /// Family name or a path to a font file.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: u32,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub shadow: bool,
    pub outline: bool,
    pub outline_color: Color,
    pub outline_width: u32,
}

impl TextStyle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            color: Color::white(),
            bold: false,
            italic: false,
            shadow: false,
            outline: false,
            outline_color: Color::black(),
            outline_width: default_outline_width(),
        }
    }
}

/// Image watermark source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    pub path: PathBuf,
    /// Scale factor applied to the source image (typically 0.1 - 5.0).
    pub scale: f32,
}

/// Watermark kind - either text or image.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkKind {
    Text(TextStyle),
    Image(ImageSpec),
}

/// A complete watermark configuration snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkConfig {
    /// Opacity from 0 (invisible) to 100 (opaque).
    pub opacity: u8,
    /// Rotation in degrees, counter-clockwise; any value, taken mod 360.
    pub rotation: f32,
    pub placement: Placement,
    pub kind: WatermarkKind,
}

impl WatermarkConfig {
    /// Text watermark with default style at the default anchor.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_kind(WatermarkKind::Text(TextStyle::new(text)))
    }

    /// Image watermark at scale 1.0 at the default anchor.
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::with_kind(WatermarkKind::Image(ImageSpec {
            path: path.into(),
            scale: default_image_scale(),
        }))
    }

    fn with_kind(kind: WatermarkKind) -> Self {
        Self {
            opacity: default_opacity(),
            rotation: 0.0,
            placement: Placement::default(),
            kind,
        }
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_anchor(self, anchor: Anchor) -> Self {
        self.with_placement(Placement::Anchor(anchor))
    }

    /// Replace the text style (no-op for image watermarks).
    pub fn with_text_style(mut self, f: impl FnOnce(&mut TextStyle)) -> Self {
        if let WatermarkKind::Text(style) = &mut self.kind {
            f(style);
        }
        self
    }

    /// Set the image scale factor (no-op for text watermarks).
    pub fn with_scale(mut self, scale: f32) -> Self {
        if let WatermarkKind::Image(spec) = &mut self.kind {
            spec.scale = scale;
        }
        self
    }

    pub fn template_kind(&self) -> TemplateKind {
        match self.kind {
            WatermarkKind::Text(_) => TemplateKind::Text,
            WatermarkKind::Image(_) => TemplateKind::Image,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.opacity > 100 {
            return Err(WatermarkError::ConfigError(format!(
                "Opacity must be between 0 and 100, got {}",
                self.opacity
            )));
        }

        if !self.rotation.is_finite() {
            return Err(WatermarkError::ConfigError(format!(
                "Rotation must be a finite number of degrees, got {}",
                self.rotation
            )));
        }

        match &self.kind {
            WatermarkKind::Text(style) => {
                if style.text.is_empty() {
                    return Err(WatermarkError::ConfigError(
                        "Text watermark 'text' field cannot be empty".to_string(),
                    ));
                }
                if style.font_size == 0 {
                    return Err(WatermarkError::ConfigError(
                        "Font size must be positive".to_string(),
                    ));
                }
            }
            WatermarkKind::Image(spec) => {
                if spec.path.as_os_str().is_empty() {
                    return Err(WatermarkError::ConfigError(
                        "Image watermark path cannot be empty".to_string(),
                    ));
                }
                if !spec.scale.is_finite() || spec.scale <= 0.0 {
                    return Err(WatermarkError::ConfigError(format!(
                        "Image scale must be a positive finite number, got {}",
                        spec.scale
                    )));
                }
            }
        }

        Ok(())
    }

    /// Convert to the persisted template record.
    pub fn to_record(&self) -> TemplateRecord {
        let (position, custom_position) = self.placement.to_record();
        let mut record = TemplateRecord {
            kind: self.template_kind(),
            opacity: self.opacity,
            rotation: self.rotation,
            position,
            custom_position,
            ..TemplateRecord::default()
        };

        match &self.kind {
            WatermarkKind::Text(style) => {
                record.text = style.text.clone();
                record.font_family = style.font_family.clone();
                record.font_size = style.font_size;
                record.font_color = style.color.to_hex();
                record.font_bold = style.bold;
                record.font_italic = style.italic;
                record.shadow = style.shadow;
                record.outline = style.outline;
                record.outline_color = style.outline_color.to_hex();
                record.outline_width = style.outline_width;
            }
            WatermarkKind::Image(spec) => {
                record.image_path = spec.path.to_string_lossy().into_owned();
                record.image_scale = spec.scale;
            }
        }

        record
    }
}

/// Template set a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    #[default]
    Text,
    Image,
}

impl TemplateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Persisted template record (flat JSON object).
///
/// ```json
/// {
///   "type": "text",
///   "text": "© 2025",
///   "font_family": "Arial",
///   "font_size": 24,
///   "font_color": "#FFFFFF",
///   "opacity": 80,
///   "rotation": 0,
///   "position": "bottom_right"
/// }
/// ```
///
/// Missing keys take their defaults, so older or hand-written records load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    #[serde(rename = "type", default)]
    pub kind: TemplateKind,

    #[serde(default = "default_text")]
    pub text: String,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default = "default_font_color")]
    pub font_color: String,

    #[serde(default = "default_opacity")]
    pub opacity: u8,

    #[serde(default)]
    pub rotation: f32,

    /// Anchor name or `custom`
    #[serde(default = "default_position")]
    pub position: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_position: Option<[i32; 2]>,

    #[serde(default)]
    pub image_path: String,

    #[serde(default = "default_image_scale")]
    pub image_scale: f32,

    #[serde(default)]
    pub font_bold: bool,

    #[serde(default)]
    pub font_italic: bool,

    #[serde(default)]
    pub shadow: bool,

    #[serde(default)]
    pub outline: bool,

    #[serde(default = "default_outline_color")]
    pub outline_color: String,

    #[serde(default = "default_outline_width")]
    pub outline_width: u32,
}

impl Default for TemplateRecord {
    fn default() -> Self {
        Self {
            kind: TemplateKind::Text,
            text: default_text(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            font_color: default_font_color(),
            opacity: default_opacity(),
            rotation: 0.0,
            position: default_position(),
            custom_position: None,
            image_path: String::new(),
            image_scale: default_image_scale(),
            font_bold: false,
            font_italic: false,
            shadow: false,
            outline: false,
            outline_color: default_outline_color(),
            outline_width: default_outline_width(),
        }
    }
}

impl TryFrom<&TemplateRecord> for WatermarkConfig {
    type Error = WatermarkError;

    fn try_from(record: &TemplateRecord) -> Result<Self, Self::Error> {
        let kind = match record.kind {
            TemplateKind::Text => WatermarkKind::Text(TextStyle {
                text: record.text.clone(),
                font_family: record.font_family.clone(),
                font_size: record.font_size,
                color: parse_hex_color(&record.font_color)?,
                bold: record.font_bold,
                italic: record.font_italic,
                shadow: record.shadow,
                outline: record.outline,
                outline_color: parse_hex_color(&record.outline_color)?,
                outline_width: record.outline_width,
            }),
            TemplateKind::Image => WatermarkKind::Image(ImageSpec {
                path: PathBuf::from(&record.image_path),
                scale: record.image_scale,
            }),
        };

        let config = WatermarkConfig {
            opacity: record.opacity,
            rotation: record.rotation,
            placement: Placement::from_record(&record.position, record.custom_position),
            kind,
        };
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<TemplateRecord> for WatermarkConfig {
    type Error = WatermarkError;

    fn try_from(record: TemplateRecord) -> Result<Self, Self::Error> {
        WatermarkConfig::try_from(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_rrggbb() {
        assert_eq!(parse_hex_color("#FF0000").unwrap(), Color::new(255, 0, 0));
        assert_eq!(parse_hex_color("#00FF00").unwrap(), Color::new(0, 255, 0));
        assert_eq!(parse_hex_color("#0000FF").unwrap(), Color::new(0, 0, 255));
        assert_eq!(parse_hex_color("#ffffff").unwrap(), Color::white());
    }

    #[test]
    fn test_parse_hex_color_rgb() {
        // A=10*17=170, B=11*17=187, C=12*17=204
        assert_eq!(parse_hex_color("#ABC").unwrap(), Color::new(170, 187, 204));
        assert_eq!(parse_hex_color("#000").unwrap(), Color::black());
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert!(parse_hex_color("FF0000").is_err());
        assert!(parse_hex_color("#FF00").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
        // Multi-byte characters must not panic on slicing
        assert!(parse_hex_color("#ÄÄÄ").is_err());
    }

    #[test]
    fn test_color_to_hex() {
        assert_eq!(Color::new(255, 128, 0).to_hex(), "#FF8000");
        assert_eq!(parse_hex_color(&Color::new(1, 2, 3).to_hex()).unwrap(), Color::new(1, 2, 3));
    }

    #[test]
    fn test_anchor_names() {
        for anchor in Anchor::ALL {
            assert_eq!(Anchor::from_name(anchor.as_str()), Some(anchor));
        }
        assert_eq!(Anchor::from_name_or_default("middle"), Anchor::BottomRight);
    }

    #[test]
    fn test_anchor_serde_names() {
        let json = serde_json::to_string(&Anchor::TopCenter).unwrap();
        assert_eq!(json, "\"top_center\"");
        let anchor: Anchor = serde_json::from_str("\"center_left\"").unwrap();
        assert_eq!(anchor, Anchor::CenterLeft);
    }

    #[test]
    fn test_placement_from_record() {
        assert_eq!(
            Placement::from_record("custom", Some([12, 34])),
            Placement::Custom { x: 12, y: 34 }
        );
        assert_eq!(
            Placement::from_record("custom", None),
            Placement::Anchor(Anchor::BottomRight)
        );
        assert_eq!(
            Placement::from_record("top_left", Some([1, 2])),
            Placement::Anchor(Anchor::TopLeft)
        );
    }

    #[test]
    fn test_record_defaults_from_minimal_json() {
        let record: TemplateRecord = serde_json::from_str(r#"{"type": "text"}"#).unwrap();
        assert_eq!(record.text, "Watermark");
        assert_eq!(record.font_family, "Arial");
        assert_eq!(record.font_size, 24);
        assert_eq!(record.font_color, "#FFFFFF");
        assert_eq!(record.opacity, 80);
        assert_eq!(record.position, "bottom_right");
        assert_eq!(record.outline_width, 2);
        assert!(record.custom_position.is_none());
    }

    #[test]
    fn test_record_to_text_config() {
        let json = r##"{
            "type": "text",
            "text": "TEST",
            "font_family": "DejaVu Sans",
            "font_size": 36,
            "font_color": "#FF0000",
            "opacity": 50,
            "rotation": -30,
            "position": "custom",
            "custom_position": [10, 20],
            "font_bold": true,
            "outline": true,
            "outline_color": "#0000FF",
            "outline_width": 3
        }"##;
        let record: TemplateRecord = serde_json::from_str(json).unwrap();
        let config = WatermarkConfig::try_from(&record).unwrap();

        assert_eq!(config.opacity, 50);
        assert_eq!(config.rotation, -30.0);
        assert_eq!(config.placement, Placement::Custom { x: 10, y: 20 });
        match &config.kind {
            WatermarkKind::Text(style) => {
                assert_eq!(style.text, "TEST");
                assert_eq!(style.font_size, 36);
                assert_eq!(style.color, Color::new(255, 0, 0));
                assert!(style.bold);
                assert!(!style.italic);
                assert!(style.outline);
                assert_eq!(style.outline_color, Color::new(0, 0, 255));
                assert_eq!(style.outline_width, 3);
            }
            other => panic!("expected text watermark, got {:?}", other),
        }
    }

    #[test]
    fn test_record_to_image_config() {
        let json = r#"{"type": "image", "image_path": "/tmp/logo.png", "image_scale": 0.5, "opacity": 60}"#;
        let record: TemplateRecord = serde_json::from_str(json).unwrap();
        let config = WatermarkConfig::try_from(record).unwrap();
        assert_eq!(
            config.kind,
            WatermarkKind::Image(ImageSpec {
                path: PathBuf::from("/tmp/logo.png"),
                scale: 0.5
            })
        );
        assert_eq!(config.template_kind(), TemplateKind::Image);
    }

    #[test]
    fn test_record_rejects_invalid_values() {
        let record = TemplateRecord {
            opacity: 150,
            ..TemplateRecord::default()
        };
        assert!(WatermarkConfig::try_from(&record).is_err());

        let record = TemplateRecord {
            font_color: "white".to_string(),
            ..TemplateRecord::default()
        };
        assert!(WatermarkConfig::try_from(&record).is_err());

        let record = TemplateRecord {
            kind: TemplateKind::Image,
            image_path: "/tmp/logo.png".to_string(),
            image_scale: 0.0,
            ..TemplateRecord::default()
        };
        assert!(WatermarkConfig::try_from(&record).is_err());

        let record = TemplateRecord {
            kind: TemplateKind::Image,
            ..TemplateRecord::default()
        };
        assert!(WatermarkConfig::try_from(&record).is_err());
    }

    #[test]
    fn test_config_record_round_trip() {
        let config = WatermarkConfig::text("© Studio")
            .with_opacity(65)
            .with_rotation(15.0)
            .with_placement(Placement::Custom { x: 5, y: 7 })
            .with_text_style(|s| {
                s.italic = true;
                s.shadow = true;
                s.color = Color::new(0x12, 0x34, 0x56);
            });

        let record = config.to_record();
        assert_eq!(record.position, "custom");
        assert_eq!(record.custom_position, Some([5, 7]));
        assert_eq!(record.font_color, "#123456");

        let json = serde_json::to_string(&record).unwrap();
        let parsed: TemplateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(WatermarkConfig::try_from(parsed).unwrap(), config);
    }

    #[test]
    fn test_validate_empty_text() {
        let config = WatermarkConfig::text("");
        assert!(matches!(
            config.validate(),
            Err(WatermarkError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rotation_not_finite() {
        let config = WatermarkConfig::text("x").with_rotation(f32::NAN);
        assert!(config.validate().is_err());
    }
}
