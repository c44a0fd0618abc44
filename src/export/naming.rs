//! Output file naming.

use super::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PREFIX: &str = "wm_";
pub const DEFAULT_SUFFIX: &str = "_watermarked";

/// How an exported file is named relative to its source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "lowercase")]
pub enum NamingRule {
    /// Keep the source file name
    #[default]
    Original,
    /// Prepend to the stem: `photo.jpg` -> `wm_photo.jpg`
    Prefix(String),
    /// Append to the stem: `photo.jpg` -> `photo_watermarked.jpg`
    Suffix(String),
}

impl NamingRule {
    /// Build a rule from its name, using `value` or the default affix.
    pub fn from_parts(rule: &str, value: Option<&str>) -> Option<Self> {
        match rule.to_lowercase().as_str() {
            "original" => Some(Self::Original),
            "prefix" => Some(Self::Prefix(value.unwrap_or(DEFAULT_PREFIX).to_string())),
            "suffix" => Some(Self::Suffix(value.unwrap_or(DEFAULT_SUFFIX).to_string())),
            _ => None,
        }
    }
}

/// Output file name for `source` under `rule`, with the extension forced to
/// `format`.
///
/// An extension that already denotes the format is kept as written
/// (`.jpeg` stays `.jpeg` for JPEG output).
///
/// ```
/// use photo_watermark::export::{output_file_name, NamingRule, OutputFormat};
/// use std::path::Path;
///
/// let name = output_file_name(
///     Path::new("/photos/photo.jpg"),
///     &NamingRule::Prefix("wm_".to_string()),
///     OutputFormat::Png,
/// );
/// assert_eq!(name, "wm_photo.png");
/// ```
pub fn output_file_name(source: &Path, rule: &NamingRule, format: OutputFormat) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = match rule {
        NamingRule::Original => stem,
        NamingRule::Prefix(prefix) => format!("{}{}", prefix, stem),
        NamingRule::Suffix(suffix) => format!("{}{}", stem, suffix),
    };

    match source.extension().map(|e| e.to_string_lossy()) {
        Some(ext) if format.accepts_extension(&ext) => format!("{}.{}", stem, ext),
        _ => format!("{}.{}", stem, format.extension()),
    }
}
