//! Watermark error types.
//!
//! Defines errors that can occur while building stamps and compositing them.
//! Every engine entry point converts failures into one of these values; none
//! of them is allowed to escape a render call as a panic.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during watermark processing.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkError {
    /// Watermark image file does not exist
    MissingSource(PathBuf),

    /// Failed to read or decode the watermark image
    DecodeError(String),

    /// Failed to render text watermark
    RenderError(String),

    /// Invalid configuration
    ConfigError(String),

    /// Resize, rotation or shear failed
    TransformError(String),

    /// Failed to composite watermark onto image
    CompositeError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource(path) => {
                write!(f, "Watermark image not found: {}", path.display())
            }
            Self::DecodeError(msg) => write!(f, "Failed to decode watermark image: {}", msg),
            Self::RenderError(msg) => write!(f, "Failed to render text watermark: {}", msg),
            Self::ConfigError(msg) => write!(f, "Watermark configuration error: {}", msg),
            Self::TransformError(msg) => write!(f, "Failed to transform watermark: {}", msg),
            Self::CompositeError(msg) => write!(f, "Failed to composite watermark: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WatermarkError::MissingSource(PathBuf::from("/tmp/logo.png"));
        assert_eq!(err.to_string(), "Watermark image not found: /tmp/logo.png");

        let err = WatermarkError::DecodeError("invalid PNG".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to decode watermark image: invalid PNG"
        );

        let err = WatermarkError::RenderError("canvas too large".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to render text watermark: canvas too large"
        );

        let err = WatermarkError::ConfigError("empty text".to_string());
        assert_eq!(err.to_string(), "Watermark configuration error: empty text");

        let err = WatermarkError::TransformError("zero width".to_string());
        assert_eq!(err.to_string(), "Failed to transform watermark: zero width");

        let err = WatermarkError::CompositeError("image too small".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to composite watermark: image too small"
        );
    }

    #[test]
    fn test_error_debug() {
        let err = WatermarkError::DecodeError("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("DecodeError"));
        assert!(debug_str.contains("test"));
    }
}
