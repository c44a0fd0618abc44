// Error types module

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::store::StoreError;
use crate::watermark::WatermarkError;
use std::fmt;

/// Centralized error type for the library
///
/// Categorizes errors by the subsystem that raised them.
#[derive(Debug)]
pub enum Error {
    /// Configuration errors (invalid YAML, missing env vars, etc.)
    Config(ConfigError),

    /// Stamp building failures (bad template values, unreadable stamp image, etc.)
    Watermark(WatermarkError),

    /// Export failures (unwritable folder, encoder errors, worker stopped, etc.)
    Export(ExportError),

    /// Template and settings persistence failures
    Store(StoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Watermark(e) => write!(f, "Watermark error: {}", e),
            Error::Export(e) => write!(f, "Export error: {}", e),
            Error::Store(e) => write!(f, "Template store error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Watermark(e) => Some(e),
            Error::Export(e) => Some(e),
            Error::Store(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<WatermarkError> for Error {
    fn from(e: WatermarkError) -> Self {
        Error::Watermark(e)
    }
}

impl From<ExportError> for Error {
    fn from(e: ExportError) -> Self {
        Error::Export(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Store(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
