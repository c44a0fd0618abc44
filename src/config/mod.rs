// Configuration module

use crate::export::{ExportOptions, NamingRule, OutputFormat, DEFAULT_QUALITY};
use crate::watermark::fonts::{default_fallback_families, default_font_directories};
use crate::watermark::{FontResolver, DEFAULT_PREVIEW_SIZE};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontsConfig {
    /// Directories scanned for font files
    #[serde(default = "default_font_directories")]
    pub directories: Vec<PathBuf>,
    /// Families tried when the requested one is not installed
    #[serde(default = "default_fallback_families")]
    pub fallback_families: Vec<String>,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            directories: default_font_directories(),
            fallback_families: default_fallback_families(),
        }
    }
}

fn default_preview_width() -> u32 {
    DEFAULT_PREVIEW_SIZE.0
}

fn default_preview_height() -> u32 {
    DEFAULT_PREVIEW_SIZE.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_width")]
    pub max_width: u32,
    #[serde(default = "default_preview_height")]
    pub max_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_width: default_preview_width(),
            max_height: default_preview_height(),
        }
    }
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub naming: NamingRule,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: default_quality(),
            naming: NamingRule::default(),
        }
    }
}

fn default_store_directory() -> PathBuf {
    PathBuf::from("config")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding templates.json and settings.json
    #[serde(default = "default_store_directory")]
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_store_directory(),
        }
    }
}

impl AppConfig {
    /// Parse YAML, replacing `${VAR_NAME}` with environment variable values.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            })
        });
        if let Some(var_name) = missing {
            return Err(ConfigError::MissingEnvVar(var_name));
        }

        // An empty document means all defaults
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "preview size {}x{} must be non-zero",
                self.preview.max_width, self.preview.max_height
            )));
        }
        if !(1..=100).contains(&self.export.quality) {
            return Err(ConfigError::Invalid(format!(
                "export quality must be between 1 and 100, got {}",
                self.export.quality
            )));
        }
        if self.store.directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "store directory cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn font_resolver(&self) -> FontResolver {
        FontResolver::new(
            self.fonts.directories.clone(),
            self.fonts.fallback_families.clone(),
        )
    }

    pub fn preview_size(&self) -> (u32, u32) {
        (self.preview.max_width, self.preview.max_height)
    }

    /// Export options seeded from the configured defaults.
    pub fn export_options(&self, output_dir: impl Into<PathBuf>) -> ExportOptions {
        let mut options = ExportOptions::new(output_dir);
        options.format = self.export.format;
        options.quality = self.export.quality;
        options.naming = self.export.naming.clone();
        options
    }
}
