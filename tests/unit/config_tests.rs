// Configuration module unit tests

use photo_watermark::config::*;
use photo_watermark::export::{NamingRule, OutputFormat};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_can_load_full_yaml_config() {
    let yaml = r#"
fonts:
  directories:
    - /opt/fonts
  fallback_families:
    - DejaVu Sans
preview:
  max_width: 640
  max_height: 480
export:
  format: tiff
  quality: 80
  naming:
    rule: prefix
    value: wm_
store:
  directory: /tmp/wm-store
"#;
    let config = AppConfig::from_yaml_with_env(yaml).expect("Failed to parse YAML");

    assert_eq!(config.fonts.directories, vec![PathBuf::from("/opt/fonts")]);
    assert_eq!(config.fonts.fallback_families, vec!["DejaVu Sans".to_string()]);
    assert_eq!(config.preview_size(), (640, 480));
    assert_eq!(config.export.format, OutputFormat::Tiff);
    assert_eq!(config.export.quality, 80);
    assert_eq!(config.export.naming, NamingRule::Prefix("wm_".into()));
    assert_eq!(config.store.directory, PathBuf::from("/tmp/wm-store"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "export:\n  quality: 70").unwrap();

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.export.quality, 70);
    assert_eq!(config.preview_size(), (800, 600));
}

#[test]
fn test_from_missing_file_is_io_error() {
    let err = AppConfig::from_file("/nonexistent/photo-watermark.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_invalid_yaml_is_rejected() {
    let err = AppConfig::from_yaml_with_env("export: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn test_unknown_format_is_rejected() {
    assert!(AppConfig::from_yaml_with_env("export:\n  format: webp\n").is_err());
}

#[test]
fn test_export_options_follow_config() {
    let mut config = AppConfig::default();
    config.export.format = OutputFormat::Png;
    config.export.quality = 60;
    config.export.naming = NamingRule::Suffix("_s".into());

    let options = config.export_options("/out");
    assert_eq!(options.output_dir, PathBuf::from("/out"));
    assert_eq!(options.format, OutputFormat::Png);
    assert_eq!(options.quality, 60);
    assert_eq!(options.naming, NamingRule::Suffix("_s".into()));
}

#[test]
fn test_font_resolver_uses_configured_directories() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.fonts.directories = vec![dir.path().to_path_buf()];

    let resolver = config.font_resolver();
    assert!(resolver.index().is_empty());
}
