//! Persistent watermark templates and user settings.
//!
//! Both live as pretty-printed JSON in one directory:
//!
//! - `templates.json`: `{"text": {name: record}, "image": {name: record}}`
//! - `settings.json`: last used folders, last template and the default watermark

use crate::watermark::{TemplateKind, TemplateRecord, WatermarkConfig, WatermarkError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const TEMPLATES_FILE: &str = "templates.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Template and settings store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template name cannot be empty")]
    EmptyName,

    #[error("No {kind} template named '{name}'")]
    NotFound { kind: &'static str, name: String },

    #[error("Invalid template: {0}")]
    Watermark(#[from] WatermarkError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TemplateSets {
    #[serde(default)]
    text: BTreeMap<String, TemplateRecord>,
    #[serde(default)]
    image: BTreeMap<String, TemplateRecord>,
}

impl TemplateSets {
    fn set(&self, kind: TemplateKind) -> &BTreeMap<String, TemplateRecord> {
        match kind {
            TemplateKind::Text => &self.text,
            TemplateKind::Image => &self.image,
        }
    }

    fn set_mut(&mut self, kind: TemplateKind) -> &mut BTreeMap<String, TemplateRecord> {
        match kind {
            TemplateKind::Text => &mut self.text,
            TemplateKind::Image => &mut self.image,
        }
    }
}

/// Named templates, kept separately for text and image watermarks.
///
/// Every change is written through to `templates.json`.
#[derive(Debug)]
pub struct TemplateStore {
    path: PathBuf,
    sets: TemplateSets,
}

fn read_sets(path: &Path) -> Result<TemplateSets, StoreError> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

impl TemplateStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// A missing file starts an empty store; an unreadable one is an error.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(TEMPLATES_FILE);
        let sets = if path.exists() {
            match read_sets(&path) {
                Ok(sets) => sets,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable templates");
                    TemplateSets::default()
                }
            }
        } else {
            TemplateSets::default()
        };

        debug!(
            path = %path.display(),
            text = sets.text.len(),
            image = sets.image.len(),
            "Template store opened"
        );
        Ok(Self { path, sets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.sets)?)?;
        Ok(())
    }

    fn checked_name(name: &str) -> Result<&str, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        Ok(name)
    }

    /// Save (or overwrite) a template. The record's `type` is set to `kind`.
    pub fn save(
        &mut self,
        kind: TemplateKind,
        name: &str,
        mut record: TemplateRecord,
    ) -> Result<(), StoreError> {
        let name = Self::checked_name(name)?.to_string();
        record.kind = kind;
        info!(kind = kind.as_str(), name = %name, "Saving template");
        self.sets.set_mut(kind).insert(name, record);
        self.persist()
    }

    /// Save the current configuration as a template.
    pub fn save_config(&mut self, name: &str, config: &WatermarkConfig) -> Result<(), StoreError> {
        config.validate()?;
        self.save(config.template_kind(), name, config.to_record())
    }

    pub fn load(&self, kind: TemplateKind, name: &str) -> Result<&TemplateRecord, StoreError> {
        self.sets
            .set(kind)
            .get(name.trim())
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.as_str(),
                name: name.to_string(),
            })
    }

    /// Load a template as a validated configuration.
    pub fn load_config(&self, kind: TemplateKind, name: &str) -> Result<WatermarkConfig, StoreError> {
        Ok(WatermarkConfig::try_from(self.load(kind, name)?)?)
    }

    pub fn delete(&mut self, kind: TemplateKind, name: &str) -> Result<TemplateRecord, StoreError> {
        let removed = self
            .sets
            .set_mut(kind)
            .remove(name.trim())
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.as_str(),
                name: name.to_string(),
            })?;
        self.persist()?;
        info!(kind = kind.as_str(), name = %name, "Template deleted");
        Ok(removed)
    }

    /// Template names of one kind, sorted.
    pub fn list(&self, kind: TemplateKind) -> Vec<String> {
        self.sets.set(kind).keys().cloned().collect()
    }

    /// Write one template to `file` as `{name: record}`.
    pub fn export_template(
        &self,
        kind: TemplateKind,
        name: &str,
        file: &Path,
    ) -> Result<(), StoreError> {
        let record = self.load(kind, name)?;
        let mut out = BTreeMap::new();
        out.insert(name.trim(), record);
        if let Some(parent) = file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(file, serde_json::to_string_pretty(&out)?)?;
        Ok(())
    }

    /// Merge a `{name: record}` file into the store, routing each record by
    /// its `type`. Returns the number of templates imported.
    pub fn import_templates(&mut self, file: &Path) -> Result<usize, StoreError> {
        let incoming: BTreeMap<String, TemplateRecord> =
            serde_json::from_str(&std::fs::read_to_string(file)?)?;

        let mut imported = 0;
        for (name, record) in incoming {
            let name = match Self::checked_name(&name) {
                Ok(name) => name.to_string(),
                Err(_) => {
                    warn!(file = %file.display(), "Skipping template with empty name");
                    continue;
                }
            };
            self.sets.set_mut(record.kind).insert(name, record);
            imported += 1;
        }

        self.persist()?;
        info!(file = %file.display(), imported, "Templates imported");
        Ok(imported)
    }
}

fn default_watermark() -> TemplateRecord {
    TemplateRecord::default()
}

/// User settings remembered between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub last_output_folder: String,

    #[serde(default)]
    pub last_input_folder: String,

    #[serde(default)]
    pub last_watermark_template: Option<String>,

    #[serde(default = "default_watermark")]
    pub default_watermark: TemplateRecord,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_output_folder: String::new(),
            last_input_folder: String::new(),
            last_watermark_template: None,
            default_watermark: default_watermark(),
        }
    }
}

impl Settings {
    /// Load settings from `dir`; missing keys take defaults and a missing or
    /// corrupt file yields the defaults.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(SETTINGS_FILE), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn text_record(text: &str) -> TemplateRecord {
        TemplateRecord {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_corrupt_templates_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(TEMPLATES_FILE), "{\"text\": [oops").unwrap();

        let mut store = TemplateStore::open(dir.path()).unwrap();
        assert!(store.list(TemplateKind::Text).is_empty());
        assert!(store.list(TemplateKind::Image).is_empty());

        store.save(TemplateKind::Text, "fresh", text_record("new")).unwrap();
        let reopened = TemplateStore::open(dir.path()).unwrap();
        assert_eq!(reopened.list(TemplateKind::Text), vec!["fresh".to_string()]);
    }

    #[test]
    fn test_save_load_roundtrip_through_disk() {
        let dir = TempDir::new().unwrap();
        let mut store = TemplateStore::open(dir.path()).unwrap();
        store.save(TemplateKind::Text, "  Studio ", text_record("© Studio")).unwrap();

        let reopened = TemplateStore::open(dir.path()).unwrap();
        assert_eq!(reopened.list(TemplateKind::Text), vec!["Studio".to_string()]);
        assert_eq!(reopened.load(TemplateKind::Text, "Studio").unwrap().text, "© Studio");
        assert!(reopened.list(TemplateKind::Image).is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = TemplateStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.save(TemplateKind::Text, "   ", text_record("x")),
            Err(StoreError::EmptyName)
        ));
    }

    #[test]
    fn test_kinds_are_separate() {
        let dir = TempDir::new().unwrap();
        let mut store = TemplateStore::open(dir.path()).unwrap();
        store.save(TemplateKind::Image, "logo", TemplateRecord::default()).unwrap();

        assert_eq!(store.load(TemplateKind::Image, "logo").unwrap().kind, TemplateKind::Image);
        assert!(matches!(
            store.load(TemplateKind::Text, "logo"),
            Err(StoreError::NotFound { kind: "text", .. })
        ));
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let mut store = TemplateStore::open(dir.path()).unwrap();
        store.save(TemplateKind::Text, "a", text_record("a")).unwrap();
        store.delete(TemplateKind::Text, "a").unwrap();
        assert!(store.list(TemplateKind::Text).is_empty());
        assert!(store.delete(TemplateKind::Text, "a").is_err());
    }

    #[test]
    fn test_settings_defaults_merge() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"last_output_folder": "/out"}"#,
        )
        .unwrap();

        let settings = Settings::load(dir.path());
        assert_eq!(settings.last_output_folder, "/out");
        assert_eq!(settings.last_input_folder, "");
        assert_eq!(settings.last_watermark_template, None);
        assert_eq!(settings.default_watermark, TemplateRecord::default());
    }

    #[test]
    fn test_settings_corrupt_or_missing_yields_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Settings::load(dir.path()), Settings::default());
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        assert_eq!(Settings::load(dir.path()), Settings::default());
    }
}
