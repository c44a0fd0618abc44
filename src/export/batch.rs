//! Batch export driver.

use super::{output_file_name, save_image, ExportError, NamingRule, OutputFormat, ResizeRule};
use super::format::DEFAULT_QUALITY;
use crate::watermark::{WatermarkConfig, WatermarkRenderer};
use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of failed file names listed in a summary before collapsing.
const SUMMARY_FAILURE_LIMIT: usize = 5;

/// One source image in a batch, optionally already decoded.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub path: PathBuf,
    image: Option<Arc<DynamicImage>>,
}

impl BatchItem {
    /// Item decoded lazily from `path` when exported.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            image: None,
        }
    }

    /// Item with an already decoded host image.
    pub fn with_image(path: impl Into<PathBuf>, image: Arc<DynamicImage>) -> Self {
        Self {
            path: path.into(),
            image: Some(image),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn load(&self) -> Result<Arc<DynamicImage>, ExportError> {
        match &self.image {
            Some(image) => Ok(Arc::clone(image)),
            None => Ok(Arc::new(image::open(&self.path)?)),
        }
    }
}

/// Where and how exported files are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub naming: NamingRule,
    pub format: OutputFormat,
    /// JPEG quality, 1-100
    pub quality: u8,
    pub resize: Option<ResizeRule>,
}

impl ExportOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            naming: NamingRule::default(),
            format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            resize: None,
        }
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ExportError::InvalidOption(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ExportError::InvalidOption(
                "output folder must not be empty".to_string(),
            ));
        }
        if let Some(rule) = &self.resize {
            rule.validate()?;
        }
        Ok(())
    }
}

/// Outcome of a batch export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub success_count: usize,
    pub failed_count: usize,
    pub failed_files: Vec<String>,
}

impl BatchReport {
    /// Report for a batch where nothing could be exported.
    pub fn all_failed(failed_files: Vec<String>) -> Self {
        Self {
            success_count: 0,
            failed_count: failed_files.len(),
            failed_files,
        }
    }

    pub fn total(&self) -> usize {
        self.success_count + self.failed_count
    }

    /// Human summary; at most the first five failures are named.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Exported {} image(s), {} failed",
            self.success_count, self.failed_count
        );
        if self.failed_files.is_empty() {
            return out;
        }

        out.push_str("\nFailed files:");
        for name in self.failed_files.iter().take(SUMMARY_FAILURE_LIMIT) {
            out.push_str("\n  ");
            out.push_str(name);
        }
        if self.failed_files.len() > SUMMARY_FAILURE_LIMIT {
            out.push_str(&format!(
                "\n  ... {} more",
                self.failed_files.len() - SUMMARY_FAILURE_LIMIT
            ));
        }
        out
    }
}

/// Export every item, recording per-image failures and carrying on.
pub fn run_batch(
    renderer: &WatermarkRenderer,
    items: &[BatchItem],
    config: &WatermarkConfig,
    options: &ExportOptions,
) -> BatchReport {
    if let Err(e) = options.validate() {
        warn!(error = %e, "Export options rejected");
        return BatchReport::all_failed(items.iter().map(BatchItem::file_name).collect());
    }

    let mut report = BatchReport::default();
    for item in items {
        match export_one(renderer, item, config, options) {
            Ok(path) => {
                debug!(source = %item.path.display(), output = %path.display(), "Exported image");
                report.success_count += 1;
            }
            Err(e) => {
                warn!(source = %item.path.display(), error = %e, "Export failed");
                report.failed_count += 1;
                report.failed_files.push(item.file_name());
            }
        }
    }

    info!(
        succeeded = report.success_count,
        failed = report.failed_count,
        output = %options.output_dir.display(),
        "Batch export finished"
    );
    report
}

/// Export a single image, returning the written path.
pub fn export_single(
    renderer: &WatermarkRenderer,
    item: &BatchItem,
    config: &WatermarkConfig,
    options: &ExportOptions,
) -> Result<PathBuf, ExportError> {
    options.validate()?;
    export_one(renderer, item, config, options)
}

fn export_one(
    renderer: &WatermarkRenderer,
    item: &BatchItem,
    config: &WatermarkConfig,
    options: &ExportOptions,
) -> Result<PathBuf, ExportError> {
    let host = item.load()?;

    // A stamp that cannot be built leaves the host unwatermarked
    let mut image = renderer.apply(&host, config);
    if let Some(rule) = &options.resize {
        image = rule.apply(image)?;
    }

    let name = output_file_name(&item.path, &options.naming, options.format);
    let path = options.output_dir.join(name);
    save_image(&image, &path, options.format, options.quality)?;
    Ok(path)
}

fn resolved(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Whether `output_dir` is the folder of any of `sources`.
pub fn is_same_folder<P: AsRef<Path>>(output_dir: &Path, sources: &[P]) -> bool {
    let output = resolved(output_dir);
    sources.iter().any(|source| {
        source
            .as_ref()
            .parent()
            .map(|parent| {
                let parent = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
                resolved(parent) == output
            })
            .unwrap_or(false)
    })
}

/// Reject writing next to the sources unless the caller confirmed it.
pub fn check_output_folder<P: AsRef<Path>>(
    output_dir: &Path,
    sources: &[P],
    confirmed: bool,
) -> Result<(), ExportError> {
    if !confirmed && is_same_folder(output_dir, sources) {
        return Err(ExportError::RequiresConfirmation(output_dir.to_path_buf()));
    }
    Ok(())
}
