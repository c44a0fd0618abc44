//! The set of source photos loaded for watermarking.

use crate::export::BatchItem;
use crate::watermark::WatermarkError;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions accepted as host images.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Whether `path` has a supported image extension (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// A decoded source photo.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub image: Arc<DynamicImage>,
    pub original_size: (u32, u32),
}

impl ImageEntry {
    /// Decode `path`, normalizing the pixels to RGB8 or RGBA8.
    pub fn open(path: &Path) -> Result<Self, WatermarkError> {
        if !path.exists() {
            return Err(WatermarkError::MissingSource(path.to_path_buf()));
        }
        if !is_supported_image(path) {
            return Err(WatermarkError::DecodeError(format!(
                "unsupported file type: {}",
                path.display()
            )));
        }

        let decoded = image::open(path)
            .map_err(|e| WatermarkError::DecodeError(format!("{}: {}", path.display(), e)))?;
        let image = if decoded.color().has_alpha() {
            DynamicImage::ImageRgba8(decoded.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        };

        Ok(Self {
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            original_size: (image.width(), image.height()),
            image: Arc::new(image),
        })
    }

    pub fn batch_item(&self) -> BatchItem {
        BatchItem::with_image(&self.path, Arc::clone(&self.image))
    }
}

/// Ordered list of loaded photos with a current selection.
#[derive(Debug, Default)]
pub struct ImageLibrary {
    entries: Vec<ImageEntry>,
    current: Option<usize>,
}

impl ImageLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one photo. Paths already in the library are not added twice.
    pub fn add_image(&mut self, path: &Path) -> Result<&ImageEntry, WatermarkError> {
        if let Some(index) = self.entries.iter().position(|e| e.path == path) {
            return Ok(&self.entries[index]);
        }

        let entry = ImageEntry::open(path)?;
        debug!(
            path = %path.display(),
            width = entry.original_size.0,
            height = entry.original_size.1,
            "Image loaded"
        );
        self.entries.push(entry);
        if self.current.is_none() {
            self.current = Some(0);
        }
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Load every supported photo directly inside `dir`, sorted by name.
    /// Returns the number of photos added.
    pub fn add_folder(&mut self, dir: &Path) -> usize {
        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let before = self.entries.len();
        for path in paths {
            if let Err(e) = self.add_image(&path) {
                warn!(path = %path.display(), error = %e, "Skipping unreadable image");
            }
        }
        self.entries.len() - before
    }

    /// Remove the entry at `index`, keeping the selection on a valid entry.
    pub fn remove(&mut self, index: usize) -> Option<ImageEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        self.current = match self.current {
            _ if self.entries.is_empty() => None,
            Some(cur) if cur > index => Some(cur - 1),
            Some(cur) => Some(cur.min(self.entries.len() - 1)),
            None => None,
        };
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&ImageEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn select(&mut self, index: usize) -> Option<&ImageEntry> {
        if index < self.entries.len() {
            self.current = Some(index);
        }
        self.current()
    }

    /// Move to the next photo, stopping at the last one.
    pub fn next(&mut self) -> Option<&ImageEntry> {
        if let Some(cur) = self.current {
            if cur + 1 < self.entries.len() {
                self.current = Some(cur + 1);
            }
        }
        self.current()
    }

    /// Move to the previous photo, stopping at the first one.
    pub fn previous(&mut self) -> Option<&ImageEntry> {
        if let Some(cur) = self.current {
            self.current = Some(cur.saturating_sub(1));
        }
        self.current()
    }

    pub fn batch_items(&self) -> Vec<BatchItem> {
        self.entries.iter().map(ImageEntry::batch_item).collect()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }
}
