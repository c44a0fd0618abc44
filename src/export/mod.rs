//! Export of watermarked images to disk.
//!
//! A batch runs every source through the same watermark configuration,
//! names the output after the source, forces the extension to the chosen
//! format and writes it. One failing image never stops the batch.

pub mod batch;
pub mod format;
pub mod naming;
pub mod resize;
pub mod worker;

use crate::watermark::WatermarkError;
use std::path::PathBuf;
use thiserror::Error;

pub use batch::{
    check_output_folder, export_single, is_same_folder, run_batch, BatchItem, BatchReport,
    ExportOptions,
};
pub use format::{save_image, OutputFormat, DEFAULT_QUALITY};
pub use naming::{output_file_name, NamingRule, DEFAULT_PREFIX, DEFAULT_SUFFIX};
pub use resize::ResizeRule;
pub use worker::{ExportHandle, ExportJob, ExportWorker};

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Watermark error: {0}")]
    Watermark(#[from] WatermarkError),

    #[error("Invalid export option: {0}")]
    InvalidOption(String),

    #[error("Output folder {0} contains source images; confirmation required")]
    RequiresConfirmation(PathBuf),

    #[error("Export worker is not running")]
    WorkerStopped,

    #[error("Export job panicked: {0}")]
    JobPanicked(String),
}
