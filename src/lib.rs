// Photo watermark library

pub mod config;
pub mod error;
pub mod export;
pub mod library;
pub mod logging;
pub mod store;
pub mod watermark;

pub use error::{Error, Result};
