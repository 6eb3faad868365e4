//! Export modules
//!
//! Handles screenshot export:
//! - Screenshot: capture at a requested resolution, then restore the viewport
//! - Image: PNG encoding of captured frames
//! - Filename: timestamped download names
//! - Download: delivery of encoded files

pub mod download;
pub mod filename;
pub mod image_export;
pub mod screenshot;

pub use download::{Download, DownloadSink, FileDownloader};
pub use image_export::encode_png;
pub use screenshot::{ExportError, ExportReport, ExportRequest, ScreenshotExporter};
