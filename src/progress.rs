//! Progress-callback trait for folder conversion events.
//!
//! Pass a [`FolderProgressCallback`] to
//! [`crate::convert::convert_folder_with_progress`] to receive an event per
//! statement file as a folder is processed.
//!
//! # Why callbacks instead of return values?
//!
//! A folder of statements can take a while (pdfium is not fast on large
//! scans). The callback lets a terminal progress bar, a log sink or a GUI
//! follow along without the library knowing how the host application
//! reports progress. The final [`FolderReport`] still carries everything.
//!
//! # Example
//!
//! ```rust
//! use ics_statement::{ConversionReport, FolderProgressCallback};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl FolderProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, report: &ConversionReport) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{}: {} transactions", index, total, report.transactions);
//!     }
//! }
//! ```

use crate::convert::{ConversionReport, FolderReport};
use std::path::Path;

/// Called by the folder driver as it processes each statement file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait FolderProgressCallback: Send + Sync {
    /// Called once, after the statement files have been listed.
    fn on_folder_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is parsed.
    fn on_file_start(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when a file's destination already exists.
    fn on_file_skipped(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when a file was converted and written.
    fn on_file_complete(&self, index: usize, total: usize, report: &ConversionReport) {
        let _ = (index, total, report);
    }

    /// Called when a file failed; the folder run continues.
    fn on_file_error(&self, index: usize, total: usize, path: &Path, error: &str) {
        let _ = (index, total, path, error);
    }

    /// Called once after every file has been attempted.
    fn on_folder_complete(&self, report: &FolderReport) {
        let _ = report;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl FolderProgressCallback for NoopProgressCallback {}
