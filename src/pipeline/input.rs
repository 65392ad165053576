//! Input resolution: validate statement files, pick them out of a folder and
//! name their outputs.
//!
//! ## Why check the magic bytes ourselves?
//!
//! pdfium reports a text file or a truncated download as a generic load
//! failure. Reading the first four bytes (`%PDF`) before binding the library
//! gives callers a precise [`StatementError::NotAPdf`] instead, and works
//! even where no pdfium library is installed.

use crate::config::OutputFormat;
use crate::error::StatementError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Statement files carry their year and month: `Rekeningoverzicht-2025-08.pdf`.
static RE_STATEMENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-_]\d{4}-\d{2}").expect("statement name pattern is valid"));

/// Check that `path` exists, is readable and starts with the PDF magic bytes.
pub fn validate_pdf(path: &Path) -> Result<(), StatementError> {
    if !path.exists() {
        return Err(StatementError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(StatementError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(StatementError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(StatementError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(())
}

/// Where the export of `source` goes.
///
/// The file stem is kept and the extension replaced; it is lower-case when
/// the source has a lower-case `pdf` extension and upper-case otherwise, so
/// `SCAN.PDF` becomes `SCAN.CSV`. Without `dest_dir` the file lands next to
/// its source.
pub fn destination_path(
    source: &Path,
    format: OutputFormat,
    dest_dir: Option<&Path>,
) -> Result<PathBuf, StatementError> {
    let stem = source.file_stem().ok_or_else(|| {
        StatementError::InvalidConfig(format!("{} has no file name", source.display()))
    })?;

    let extension = if source.extension().is_some_and(|e| e == "pdf") {
        format.extension().to_string()
    } else {
        format.extension().to_uppercase()
    };

    let dir = match dest_dir {
        Some(dir) if !dir.is_dir() => {
            return Err(StatementError::InvalidConfig(format!(
                "{} is not a directory",
                dir.display()
            )))
        }
        Some(dir) => dir.to_path_buf(),
        None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(extension);
    Ok(dir.join(file_name))
}

/// True for a PDF whose name carries a `-YYYY-MM` (or `_YYYY-MM`) stamp.
pub fn is_statement_file(path: &Path) -> bool {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    let named = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| RE_STATEMENT_NAME.is_match(n));
    is_pdf && named
}

/// Statement PDFs directly inside `dir`, sorted by name.
pub fn statement_files(dir: &Path) -> Result<Vec<PathBuf>, StatementError> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => StatementError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => StatementError::FileNotFound {
            path: dir.to_path_buf(),
        },
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_statement_file(path))
        .collect();
    files.sort();
    debug!("{} statement files in {}", files.len(), dir.display());
    Ok(files)
}
