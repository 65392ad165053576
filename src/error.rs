//! Error types for the ics-statement library.
//!
//! Two distinct types reflect two distinct severities:
//!
//! * [`StatementError`]: **Fatal**: the current document cannot be parsed
//!   (unreadable file, unexpected layout, a malformed date or amount). No
//!   partial [`crate::output::Statement`] is returned; the whole document is
//!   discarded.
//!
//! * [`Warning`]: **Non-fatal**: something looked off (column drift, an
//!   unknown annotation line, totals that do not add up) but the statement
//!   was still produced. Warnings are logged as they are found and collected
//!   in [`crate::output::ParsedStatement::warnings`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ics-statement library.
#[derive(Debug, Error)]
pub enum StatementError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium could not return the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the current\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Layout errors ─────────────────────────────────────────────────────
    /// The positioned text does not have the shape the layout requires.
    #[error("Unexpected layout: {0}")]
    Layout(String),

    /// A required label is absent from the statement header.
    #[error("'{field}' not found in header")]
    MissingField { field: String },

    /// A date cell could not be parsed.
    #[error("Invalid date {input:?}: {reason}")]
    DateParse { input: String, reason: String },

    /// An amount cell could not be parsed.
    #[error("Invalid amount {input:?}: {reason}")]
    AmountParse { input: String, reason: String },

    /// An exchange-rate note appeared without a transaction right before it.
    #[error("Found {text:?} without prior transaction line")]
    OrphanAnnotation { text: String },

    /// The serial number is not a single integer.
    #[error("Serial number {value:?} is not an integer")]
    MalformedSerial { value: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited-text serialisation failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialisation failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StatementError {
    pub(crate) fn date(input: impl Into<String>, reason: impl Into<String>) -> Self {
        StatementError::DateParse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn amount(input: impl Into<String>, reason: impl Into<String>) -> Self {
        StatementError::AmountParse {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// A non-fatal finding reported while parsing or validating a statement.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum Warning {
    /// Table header positions moved relative to the reference layout.
    #[error(
        "Page {page}: header positions have changed; expected column boundaries \
         {expected:?}, found {found:?}. Adjusting columns accordingly, but you may \
         get unexpected results."
    )]
    BoundaryDrift {
        page: usize,
        expected: Vec<f32>,
        found: Vec<f32>,
    },

    /// The same header label appeared in more than one header block.
    #[error("Duplicate header {label:?}")]
    DuplicateHeaderLabel { label: String },

    /// A bold free-text line that is not a known sentence.
    #[error("Unknown line {text:?}")]
    UnrecognizedAnnotation { text: String },

    /// Declared new expenses differ from the sum of negative transactions.
    #[error("Total new expenses is listed as {declared}, but sum of negative transactions is {computed}")]
    ExpensesMismatch { declared: Decimal, computed: Decimal },

    /// Declared received payments differ from the sum of positive transactions.
    #[error("Total received payments is listed as {declared}, but sum of positive transactions is {computed}")]
    PaymentsMismatch { declared: Decimal, computed: Decimal },

    /// `previous + received + expenses` does not give the declared new balance.
    #[error("Expected new balance to be {expected}, found {found}")]
    BalanceMismatch { expected: Decimal, found: Decimal },

    /// The year-month in the file name does not match the statement date.
    #[error("{file} is dated {statement_date}, expected in {year:04}-{month:02}")]
    FilenameDateMismatch {
        file: String,
        statement_date: NaiveDate,
        year: i32,
        month: u32,
    },
}
