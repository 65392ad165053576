//! # ics-statement
//!
//! Convert ICS credit card statements (PDF) into transaction records, and
//! export them as CSV, TSV or JSON.
//!
//! ## Why positioned text?
//!
//! Generic PDF-to-text tools flatten the statement table into one stream of
//! words: descriptions, locations and amounts run together, and the card
//! holder and exchange-rate notes lose the row they belong to. This crate
//! reads every character with its position and font instead, rebuilds the
//! table columns from the printed table header, and attaches the
//! annotations through a small state machine.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate the file (exists, readable, %PDF)
//!  ├─ 2. Extract   every character with box and font, via pdfium
//!  ├─ 3. Header    label/value pairs on page 1 (date, serial, balances)
//!  ├─ 4. Layout    column boundaries from the table header, per page
//!  ├─ 5. Rows      lines → cells, bold lines → annotations
//!  ├─ 6. Context   card number, card owner, exchange rate → records
//!  ├─ 7. Validate  totals vs. records, file name vs. statement date
//!  └─ 8. Export    CSV / TSV / JSON, written atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ics_statement::{convert_file, ExportConfig, OutputFormat, ParseConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let export = ExportConfig::builder().format(OutputFormat::Json).build()?;
//!     let report = convert_file(
//!         Path::new("Rekeningoverzicht-2025-08.pdf"),
//!         &ParseConfig::default(),
//!         &export,
//!     )?;
//!     for warning in &report.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     println!("{} transactions → {}", report.transactions, report.destination.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ics2csv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! ics-statement = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! The pdfium shared library is looked up in `PDFIUM_LIB_PATH`, then in the
//! current directory, then system-wide. Code that already has positioned
//! text can skip pdfium entirely and call [`parse_statement`] on any
//! [`TokenSource`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExportConfig, ExportConfigBuilder, OutputFormat, ParseConfig, ParseConfigBuilder};
pub use convert::{
    convert_file, convert_folder, convert_folder_with_progress, parse_file, parse_statement,
    ConversionReport, FolderReport,
};
pub use error::{StatementError, Warning};
pub use export::{export_to_file, render};
pub use output::{ParsedStatement, Statement, Transaction};
pub use pipeline::extract::PdfiumSource;
pub use pipeline::layout::LayoutSchema;
pub use pipeline::tokens::{ExtractedDocument, Granularity, PageChars, Region, Token, TokenSource};
pub use pipeline::validate::validate;
pub use progress::{FolderProgressCallback, NoopProgressCallback};
