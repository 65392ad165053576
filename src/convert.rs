//! Conversion entry points: token source → statement → file.
//!
//! ## Layers
//!
//! * [`parse_statement`] works on any [`TokenSource`] and never touches the
//!   file system. Tests drive it with hand-built pages.
//! * [`parse_file`] opens a PDF with pdfium and adds the file-name check.
//! * [`convert_file`] / [`convert_folder`] parse, validate and export.
//!
//! A fatal error discards the whole document: no partial statement is ever
//! returned or written.

use crate::config::{ExportConfig, ParseConfig};
use crate::error::{StatementError, Warning};
use crate::export::export_to_file;
use crate::output::{ParsedStatement, Statement};
use crate::pipeline::columns::classify_line;
use crate::pipeline::context::ContextTracker;
use crate::pipeline::extract::PdfiumSource;
use crate::pipeline::header::{header_words_to_fields, StatementHeader};
use crate::pipeline::input::{destination_path, statement_files};
use crate::pipeline::lines::group_by_lines;
use crate::pipeline::tokens::{Granularity, TokenSource};
use crate::pipeline::validate::{check_file_name, check_totals};
use crate::progress::{FolderProgressCallback, NoopProgressCallback};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of converting one statement file.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Number of transactions written.
    pub transactions: usize,
    pub warnings: Vec<Warning>,
}

/// Outcome of converting a folder of statements.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderReport {
    pub converted: Vec<ConversionReport>,
    /// Sources whose destination already existed.
    pub skipped: Vec<PathBuf>,
    /// Sources that failed, with the error message.
    pub failed: Vec<(PathBuf, String)>,
}

/// Parse a statement from positioned text.
///
/// The header is read from page 1; every page then contributes its table
/// rows. Totals are checked against the transactions and any mismatch is
/// reported as a warning.
///
/// # Errors
/// Any [`StatementError`] aborts the document: unexpected table headers,
/// an empty page, a malformed date or amount, an orphan exchange-rate note.
pub fn parse_statement<S>(source: &S, config: &ParseConfig) -> Result<ParsedStatement, StatementError>
where
    S: TokenSource + ?Sized,
{
    let layout = &config.layout;
    let total_pages = source.page_count();
    if total_pages == 0 {
        return Err(StatementError::Layout("Document has no pages".into()));
    }

    // ── Step 1: Header ───────────────────────────────────────────────────
    let mut warnings = Vec::new();
    let header_words = source.tokens(
        0,
        &layout.regions.metadata,
        Granularity::Words { text_flow: false },
    )?;
    let fields = header_words_to_fields(
        &header_words,
        config.line_tolerance,
        config.header_x_tolerance,
        &mut warnings,
    )?;
    let header = StatementHeader::from_fields(&fields)?;
    info!(
        "Statement {} of {} (serial {})",
        header.date, header.customer_number, header.serial_number
    );

    // ── Step 2: Table rows, page by page ─────────────────────────────────
    let mut tracker = ContextTracker::new(header.date);
    for page in 0..total_pages {
        let table_header = source.tokens(
            page,
            &layout.regions.table_header,
            Granularity::Words { text_flow: true },
        )?;
        let (boundaries, drift) = layout.resolve_boundaries(&table_header, page + 1)?;
        warnings.extend(drift);

        let chars = source.tokens(page, layout.regions.body(page), Granularity::Chars)?;
        let lines = group_by_lines(&chars, config.line_tolerance)?;
        if lines.is_empty() {
            return Err(StatementError::Layout(format!(
                "No text found on page {}",
                page + 1
            )));
        }
        debug!("Page {}: {} lines", page + 1, lines.len());

        for line in &lines {
            tracker.step(classify_line(line, &boundaries))?;
        }
    }

    // ── Step 3: Assemble and check ───────────────────────────────────────
    let (transactions, tracker_warnings) = tracker.finish();
    warnings.extend(tracker_warnings);

    let statement = Statement {
        date: header.date,
        customer_number: header.customer_number,
        serial_number: header.serial_number,
        previous_balance: header.previous_balance,
        total_received_payment: header.total_received_payment,
        total_new_expenses: header.total_new_expenses,
        new_balance: header.new_balance,
        transactions,
    };
    warnings.extend(check_totals(&statement));

    info!(
        "Parsed {} transactions over {} pages, {} warnings",
        statement.transactions.len(),
        total_pages,
        warnings.len()
    );
    Ok(ParsedStatement {
        statement,
        warnings,
    })
}

/// Parse the statement PDF at `path`.
///
/// On top of [`parse_statement`], warns when the `YYYY-MM` in the file name
/// does not match the statement date.
pub fn parse_file(path: &Path, config: &ParseConfig) -> Result<ParsedStatement, StatementError> {
    let start = Instant::now();
    info!("Parsing {}", path.display());

    let source = PdfiumSource::open(path, config.password.as_deref())?
        .with_x_tolerance(config.word_x_tolerance);
    let mut parsed = parse_statement(&source, config)?;

    if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
        parsed
            .warnings
            .extend(check_file_name(&parsed.statement, file_name));
    }

    debug!("Parsed {} in {}ms", path.display(), start.elapsed().as_millis());
    Ok(parsed)
}

/// Parse, validate and export one statement file.
///
/// The destination is derived from `path` and `export` (see
/// [`destination_path`]) and written atomically.
pub fn convert_file(
    path: &Path,
    parse: &ParseConfig,
    export: &ExportConfig,
) -> Result<ConversionReport, StatementError> {
    let destination = destination_path(path, export.format, export.dest_dir.as_deref())?;
    let parsed = parse_file(path, parse)?;
    export_to_file(&parsed.statement, export.format, &destination)?;

    info!(
        "Converted {} → {} ({} transactions)",
        path.display(),
        destination.display(),
        parsed.statement.transactions.len()
    );
    Ok(ConversionReport {
        source: path.to_path_buf(),
        destination,
        transactions: parsed.statement.transactions.len(),
        warnings: parsed.warnings,
    })
}

/// Convert every statement PDF in `dir` (see
/// [`crate::pipeline::input::statement_files`]).
///
/// Files whose destination already exists are skipped. A failing file is
/// logged and recorded in [`FolderReport::failed`]; the others still run.
pub fn convert_folder(
    dir: &Path,
    parse: &ParseConfig,
    export: &ExportConfig,
) -> Result<FolderReport, StatementError> {
    convert_folder_with_progress(dir, parse, export, &NoopProgressCallback)
}

/// [`convert_folder`] with per-file progress events.
pub fn convert_folder_with_progress(
    dir: &Path,
    parse: &ParseConfig,
    export: &ExportConfig,
    progress: &dyn FolderProgressCallback,
) -> Result<FolderReport, StatementError> {
    let files = statement_files(dir)?;
    let total = files.len();
    let mut report = FolderReport::default();
    progress.on_folder_start(total);

    if files.is_empty() {
        warn!("No statement files found in {}", dir.display());
        progress.on_folder_complete(&report);
        return Ok(report);
    }
    info!("Found {} statement files in {}", total, dir.display());

    for (i, path) in files.into_iter().enumerate() {
        let index = i + 1;
        let destination = match destination_path(&path, export.format, export.dest_dir.as_deref()) {
            Ok(destination) => destination,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                progress.on_file_error(index, total, &path, &e.to_string());
                report.failed.push((path, e.to_string()));
                continue;
            }
        };
        if destination.exists() {
            info!("Skip {}: {} exists", path.display(), destination.display());
            progress.on_file_skipped(index, total, &path);
            report.skipped.push(path);
            continue;
        }

        progress.on_file_start(index, total, &path);
        match convert_file(&path, parse, export) {
            Ok(converted) => {
                progress.on_file_complete(index, total, &converted);
                report.converted.push(converted);
            }
            Err(e) => {
                error!("{}: {}", path.display(), e);
                progress.on_file_error(index, total, &path, &e.to_string());
                report.failed.push((path, e.to_string()));
            }
        }
    }

    info!(
        "Folder done: {} converted, {} skipped, {} failed",
        report.converted.len(),
        report.skipped.len(),
        report.failed.len()
    );
    progress.on_folder_complete(&report);
    Ok(report)
}
