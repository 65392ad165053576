//! Writing converted statements: CSV, TSV and JSON.
//!
//! Delimited exports hold one row per transaction, prefixed with the
//! statement month so that several months can be concatenated into one
//! sheet. JSON holds the whole [`Statement`], header totals included.

use crate::config::OutputFormat;
use crate::error::StatementError;
use crate::output::{Statement, Transaction};
use serde::Serialize;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column names of delimited exports.
pub fn delimited_header() -> Vec<&'static str> {
    let mut header = Vec::with_capacity(Transaction::FIELD_NAMES.len() + 1);
    header.push("month");
    header.extend(Transaction::FIELD_NAMES);
    header
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(T::to_string).unwrap_or_default()
}

fn delimited_row(month: &str, t: &Transaction) -> [String; 12] {
    [
        month.to_string(),
        t.transaction_date.to_string(),
        t.booking_date.to_string(),
        t.description.clone(),
        t.location.clone(),
        t.country.clone(),
        t.amount.to_string(),
        optional(&t.foreign_amount),
        optional(&t.foreign_currency),
        optional(&t.foreign_exchange_rate),
        t.card_last_numbers.clone(),
        t.card_owner.clone(),
    ]
}

/// Write the transactions of `statement` as delimited text.
pub fn write_delimited<W: Write>(
    statement: &Statement,
    delimiter: u8,
    writer: W,
) -> Result<(), StatementError> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    csv.write_record(delimited_header())?;

    let month = statement.month();
    for t in &statement.transactions {
        csv.write_record(delimited_row(&month, t))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write `statement` as JSON, indented by four spaces.
pub fn write_json<W: Write>(statement: &Statement, writer: W) -> Result<(), StatementError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    statement.serialize(&mut serializer)?;
    Ok(())
}

/// Render `statement` in `format` into memory.
pub fn render(statement: &Statement, format: OutputFormat) -> Result<Vec<u8>, StatementError> {
    let mut buffer = Vec::new();
    match format.delimiter() {
        Some(delimiter) => write_delimited(statement, delimiter, &mut buffer)?,
        None => {
            write_json(statement, &mut buffer)?;
            buffer.push(b'\n');
        }
    }
    Ok(buffer)
}

/// Export `statement` to `path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// half-written file that a later folder run would mistake for done.
pub fn export_to_file(
    statement: &Statement,
    format: OutputFormat,
    path: &Path,
) -> Result<(), StatementError> {
    let bytes = render(statement, format)?;

    let tmp_path = temp_path(path);
    std::fs::write(&tmp_path, &bytes).map_err(|e| StatementError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(StatementError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
