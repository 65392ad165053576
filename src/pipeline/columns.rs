//! Column assembly and row classification for table body lines.

use crate::pipeline::lines::Line;

/// Font-name suffix (lower-cased) marking a free-text sentence line.
const BOLD_FONT_SUFFIX: &str = "-bold";

/// A classified body line.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyRow {
    /// A bold narrative line, joined into one string.
    FreeText(String),
    /// A line split into one string per column.
    Columns(Vec<String>),
}

/// True when the line is a bold sentence rather than a table row.
pub fn is_sentence_line(line: &Line) -> bool {
    line.first()
        .is_some_and(|c| c.font_name.to_lowercase().ends_with(BOLD_FONT_SUFFIX))
}

/// Assign each character of a line to a column.
///
/// A character belongs to the rightmost boundary that is `<=` its `x0`
/// (characters left of every boundary go to column 0). Amounts are
/// right-aligned and may start left of their header, so the lookup runs
/// from the right.
pub fn group_by_columns(line: &Line, boundaries: &[f32]) -> Vec<String> {
    let mut by_left: Vec<(f32, usize)> = boundaries
        .iter()
        .enumerate()
        .map(|(index, &left)| (left, index))
        .collect();
    by_left.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));

    let mut row = vec![String::new(); boundaries.len()];
    if row.is_empty() {
        return row;
    }
    for c in line {
        let column = by_left
            .iter()
            .find(|(left, _)| c.x0 >= *left)
            .map(|&(_, index)| index)
            .unwrap_or(0);
        row[column].push_str(&c.text);
    }
    row
}

/// Classify a line and, for table rows, split it into columns.
pub fn classify_line(line: &Line, boundaries: &[f32]) -> BodyRow {
    if is_sentence_line(line) {
        BodyRow::FreeText(line.iter().map(|c| c.text.as_str()).collect())
    } else {
        BodyRow::Columns(group_by_columns(line, boundaries))
    }
}
