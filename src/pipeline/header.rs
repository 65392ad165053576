//! Statement header: label/value correlation in the metadata block.
//!
//! The block is printed as pairs of lines, a line of labels ("Datum",
//! "ICS-klantnummer", "Volgnummer", …) with a line of values underneath.
//! Values are not exactly aligned with their labels, so each value word is
//! claimed by the rightmost label starting at or left of it.

use crate::error::{StatementError, Warning};
use crate::pipeline::lines::group_by_lines;
use crate::pipeline::record::{parse_amount_words, parse_date};
use crate::pipeline::tokens::Token;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Label → value words, with labels lower-cased.
///
/// Most values are one word; amounts carry an indicator (`["€ 120,00",
/// "Bij"]`) and page numbers a suffix (`["1", "van 2"]`).
pub type HeaderFields = HashMap<String, Vec<String>>;

/// Correlate header labels with their values.
///
/// `line_tolerance` groups words into lines, `x_tolerance` lets a value start
/// slightly left of its label. Duplicate labels are reported in `warnings`
/// and the later value wins.
pub fn header_words_to_fields(
    words: &[Token],
    line_tolerance: f32,
    x_tolerance: f32,
    warnings: &mut Vec<Warning>,
) -> Result<HeaderFields, StatementError> {
    let mut fields = HeaderFields::new();
    let lines = group_by_lines(words, line_tolerance)?;
    if lines.len() % 2 != 0 {
        return Err(StatementError::Layout(format!(
            "Expected label and value lines in pairs in header. Found {} lines.",
            lines.len()
        )));
    }

    for pair in lines.chunks_exact(2) {
        let (labels, values) = (&pair[0], &pair[1]);

        let mut claims: Vec<(f32, String)> = labels
            .iter()
            .map(|w| (w.x0 - x_tolerance, w.text.to_lowercase()))
            .collect();
        claims.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        for (_, label) in &claims {
            if fields.insert(label.clone(), Vec::new()).is_some() {
                let w = Warning::DuplicateHeaderLabel {
                    label: label.clone(),
                };
                warn!("{}", w);
                warnings.push(w);
            }
        }

        let Some((_, lowest)) = claims.last() else {
            continue;
        };
        for word in values {
            let label = claims
                .iter()
                .find(|(threshold, _)| word.x0 >= *threshold)
                .map(|(_, label)| label)
                .unwrap_or(lowest);
            if let Some(slot) = fields.get_mut(label) {
                slot.push(word.text.clone());
            }
        }
    }

    debug!("Header fields: {:?}", fields);
    Ok(fields)
}

/// The typed header of a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementHeader {
    pub date: NaiveDate,
    pub customer_number: String,
    pub serial_number: u32,
    pub previous_balance: Decimal,
    pub total_received_payment: Decimal,
    pub total_new_expenses: Decimal,
    pub new_balance: Decimal,
}

impl StatementHeader {
    /// Extract the required fields. Balance labels were renamed over the
    /// years, so both spellings are accepted.
    pub fn from_fields(fields: &HeaderFields) -> Result<Self, StatementError> {
        let date = parse_date(&require(fields, &["datum"])?.join(" "), None)?;
        let customer_number = require(fields, &["ics-klantnummer"])?.join(" ").trim().to_string();

        let serial_words = require(fields, &["volgnummer"])?;
        let serial_number = match serial_words {
            [single] => single
                .trim()
                .parse::<u32>()
                .map_err(|_| StatementError::MalformedSerial {
                    value: single.clone(),
                })?,
            other => {
                return Err(StatementError::MalformedSerial {
                    value: other.join(" "),
                })
            }
        };

        Ok(Self {
            date,
            customer_number,
            serial_number,
            previous_balance: parse_amount_words(require(
                fields,
                &["vorig tegoed", "vorig openstaand saldo"],
            )?)?,
            total_received_payment: parse_amount_words(require(
                fields,
                &["totaal ontvangen betalingen"],
            )?)?,
            total_new_expenses: parse_amount_words(require(fields, &["totaal nieuwe uitgaven"])?)?,
            new_balance: parse_amount_words(require(
                fields,
                &["nieuw tegoed", "nieuw openstaand saldo"],
            )?)?,
        })
    }
}

/// The value of the first label present among `labels`.
fn require<'a>(fields: &'a HeaderFields, labels: &[&str]) -> Result<&'a [String], StatementError> {
    labels
        .iter()
        .find_map(|label| fields.get(*label))
        .map(Vec::as_slice)
        .ok_or_else(|| StatementError::MissingField {
            field: labels.last().copied().unwrap_or_default().to_string(),
        })
}
