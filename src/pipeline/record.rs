//! Record parsing: dates, localised amounts and transaction rows.
//!
//! Statements are Dutch: months are abbreviated (`jan`, `mrt`, `okt`, …),
//! amounts use `.` for thousands and `,` for decimals, and the sign comes
//! from a trailing `Bij` (credit) / `Af` (debit) indicator.

use crate::error::StatementError;
use crate::output::Transaction;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Partial dates may lie this many days after the year hint before they are
/// moved to the previous year.
const YEAR_HINT_TOLERANCE_DAYS: i64 = 40;

/// Credit indicator.
pub const CREDIT: &str = "Bij";
/// Debit indicator.
pub const DEBIT: &str = "Af";

/// Number of columns in a transaction row.
pub const ROW_WIDTH: usize = 9;

const MONTHS: &[(&str, u32)] = &[
    ("jan", 1),
    ("feb", 2),
    ("maa", 3),
    ("apr", 4),
    ("mei", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("okt", 10),
    ("nov", 11),
    ("dec", 12),
    ("mar", 3),
    ("mrt", 3),
    ("may", 5),
    ("oct", 10),
];

fn parse_month(month: &str) -> Option<u32> {
    let prefix: String = month.chars().take(3).collect::<String>().to_lowercase();
    if prefix.chars().count() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .find(|(name, _)| *name == prefix)
        .map(|&(_, number)| number)
}

/// Parse `"day month"` or `"day month year"`.
///
/// A partial date takes its year from `year_hint`, unless that would put it
/// more than 40 days after the hint, in which case the previous year is
/// used. This keeps late-December purchases on a January statement in the
/// right year.
pub fn parse_date(input: &str, year_hint: Option<NaiveDate>) -> Result<NaiveDate, StatementError> {
    let items: Vec<&str> = input.split_whitespace().collect();
    if items.len() != 2 && items.len() != 3 {
        return Err(StatementError::date(input, "expected 'day month [year]'"));
    }

    let day: u32 = items[0]
        .parse()
        .map_err(|_| StatementError::date(input, format!("invalid day {:?}", items[0])))?;
    let month = parse_month(items[1])
        .ok_or_else(|| StatementError::date(input, format!("unknown month {:?}", items[1])))?;

    let year = match (items.get(2), year_hint) {
        (Some(y), _) => y
            .parse::<i32>()
            .map_err(|_| StatementError::date(input, format!("invalid year {y:?}")))?,
        (None, None) => return Err(StatementError::date(input, "partial date without year hint")),
        (None, Some(hint)) => {
            // No cutoff past the end of the calendar: nothing can lie beyond it.
            let cutoff = hint.checked_add_signed(Duration::days(YEAR_HINT_TOLERANCE_DAYS));
            match (NaiveDate::from_ymd_opt(hint.year(), month, day), cutoff) {
                (Some(d), Some(cutoff)) if d > cutoff => hint.year() - 1,
                _ => hint.year(),
            }
        }
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| StatementError::date(input, "no such calendar date"))
}

/// Render a date in the statement's own `"day mon year"` form.
pub fn format_date(date: NaiveDate) -> String {
    let month = MONTHS
        .iter()
        .find(|(_, number)| *number == date.month())
        .map(|(name, _)| *name)
        .unwrap_or("jan");
    format!("{} {} {}", date.day(), month, date.year())
}

/// Parse an amount such as `"€ 1.234,56"` with its `Bij`/`Af` indicator.
///
/// `Af` turns a positive magnitude negative. A value that is already
/// negative keeps its sign whatever the indicator says.
pub fn parse_amount(amount: &str, indicator: &str) -> Result<Decimal, StatementError> {
    let normalised = amount
        .trim_matches(|c| c == '€' || c == ' ')
        .replace('.', "")
        .replace(',', ".");
    let mut value = Decimal::from_str(&normalised).map_err(|_| {
        StatementError::amount(amount, "can't be parsed as a numeric amount")
    })?;

    match indicator.trim() {
        CREDIT => {}
        DEBIT => {
            if value.is_sign_positive() && !value.is_zero() {
                value = -value;
            }
        }
        other => {
            return Err(StatementError::amount(
                amount,
                format!("Expected 'Bij' or 'Af', found {other:?}"),
            ))
        }
    }
    Ok(value)
}

/// Parse an amount given as separate words: the number, then an optional
/// indicator. Anything after the indicator is an error.
pub fn parse_amount_words<S: AsRef<str>>(words: &[S]) -> Result<Decimal, StatementError> {
    match words {
        [] => Err(StatementError::amount("", "empty amount")),
        [amount] => parse_amount(amount.as_ref(), CREDIT),
        [amount, indicator] => parse_amount(amount.as_ref(), indicator.as_ref()),
        _ => {
            let joined = words.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
            Err(StatementError::amount(joined, "too many words in amount"))
        }
    }
}

/// Build a transaction from a 9-column row.
///
/// Card number and owner are left empty; the context tracker stamps them.
pub fn parse_transaction(row: &[String], year_hint: NaiveDate) -> Result<Transaction, StatementError> {
    if row.len() != ROW_WIDTH {
        return Err(StatementError::Layout(format!(
            "transaction row has {} columns, expected {ROW_WIDTH}",
            row.len()
        )));
    }

    let foreign_amount = match row[5].trim() {
        "" => None,
        text => Some(parse_amount(text, CREDIT)?),
    };
    let foreign_currency = match row[6].trim() {
        "" => None,
        text => Some(text.to_string()),
    };

    Ok(Transaction {
        transaction_date: parse_date(&row[0], Some(year_hint))?,
        booking_date: parse_date(&row[1], Some(year_hint))?,
        description: row[2].trim().to_string(),
        location: row[3].trim().to_string(),
        country: row[4].trim().to_string(),
        amount: parse_amount(&row[7], &row[8])?,
        foreign_amount,
        foreign_currency,
        foreign_exchange_rate: None,
        card_last_numbers: String::new(),
        card_owner: String::new(),
    })
}
