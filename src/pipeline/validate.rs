//! Consistency checks on a parsed statement.
//!
//! None of these checks fail the conversion: a statement whose totals don't
//! add up is still exported, with a warning explaining what is off.
//!
//! Expenses and the new balance must match within rounding, in either
//! direction. Payments are checked one way only: a statement may declare a
//! payment that was booked without a transaction row, but never payment rows
//! beyond its total.

use crate::error::Warning;
use crate::output::Statement;
use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::warn;

static RE_FILENAME_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})[-_](\d{2})\b").expect("file name pattern is valid"));

/// Differences up to this amount are rounding, not mismatches.
fn tolerance() -> Decimal {
    Decimal::new(1, 3)
}

/// True when `found` exceeds `declared` by more than rounding.
fn exceeds(found: Decimal, declared: Decimal) -> bool {
    found - declared > tolerance()
}

/// True when `a` and `b` differ by more than rounding.
fn differs(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() > tolerance()
}

/// Check declared totals against the transactions and, when given, the
/// statement date against the year-month in `file_name`.
pub fn validate(statement: &Statement, file_name: Option<&str>) -> Vec<Warning> {
    let mut warnings = check_totals(statement);
    warnings.extend(file_name.and_then(|file| check_file_name(statement, file)));
    warnings
}

/// Compare the header totals with the transactions. Every warning is logged
/// as it is found.
pub fn check_totals(statement: &Statement) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let expenses = statement.sum_of_expenses();
    if differs(expenses, statement.total_new_expenses) {
        warnings.push(Warning::ExpensesMismatch {
            declared: statement.total_new_expenses,
            computed: expenses,
        });
    }

    let payments = statement.sum_of_payments();
    if exceeds(payments, statement.total_received_payment) {
        warnings.push(Warning::PaymentsMismatch {
            declared: statement.total_received_payment,
            computed: payments,
        });
    }

    let expected = statement.previous_balance
        + statement.total_received_payment
        + statement.total_new_expenses;
    if differs(expected, statement.new_balance) {
        warnings.push(Warning::BalanceMismatch {
            expected,
            found: statement.new_balance,
        });
    }

    for w in &warnings {
        warn!("{}", w);
    }
    warnings
}

/// Compare the statement date with a `YYYY-MM` stamp in `file_name`. Names
/// without a stamp are not checked.
pub fn check_file_name(statement: &Statement, file_name: &str) -> Option<Warning> {
    let caps = RE_FILENAME_MONTH.captures(file_name)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    if statement.date.year() == year && statement.date.month() == month {
        return None;
    }

    let w = Warning::FilenameDateMismatch {
        file: file_name.to_string(),
        statement_date: statement.date,
        year,
        month,
    };
    warn!("{}", w);
    Some(w)
}
