//! Output types: the parsed statement and its transactions.

use crate::error::Warning;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single line on the statement.
///
/// Field order is the column order of delimited exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_date: NaiveDate,
    pub booking_date: NaiveDate,
    pub description: String,
    pub location: String,
    pub country: String,
    /// Signed amount in euros: negative for spending, positive for payments
    /// and refunds.
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_currency: Option<String>,
    /// Only set when an exchange-rate note follows the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub card_last_numbers: String,
    #[serde(default)]
    pub card_owner: String,
}

impl Transaction {
    /// Names of the transaction fields, in declared order.
    pub const FIELD_NAMES: [&'static str; 11] = [
        "transaction_date",
        "booking_date",
        "description",
        "location",
        "country",
        "amount",
        "foreign_amount",
        "foreign_currency",
        "foreign_exchange_rate",
        "card_last_numbers",
        "card_owner",
    ];
}

/// One statement: the transactions of one month plus the header totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub date: NaiveDate,
    pub customer_number: String,
    pub serial_number: u32,
    pub previous_balance: Decimal,
    pub total_received_payment: Decimal,
    pub total_new_expenses: Decimal,
    pub new_balance: Decimal,
    pub transactions: Vec<Transaction>,
}

impl Statement {
    /// `YYYY-MM` of the statement date.
    pub fn month(&self) -> String {
        format!("{:04}-{:02}", self.date.year(), self.date.month())
    }

    /// Sum of all negative (debit) amounts.
    pub fn sum_of_expenses(&self) -> Decimal {
        self.transactions
            .iter()
            .map(|t| t.amount)
            .filter(|a| a.is_sign_negative())
            .sum()
    }

    /// Sum of all positive (credit) amounts.
    pub fn sum_of_payments(&self) -> Decimal {
        self.transactions
            .iter()
            .map(|t| t.amount)
            .filter(|a| a.is_sign_positive() && !a.is_zero())
            .sum()
    }
}

/// Result of parsing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedStatement {
    pub statement: Statement,
    /// Non-fatal findings: header and layout first, then row annotations,
    /// then totals.
    pub warnings: Vec<Warning>,
}
