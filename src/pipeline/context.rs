//! Context tracking across body rows.
//!
//! Between ordinary transaction rows the statement prints short annotations:
//! a bold "Uw Card met als laatste vier cijfers 1234" banner (optionally
//! followed by the card holder's name), and an indented "Wisselkoers" note
//! giving the exchange rate of the foreign transaction right above it.
//! [`ContextTracker`] is the state machine that attaches those annotations to
//! the transactions they belong to.

use crate::error::{StatementError, Warning};
use crate::output::Transaction;
use crate::pipeline::columns::BodyRow;
use crate::pipeline::record::{parse_amount, parse_transaction, CREDIT};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Marker opening an exchange-rate note.
pub const EXCHANGE_RATE_MARKER: &str = "Wisselkoers";

static RE_CARD_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*Uw Card met als laatste vier cijfers (\d+)")
        .expect("card number pattern is valid")
});

/// The card the following transactions were made with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardContext {
    pub last_numbers: String,
    pub owner: String,
}

/// Where the tracker is between rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Nothing pending.
    Idle,
    /// A card banner was just read; the next free-text line may name the owner.
    AwaitingOwner,
    /// The transaction at `index` was just emitted and may still receive an
    /// exchange rate or continuation text.
    AwaitingRate { index: usize },
}

/// Threads card and exchange-rate context through a statement's rows.
#[derive(Debug)]
pub struct ContextTracker {
    year_hint: NaiveDate,
    state: TrackerState,
    card: CardContext,
    transactions: Vec<Transaction>,
    warnings: Vec<Warning>,
}

impl ContextTracker {
    /// `year_hint` (the statement date) completes the year-less row dates.
    pub fn new(year_hint: NaiveDate) -> Self {
        Self {
            year_hint,
            state: TrackerState::Idle,
            card: CardContext::default(),
            transactions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn card(&self) -> &CardContext {
        &self.card
    }

    /// Consume one row.
    pub fn step(&mut self, row: BodyRow) -> Result<(), StatementError> {
        self.state = match row {
            BodyRow::FreeText(text) => self.on_free_text(text),
            BodyRow::Columns(columns) => self.on_columns(columns)?,
        };
        Ok(())
    }

    /// Finish the statement, returning the transactions and the warnings
    /// found along the way.
    pub fn finish(self) -> (Vec<Transaction>, Vec<Warning>) {
        (self.transactions, self.warnings)
    }

    fn on_free_text(&mut self, text: String) -> TrackerState {
        if let Some(caps) = RE_CARD_NUMBER.captures(&text) {
            self.card = CardContext {
                last_numbers: caps[1].to_string(),
                owner: String::new(),
            };
            debug!("Card ending in {}", self.card.last_numbers);
            return TrackerState::AwaitingOwner;
        }

        if self.state == TrackerState::AwaitingOwner {
            self.card.owner = text.trim().to_string();
            debug!("Card owner {:?}", self.card.owner);
        } else {
            let w = Warning::UnrecognizedAnnotation { text };
            warn!("{}", w);
            self.warnings.push(w);
        }
        TrackerState::Idle
    }

    fn on_columns(&mut self, columns: Vec<String>) -> Result<TrackerState, StatementError> {
        let dated = columns.len() >= 2
            && !(columns[0].trim().is_empty() && columns[1].trim().is_empty());
        if dated {
            let mut transaction = parse_transaction(&columns, self.year_hint)?;
            transaction.card_last_numbers = self.card.last_numbers.clone();
            transaction.card_owner = self.card.owner.clone();
            self.transactions.push(transaction);
            return Ok(TrackerState::AwaitingRate {
                index: self.transactions.len() - 1,
            });
        }

        let text = columns.join(" ").trim().to_string();
        match (annotation_rate(&columns), self.state) {
            (Some(rate_text), TrackerState::AwaitingRate { index }) => {
                let rate = parse_amount(&rate_text, CREDIT)?;
                self.transactions[index].foreign_exchange_rate = Some(rate);
                Ok(TrackerState::Idle)
            }
            (Some(_), _) => Err(StatementError::OrphanAnnotation { text }),
            (None, TrackerState::AwaitingRate { index }) => {
                let transaction = &mut self.transactions[index];
                append_fragment(&mut transaction.description, columns.get(2));
                append_fragment(&mut transaction.location, columns.get(3));
                Ok(TrackerState::AwaitingRate { index })
            }
            (None, _) => Err(StatementError::Layout(format!(
                "Found {text:?} without prior transaction line"
            ))),
        }
    }
}

/// For an undated row, the exchange rate text if the row is a
/// "Wisselkoers" note.
///
/// The marker is the first non-empty cell after the date columns; the rate
/// is the next non-empty cell after it.
fn annotation_rate(columns: &[String]) -> Option<String> {
    let mut cells = columns
        .iter()
        .skip(2)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty());
    let marker = cells.next()?;
    if !marker.starts_with(EXCHANGE_RATE_MARKER) {
        return None;
    }
    Some(cells.next().unwrap_or_default().to_string())
}

fn append_fragment(field: &mut String, fragment: Option<&String>) {
    let Some(fragment) = fragment.map(|f| f.trim()).filter(|f| !f.is_empty()) else {
        return;
    };
    if !field.is_empty() {
        field.push(' ');
    }
    field.push_str(fragment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn hint() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    fn cols(cells: [&str; 9]) -> BodyRow {
        BodyRow::Columns(cells.iter().map(|c| c.to_string()).collect())
    }

    fn purchase() -> BodyRow {
        cols(["01 aug", "02 aug", "Shop", "Amsterdam", "NL", "", "", "30,00", "Af"])
    }

    fn foreign_purchase() -> BodyRow {
        cols(["28 jul", "29 jul", "Diner", "New York", "US", "54,10", "USD", "50,12", "Af"])
    }

    fn rate_note() -> BodyRow {
        cols(["", "", "Wisselkoers USD", "1,07942", "", "", "", "", ""])
    }

    fn text(s: &str) -> BodyRow {
        BodyRow::FreeText(s.to_string())
    }

    #[test]
    fn card_banner_and_owner_stamp_following_rows() {
        let mut t = ContextTracker::new(hint());
        t.step(text("Uw Card met als laatste vier cijfers 1234")).unwrap();
        assert_eq!(t.state(), TrackerState::AwaitingOwner);
        t.step(text("J. JANSEN ")).unwrap();
        t.step(purchase()).unwrap();
        t.step(purchase()).unwrap();
        t.step(text("Uw Card met als laatste vier cijfers 9876")).unwrap();
        t.step(purchase()).unwrap();

        let (txs, warnings) = t.finish();
        assert!(warnings.is_empty());
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].card_last_numbers, "1234");
        assert_eq!(txs[0].card_owner, "J. JANSEN");
        assert_eq!(txs[1].card_owner, "J. JANSEN");
        assert_eq!(txs[2].card_last_numbers, "9876");
        assert_eq!(txs[2].card_owner, "");
    }

    #[test]
    fn second_banner_is_not_taken_as_owner() {
        let mut t = ContextTracker::new(hint());
        t.step(text("Uw Card met als laatste vier cijfers 1234")).unwrap();
        t.step(text("UW CARD MET ALS LAATSTE VIER CIJFERS 5555")).unwrap();
        assert_eq!(t.card().last_numbers, "5555");
        assert_eq!(t.card().owner, "");
    }

    #[test]
    fn exchange_rate_applies_to_previous_transaction() {
        let mut t = ContextTracker::new(hint());
        t.step(foreign_purchase()).unwrap();
        assert_eq!(t.state(), TrackerState::AwaitingRate { index: 0 });
        t.step(rate_note()).unwrap();
        assert_eq!(t.state(), TrackerState::Idle);
        let (txs, _) = t.finish();
        assert_eq!(txs[0].foreign_exchange_rate, Some(dec!(1.07942)));
    }

    #[test]
    fn orphan_exchange_rate_is_fatal() {
        let mut t = ContextTracker::new(hint());
        let err = t.step(rate_note()).unwrap_err();
        assert!(matches!(err, StatementError::OrphanAnnotation { .. }));
    }

    #[test]
    fn second_exchange_rate_is_orphaned() {
        let mut t = ContextTracker::new(hint());
        t.step(foreign_purchase()).unwrap();
        t.step(rate_note()).unwrap();
        assert!(t.step(rate_note()).is_err());
    }

    #[test]
    fn free_text_clears_pending_rate() {
        let mut t = ContextTracker::new(hint());
        t.step(foreign_purchase()).unwrap();
        t.step(text("Some bold notice")).unwrap();
        assert!(matches!(
            t.step(rate_note()),
            Err(StatementError::OrphanAnnotation { .. })
        ));
    }

    #[test]
    fn unknown_free_text_is_a_warning() {
        let mut t = ContextTracker::new(hint());
        t.step(text("Let op: nieuwe voorwaarden")).unwrap();
        let (txs, warnings) = t.finish();
        assert!(txs.is_empty());
        assert_eq!(
            warnings,
            vec![Warning::UnrecognizedAnnotation {
                text: "Let op: nieuwe voorwaarden".into()
            }]
        );
    }

    #[test]
    fn continuation_row_extends_description() {
        let mut t = ContextTracker::new(hint());
        t.step(purchase()).unwrap();
        t.step(cols(["", "", "Centraal", "Noord", "", "", "", "", ""])).unwrap();
        t.step(rate_note()).unwrap();
        let (txs, _) = t.finish();
        assert_eq!(txs[0].description, "Shop Centraal");
        assert_eq!(txs[0].location, "Amsterdam Noord");
        assert_eq!(txs[0].foreign_exchange_rate, Some(dec!(1.07942)));
    }

    #[test]
    fn continuation_without_transaction_is_fatal() {
        let mut t = ContextTracker::new(hint());
        let err = t
            .step(cols(["", "", "Centraal", "", "", "", "", "", ""]))
            .unwrap_err();
        assert!(matches!(err, StatementError::Layout(_)));
    }

    #[test]
    fn malformed_row_propagates() {
        let mut t = ContextTracker::new(hint());
        let err = t
            .step(cols(["01 aug", "02 aug", "Shop", "", "", "", "", "30,00", "Afx"]))
            .unwrap_err();
        assert!(matches!(err, StatementError::AmountParse { .. }));
    }
}
