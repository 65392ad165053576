//! End-to-end integration tests for ics-statement.
//!
//! Most tests build statement pages in memory (characters with positions and
//! fonts, laid out like a real ICS statement) and run the full parse on
//! them, so they need neither pdfium nor sample files.
//!
//! `test_convert_real_statements` runs on real PDFs in `./statements/` and
//! is gated behind the `E2E_ENABLED` environment variable. Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture
//!
//! Library logs are routed to the test output; set `RUST_LOG=debug` to see
//! line grouping and column boundaries per page.

use chrono::NaiveDate;
use ics_statement::pipeline::tokens::chars_from_text;
use ics_statement::{
    convert_folder, parse_statement, render, validate, ExportConfig, ExtractedDocument,
    OutputFormat, PageChars, ParseConfig, StatementError, Token, Warning,
};
use rust_decimal_macros::dec;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

const REGULAR: &str = "ABCDEF+Arial";
const BOLD: &str = "ABCDEF+Arial-Bold";
const ADVANCE: f32 = 4.0;

/// Hand-built statement page.
#[derive(Default)]
struct PageBuilder {
    chars: Vec<Token>,
}

impl PageBuilder {
    fn text(mut self, text: &str, x0: f32, top: f32) -> Self {
        self.chars
            .extend(chars_from_text(text, x0, top, ADVANCE, REGULAR));
        self
    }

    fn bold(mut self, text: &str, x0: f32, top: f32) -> Self {
        self.chars.extend(chars_from_text(text, x0, top, ADVANCE, BOLD));
        self
    }

    /// The label/value block of page 1.
    fn metadata(self, previous: &str, received: &str, expenses: &str, new: &str) -> Self {
        let (amount_p, ind_p) = split_amount(previous);
        let (amount_r, ind_r) = split_amount(received);
        let (amount_e, ind_e) = split_amount(expenses);
        let (amount_n, ind_n) = split_amount(new);
        self.text("Datum", 60.0, 115.0)
            .text("ICS-klantnummer", 150.0, 115.0)
            .text("Volgnummer", 260.0, 115.0)
            .text("Blad", 400.0, 115.0)
            .text("01 aug 2025", 60.0, 124.0)
            .text("12345678", 150.0, 124.0)
            .text("3", 262.0, 124.0)
            .text("1", 400.0, 124.0)
            .text("van 1", 412.0, 124.0)
            .text("Vorig tegoed", 60.0, 138.0)
            .text("Totaal ontvangen betalingen", 130.0, 138.0)
            .text("Totaal nieuwe uitgaven", 260.0, 138.0)
            .text("Nieuw tegoed", 400.0, 138.0)
            .text(amount_p, 60.0, 147.0)
            .text(ind_p, 100.0, 147.0)
            .text(amount_r, 130.0, 147.0)
            .text(ind_r, 170.0, 147.0)
            .text(amount_e, 260.0, 147.0)
            .text(ind_e, 300.0, 147.0)
            .text(amount_n, 400.0, 147.0)
            .text(ind_n, 440.0, 147.0)
    }

    /// The table header, restated on every page, shifted right by `dx`.
    fn table_header(self, dx: f32) -> Self {
        self.text("Datum", 61.0 + dx, 190.0)
            .text("transactie", 61.0 + dx, 199.0)
            .text("Datum", 105.0 + dx, 190.0)
            .text("boeking", 105.0 + dx, 199.0)
            .text("Omschrijving", 154.0 + dx, 190.0)
            .text("Bedrag in", 402.0 + dx, 190.0)
            .text("vreemde valuta", 402.0 + dx, 199.0)
            .text("Bedrag in", 479.0 + dx, 190.0)
            .text("euro's", 479.0 + dx, 199.0)
    }

    /// One table row; empty cells are left out.
    fn row(mut self, top: f32, cells: [&str; 9]) -> Self {
        const STARTS: [f32; 9] = [61.0, 104.0, 151.0, 277.0, 364.0, 400.0, 446.0, 480.0, 536.0];
        for (cell, x0) in cells.iter().zip(STARTS) {
            if !cell.is_empty() {
                self = self.text(cell, x0, top);
            }
        }
        self
    }

    fn build(self) -> PageChars {
        PageChars {
            width: 595.0,
            height: 842.0,
            chars: self.chars,
        }
    }
}

fn split_amount(amount: &str) -> (&str, &str) {
    amount.rsplit_once(' ').unwrap_or((amount, ""))
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn first_page(previous: &str, received: &str, expenses: &str, new: &str) -> PageBuilder {
    PageBuilder::default()
        .metadata(previous, received, expenses, new)
        .table_header(0.0)
}

fn shop_row() -> [&'static str; 9] {
    ["01 aug", "02 aug", "Shop", "Amsterdam", "NL", "", "", "30,00", "Af"]
}

/// Route library logs to the test harness. Safe to call from every test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn parse(pages: Vec<PageChars>) -> Result<ics_statement::ParsedStatement, StatementError> {
    init_tracing();
    parse_statement(&ExtractedDocument::new(pages), &ParseConfig::default())
}

// ── Single page ──────────────────────────────────────────────────────────────

#[test]
fn test_single_row_statement_reconciles() {
    let page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij")
        .row(230.0, shop_row())
        .build();

    let parsed = parse(vec![page]).unwrap();
    let s = &parsed.statement;
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    assert!(validate(s, Some("Rekeningoverzicht-2025-08.pdf")).is_empty());

    assert_eq!(s.date, ymd(2025, 8, 1));
    assert_eq!(s.customer_number, "12345678");
    assert_eq!(s.serial_number, 3);
    assert_eq!(s.previous_balance, dec!(100.00));
    assert_eq!(s.total_received_payment, dec!(50.00));
    assert_eq!(s.total_new_expenses, dec!(-30.00));
    assert_eq!(s.new_balance, dec!(120.00));

    assert_eq!(s.transactions.len(), 1);
    let t = &s.transactions[0];
    assert_eq!(t.transaction_date, ymd(2025, 8, 1));
    assert_eq!(t.booking_date, ymd(2025, 8, 2));
    assert_eq!(t.description, "Shop");
    assert_eq!(t.location, "Amsterdam");
    assert_eq!(t.country, "NL");
    assert_eq!(t.amount, dec!(-30.00));
    assert_eq!(t.foreign_amount, None);
    assert_eq!(t.card_last_numbers, "");
}

#[test]
fn test_csv_export_of_parsed_statement() {
    let page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij")
        .row(230.0, shop_row())
        .build();
    let parsed = parse(vec![page]).unwrap();

    let csv = String::from_utf8(render(&parsed.statement, OutputFormat::Csv).unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("month,transaction_date,booking_date,description"));
    assert_eq!(
        lines[1],
        "2025-08,2025-08-01,2025-08-02,Shop,Amsterdam,NL,-30.00,,,,,"
    );
}

#[test]
fn test_card_owner_and_exchange_rate_over_two_pages() {
    let page1 = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 80,12 Af", "€ 69,88 Bij")
        .bold("Uw Card met als laatste vier cijfers 1234", 61.0, 230.0)
        .bold("J. JANSEN", 61.0, 240.0)
        .row(250.0, shop_row())
        .build();
    // Row at 600 only fits the taller body region of later pages.
    let page2 = PageBuilder::default()
        .table_header(0.0)
        .row(
            590.0,
            ["28 jul", "29 jul", "Diner", "New York", "US", "54,10", "USD", "50,12", "Af"],
        )
        .row(600.0, ["", "", "Wisselkoers USD", "1,07942", "", "", "", "", ""])
        .build();

    let parsed = parse(vec![page1, page2]).unwrap();
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);

    let txs = &parsed.statement.transactions;
    assert_eq!(txs.len(), 2);
    for t in txs {
        assert_eq!(t.card_last_numbers, "1234");
        assert_eq!(t.card_owner, "J. JANSEN");
    }
    assert_eq!(txs[1].transaction_date, ymd(2025, 7, 28));
    assert_eq!(txs[1].foreign_amount, Some(dec!(54.10)));
    assert_eq!(txs[1].foreign_currency.as_deref(), Some("USD"));
    assert_eq!(txs[1].foreign_exchange_rate, Some(dec!(1.07942)));
    assert_eq!(txs[1].amount, dec!(-50.12));
    assert_eq!(txs[0].foreign_exchange_rate, None);
}

#[test]
fn test_january_statement_keeps_december_rows_in_previous_year() {
    let mut page = first_page("€ 0,00 Bij", "€ 0,00 Bij", "€ 30,00 Af", "€ 30,00 Af");
    // Replace the statement date: January 2026.
    page.chars.retain(|c| !(c.top == 124.0 && c.x0 < 110.0));
    let page = page
        .text("05 jan 2026", 60.0, 124.0)
        .row(
            230.0,
            ["28 dec", "02 jan", "Shop", "Amsterdam", "NL", "", "", "30,00", "Af"],
        )
        .build();

    let parsed = parse(vec![page]).unwrap();
    let t = &parsed.statement.transactions[0];
    assert_eq!(parsed.statement.date, ymd(2026, 1, 5));
    assert_eq!(t.transaction_date, ymd(2025, 12, 28));
    assert_eq!(t.booking_date, ymd(2026, 1, 2));
}

// ── Warnings ─────────────────────────────────────────────────────────────────

#[test]
fn test_header_drift_is_a_warning() {
    let mut page = PageBuilder::default()
        .metadata("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij")
        .table_header(2.0);
    for (text, x0) in [("01 aug", 63.0), ("02 aug", 106.0), ("Shop", 153.0), ("30,00", 482.0), ("Af", 538.0)] {
        page = page.text(text, x0, 230.0);
    }

    let parsed = parse(vec![page.build()]).unwrap();
    assert_eq!(parsed.statement.transactions.len(), 1);
    assert_eq!(parsed.statement.transactions[0].description, "Shop");
    assert!(matches!(
        parsed.warnings.as_slice(),
        [Warning::BoundaryDrift { page: 1, .. }]
    ));
}

#[test]
fn test_unknown_bold_line_is_a_warning() {
    let page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij")
        .row(230.0, shop_row())
        .bold("Let op: nieuwe voorwaarden", 61.0, 250.0)
        .build();

    let parsed = parse(vec![page]).unwrap();
    assert_eq!(
        parsed.warnings,
        vec![Warning::UnrecognizedAnnotation {
            text: "Let op: nieuwe voorwaarden".into()
        }]
    );
}

#[test]
fn test_totals_mismatch_is_a_warning() {
    let page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 40,00 Af", "€ 110,00 Bij")
        .row(230.0, shop_row())
        .build();

    let parsed = parse(vec![page]).unwrap();
    assert!(matches!(
        parsed.warnings.as_slice(),
        [Warning::ExpensesMismatch { .. }]
    ));
}

#[test]
fn test_expense_rows_beyond_declared_total_are_a_warning() {
    let page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij")
        .row(230.0, shop_row())
        .row(
            240.0,
            ["03 aug", "04 aug", "Garage", "Utrecht", "NL", "", "", "500,00", "Af"],
        )
        .build();

    let parsed = parse(vec![page]).unwrap();
    assert_eq!(
        parsed.warnings,
        vec![Warning::ExpensesMismatch {
            declared: dec!(-30.00),
            computed: dec!(-530.00)
        }]
    );
}

#[test]
fn test_new_balance_off_in_either_direction_is_a_warning() {
    for declared in ["€ 500,00 Bij", "€ 20,00 Bij"] {
        let page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", declared)
            .row(230.0, shop_row())
            .build();

        let parsed = parse(vec![page]).unwrap();
        assert!(
            matches!(
                parsed.warnings.as_slice(),
                [Warning::BalanceMismatch { expected, .. }] if *expected == dec!(120.00)
            ),
            "{declared}: {:?}",
            parsed.warnings
        );
    }
}

// ── Fatal errors ─────────────────────────────────────────────────────────────

#[test]
fn test_exchange_rate_without_transaction_is_fatal() {
    let page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij")
        .row(230.0, ["", "", "Wisselkoers USD", "1,07942", "", "", "", "", ""])
        .build();

    assert!(matches!(
        parse(vec![page]),
        Err(StatementError::OrphanAnnotation { .. })
    ));
}

#[test]
fn test_empty_page_body_is_fatal() {
    let page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij").build();
    let err = parse(vec![page]).unwrap_err();
    assert!(err.to_string().contains("No text found on page 1"), "{err}");
}

#[test]
fn test_unexpected_table_header_is_fatal() {
    let page = PageBuilder::default()
        .metadata("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij")
        .text("Datum", 61.0, 190.0)
        .text("Omschrijving", 154.0, 190.0)
        .row(230.0, shop_row())
        .build();

    assert!(matches!(parse(vec![page]), Err(StatementError::Layout(_))));
}

#[test]
fn test_missing_header_field_is_fatal() {
    let mut page = first_page("€ 100,00 Bij", "€ 50,00 Bij", "€ 30,00 Af", "€ 120,00 Bij")
        .row(230.0, shop_row());
    page.chars.retain(|c| !(c.top == 115.0 && c.x0 >= 260.0 && c.x0 < 400.0));
    page.chars.retain(|c| !(c.top == 124.0 && c.x0 >= 260.0 && c.x0 < 400.0));

    let err = parse(vec![page.build()]).unwrap_err();
    assert!(matches!(err, StatementError::MissingField { ref field } if field == "volgnummer"));
}

// ── Folder mode ──────────────────────────────────────────────────────────────

#[test]
fn test_folder_isolates_broken_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Rekeningoverzicht-2025-07.pdf"), b"<html>").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let out = tempfile::tempdir().unwrap();
    let export = ExportConfig::builder()
        .format(OutputFormat::Json)
        .dest_dir(out.path())
        .build()
        .unwrap();
    let report = convert_folder(dir.path(), &ParseConfig::default(), &export).unwrap();

    assert!(report.converted.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
}

// ── Real statements (opt-in) ─────────────────────────────────────────────────

#[test]
fn test_convert_real_statements() {
    init_tracing();
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("statements");
    if !dir.is_dir() {
        println!("SKIP: no statements folder at {}", dir.display());
        return;
    }

    let out = tempfile::tempdir().unwrap();
    let export = ExportConfig::builder().dest_dir(out.path()).build().unwrap();
    let report = convert_folder(&dir, &ParseConfig::default(), &export).unwrap();
    for converted in &report.converted {
        println!(
            "{}: {} transactions, {} warnings",
            converted.source.display(),
            converted.transactions,
            converted.warnings.len()
        );
    }
    assert!(report.failed.is_empty(), "{:?}", report.failed);
}
