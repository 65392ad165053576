//! CLI binary for ics-statement.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ParseConfig` / `ExportConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use ics_statement::{
    convert_file, convert_folder_with_progress, ConversionReport, ExportConfig,
    FolderProgressCallback, FolderReport, NoopProgressCallback, OutputFormat, ParseConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the folder, one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the file currently being converted.
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Self {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            started: Mutex::new(None),
        }
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl FolderProgressCallback for CliProgressCallback {
    fn on_folder_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_start(&self, _index: usize, _total: usize, path: &Path) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(file_label(path));
    }

    fn on_file_skipped(&self, _index: usize, _total: usize, path: &Path) {
        self.bar
            .println(format!("  {} {}  {}", dim("·"), file_label(path), dim("already converted")));
        self.bar.inc(1);
    }

    fn on_file_complete(&self, _index: usize, _total: usize, report: &ConversionReport) {
        let mark = if report.warnings.is_empty() {
            green("✓")
        } else {
            yellow("⚠")
        };
        self.bar.println(format!(
            "  {} {}  {}  {}",
            mark,
            file_label(&report.source),
            dim(&format!("{:>3} transactions", report.transactions)),
            self.elapsed(),
        ));
        for warning in &report.warnings {
            self.bar.println(format!("      {}", yellow(&warning.to_string())));
        }
        self.bar.inc(1);
    }

    fn on_file_error(&self, _index: usize, _total: usize, path: &Path, error: &str) {
        // Keep the log tidy; the full message is in the tracing output.
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {}  {}  {}",
            red("✗"),
            file_label(path),
            red(first_line),
            self.elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_folder_complete(&self, _report: &FolderReport) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one statement to CSV next to the PDF
  ics2csv Rekeningoverzicht-2025-08.pdf

  # Convert every dated statement in a folder; already converted ones are skipped
  ics2csv ~/Documents/ICS

  # JSON with header totals, written to another directory
  ics2csv --format json --output-dir ./export Rekeningoverzicht-2025-08.pdf

FOLDER MODE:
  Only PDFs whose name carries a year and month are picked up, e.g.
  Rekeningoverzicht-2025-08.pdf or overzicht_2024-12.pdf.

ENVIRONMENT VARIABLES:
  ICS2CSV_FORMAT          Default output format (csv, tsv, json)
  ICS2CSV_OUTPUT_DIR      Default output directory
  ICS2CSV_PASSWORD        Password for encrypted statements
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Convert ICS credit card statements (PDF) to CSV, TSV or JSON.
#[derive(Parser, Debug)]
#[command(
    name = "ics2csv",
    version,
    about = "Convert ICS credit card statements (PDF) to CSV, TSV or JSON",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Statement PDF, or a folder of statements.
    path: PathBuf,

    /// Output format.
    #[arg(short, long, env = "ICS2CSV_FORMAT", value_enum, default_value = "csv")]
    format: FormatArg,

    /// Write output files to this directory instead of next to each PDF.
    #[arg(short, long, env = "ICS2CSV_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// PDF user password for encrypted statements.
    #[arg(long, env = "ICS2CSV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Disable progress bar in folder mode.
    #[arg(long, env = "ICS2CSV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ICS2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ICS2CSV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Csv,
    Tsv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Tsv => OutputFormat::Tsv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && cli.path.is_dir();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let (parse, export) = build_config(&cli)?;

    // ── Run conversion ───────────────────────────────────────────────────
    if cli.path.is_dir() {
        let report = if show_progress {
            convert_folder_with_progress(&cli.path, &parse, &export, &CliProgressCallback::new())
        } else {
            convert_folder_with_progress(&cli.path, &parse, &export, &NoopProgressCallback)
        }
        .with_context(|| format!("Failed to convert folder {}", cli.path.display()))?;

        if !cli.quiet {
            print_folder_summary(&report);
        }
    } else if cli.path.is_file() {
        let report = convert_file(&cli.path, &parse, &export)
            .with_context(|| format!("Failed to convert {}", cli.path.display()))?;

        if !cli.quiet {
            for warning in &report.warnings {
                eprintln!("{} {}", yellow("⚠"), warning);
            }
            eprintln!(
                "{}  {} transactions  →  {}",
                if report.warnings.is_empty() {
                    green("✔")
                } else {
                    yellow("⚠")
                },
                report.transactions,
                bold(&report.destination.display().to_string()),
            );
        }
    } else {
        anyhow::bail!(
            "{} is neither a statement file nor a folder",
            cli.path.display()
        );
    }

    Ok(())
}

/// Map CLI args to the library configs.
fn build_config(cli: &Cli) -> Result<(ParseConfig, ExportConfig)> {
    let mut parse = ParseConfig::builder();
    if let Some(ref password) = cli.password {
        parse = parse.password(password.clone());
    }
    let parse = parse.build().context("Invalid configuration")?;

    let mut export = ExportConfig::builder().format(cli.format.into());
    if let Some(ref dir) = cli.output_dir {
        export = export.dest_dir(dir);
    }
    let export = export.build().context("Invalid output directory")?;

    Ok((parse, export))
}

fn print_folder_summary(report: &FolderReport) {
    let failed = report.failed.len();
    let mark = if failed == 0 { green("✔") } else { red("✘") };
    eprintln!(
        "{} {} converted, {} skipped, {} failed",
        mark,
        bold(&report.converted.len().to_string()),
        report.skipped.len(),
        if failed == 0 {
            failed.to_string()
        } else {
            red(&failed.to_string())
        },
    );
    for (path, error) in &report.failed {
        eprintln!("  {} {}: {}", red("✗"), path.display(), error);
    }
}
