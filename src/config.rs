//! Configuration types for statement parsing and export.
//!
//! Parsing is controlled through [`ParseConfig`], writing through
//! [`ExportConfig`]. Both are plain values passed explicitly to every entry
//! point; there is no global configuration.
//!
//! # Design choice: builder over constructor
//! Most callers only ever change the output format or the destination
//! directory. The builders let them set only that and keep the documented
//! defaults for the layout tolerances.

use crate::error::StatementError;
use crate::pipeline::layout::LayoutSchema;
use crate::pipeline::lines::DEFAULT_LINE_TOLERANCE;
use crate::pipeline::record::ROW_WIDTH;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for turning a statement PDF into a [`crate::ParsedStatement`].
///
/// Built via [`ParseConfig::builder()`] or using [`ParseConfig::default()`].
///
/// # Example
/// ```rust
/// use ics_statement::ParseConfig;
///
/// let config = ParseConfig::builder()
///     .password("geheim")
///     .build()
///     .unwrap();
/// assert_eq!(config.line_tolerance, 3.0);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Vertical distance (points) below which tokens share a line. Default: 3.
    pub line_tolerance: f32,

    /// How far (points) a header value may start left of its label. Default: 2.
    pub header_x_tolerance: f32,

    /// Horizontal gap (points) that splits two words. Default: 3.
    pub word_x_tolerance: f32,

    /// Expected table layout. Default: [`LayoutSchema::ics_2016`].
    pub layout: LayoutSchema,

    /// PDF user password for encrypted statements.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            header_x_tolerance: 2.0,
            word_x_tolerance: 3.0,
            layout: LayoutSchema::default(),
            password: None,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("line_tolerance", &self.line_tolerance)
            .field("header_x_tolerance", &self.header_x_tolerance)
            .field("word_x_tolerance", &self.word_x_tolerance)
            .field("layout", &self.layout.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ParseConfig {
    /// Create a new builder for `ParseConfig`.
    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ParseConfig`].
#[derive(Debug)]
pub struct ParseConfigBuilder {
    config: ParseConfig,
}

impl ParseConfigBuilder {
    pub fn line_tolerance(mut self, points: f32) -> Self {
        self.config.line_tolerance = points;
        self
    }

    pub fn header_x_tolerance(mut self, points: f32) -> Self {
        self.config.header_x_tolerance = points;
        self
    }

    pub fn word_x_tolerance(mut self, points: f32) -> Self {
        self.config.word_x_tolerance = points;
        self
    }

    pub fn layout(mut self, layout: LayoutSchema) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ParseConfig, StatementError> {
        let c = &self.config;
        for (name, value) in [
            ("line_tolerance", c.line_tolerance),
            ("header_x_tolerance", c.header_x_tolerance),
            ("word_x_tolerance", c.word_x_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(StatementError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if c.line_tolerance == 0.0 {
            return Err(StatementError::InvalidConfig(
                "line_tolerance must be > 0".into(),
            ));
        }
        if c.layout.column_count() != ROW_WIDTH {
            return Err(StatementError::InvalidConfig(format!(
                "layout '{}' defines {} columns, transactions need {ROW_WIDTH}",
                c.layout.name,
                c.layout.column_count()
            )));
        }
        if c.layout.reference_boundaries.len() != ROW_WIDTH {
            return Err(StatementError::InvalidConfig(format!(
                "layout '{}' has {} reference boundaries, expected {ROW_WIDTH}",
                c.layout.name,
                c.layout.reference_boundaries.len()
            )));
        }
        Ok(self.config)
    }
}

/// Configuration for writing converted statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output format. Default: CSV.
    pub format: OutputFormat,

    /// Directory for output files. Default: next to each source file.
    pub dest_dir: Option<PathBuf>,
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn dest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dest_dir = Some(dir.into());
        self
    }

    /// Build the configuration. A destination must be an existing directory.
    pub fn build(self) -> Result<ExportConfig, StatementError> {
        if let Some(dir) = &self.config.dest_dir {
            if !dir.is_dir() {
                return Err(StatementError::InvalidConfig(format!(
                    "{} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// File format of exported statements.
///
/// | Format | Content |
/// |--------|---------|
/// | Csv | one row per transaction, comma separated (default) |
/// | Tsv | same columns, tab separated |
/// | Json | the whole statement including header totals |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    /// Lower-case file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }

    /// Field delimiter for delimited formats.
    pub fn delimiter(self) -> Option<u8> {
        match self {
            OutputFormat::Csv => Some(b','),
            OutputFormat::Tsv => Some(b'\t'),
            OutputFormat::Json => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
