//! Text-layer extraction: read every character of a PDF via pdfium.
//!
//! ## Why extract everything up front?
//!
//! A statement is a handful of pages and the parser asks for several regions
//! of each page. Reading the whole text layer once into an
//! [`ExtractedDocument`] lets the pdfium document (and the library binding)
//! be dropped right away, and every later region query is plain filtering
//! over owned [`Token`]s.
//!
//! ## Coordinates
//!
//! pdfium reports boxes with the origin at the bottom-left of the page. The
//! layout regions use the top-left origin (as pdfplumber does), so `top` is
//! `page_height - rect.top` and `bottom` is `page_height - rect.bottom`.

use crate::error::StatementError;
use crate::pipeline::input::validate_pdf;
use crate::pipeline::tokens::{
    ExtractedDocument, Granularity, PageChars, Region, TextDirection, Token, TokenSource,
};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the pdfium library (file or directory).
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// A PDF statement whose text layer has been read with pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumSource {
    document: ExtractedDocument,
}

impl PdfiumSource {
    /// Validate, load and extract the PDF at `path`.
    pub fn open(path: &Path, password: Option<&str>) -> Result<Self, StatementError> {
        validate_pdf(path)?;
        let pdfium = bind_pdfium()?;
        let document = extract_document(&pdfium, path, password)?;
        Ok(Self { document })
    }

    /// Horizontal gap above which characters form separate words.
    pub fn with_x_tolerance(mut self, x_tolerance: f32) -> Self {
        self.document = self.document.with_x_tolerance(x_tolerance);
        self
    }
}

impl TokenSource for PdfiumSource {
    fn page_count(&self) -> usize {
        self.document.page_count()
    }

    fn tokens(
        &self,
        page: usize,
        region: &Region,
        granularity: Granularity,
    ) -> Result<Vec<Token>, StatementError> {
        self.document.tokens(page, region, granularity)
    }
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the current directory,
/// then the system library.
fn bind_pdfium() -> Result<Pdfium, StatementError> {
    if let Ok(configured) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        let configured = PathBuf::from(configured);
        let library = if configured.is_dir() {
            PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&configured))
        } else {
            configured
        };
        debug!("Binding pdfium from {}", library.display());
        return Pdfium::bind_to_library(&library)
            .map(Pdfium::new)
            .map_err(|e| {
                StatementError::PdfiumBindingFailed(format!("{}: {:?}", library.display(), e))
            });
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| StatementError::PdfiumBindingFailed(format!("{:?}", e)))
}

fn extract_document(
    pdfium: &Pdfium,
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedDocument, StatementError> {
    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                StatementError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                StatementError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            StatementError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut extracted = Vec::with_capacity(pages.len() as usize);
    for (index, page) in pages.iter().enumerate() {
        let height = page.height().value;
        let text = page
            .text()
            .map_err(|e| StatementError::TextExtractionFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let mut chars = Vec::new();
        for ch in text.chars().iter() {
            let Some(content) = ch.unicode_string() else {
                continue;
            };
            if content.chars().all(char::is_control) {
                continue;
            }
            let bounds = match ch.loose_bounds() {
                Ok(bounds) => bounds,
                Err(e) => {
                    debug!("Page {}: skipping {:?} without bounds: {:?}", index + 1, content, e);
                    continue;
                }
            };

            chars.push(Token {
                text: content,
                x0: bounds.left().value,
                x1: bounds.right().value,
                top: height - bounds.top().value,
                bottom: height - bounds.bottom().value,
                font_name: ch.font_name(),
                direction: TextDirection::LeftToRight,
                upright: is_upright(ch.get_rotation_clockwise_degrees()),
            });
        }

        debug!("Page {}: {} characters", index + 1, chars.len());
        extracted.push(PageChars {
            width: page.width().value,
            height,
            chars,
        });
    }

    Ok(ExtractedDocument::new(extracted))
}

/// Upright means rotated by a whole number of turns.
fn is_upright(degrees: f32) -> bool {
    let rest = degrees.rem_euclid(360.0);
    rest < 0.5 || rest > 359.5
}
