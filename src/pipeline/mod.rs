//! Pipeline stages for statement-to-records conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap the text backend (pdfium, or hand-built pages in tests) without
//! touching the layout rules.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ lines ──▶ header / layout ──▶ columns ──▶ context ──▶ validate
//! (path)    (pdfium)    (rows)    (labels, bounds)    (cells)     (records)   (totals)
//! ```
//!
//! 1. [`input`]: validate a statement file, list a folder, name outputs
//! 2. [`extract`]: read every character of the PDF into a [`tokens::ExtractedDocument`]
//! 3. [`tokens`]: the token model and the region/word queries over it
//! 4. [`lines`]: group tokens into visual lines
//! 5. [`header`]: correlate metadata labels and values on page 1
//! 6. [`layout`]: resolve column boundaries from the table header
//! 7. [`columns`]: classify body lines and split rows into cells
//! 8. [`context`]: attach card and exchange-rate annotations to records,
//!    parsing rows through [`record`]
//! 9. [`validate`]: compare declared totals with the parsed records

pub mod columns;
pub mod context;
pub mod extract;
pub mod header;
pub mod input;
pub mod layout;
pub mod lines;
pub mod record;
pub mod tokens;
pub mod validate;
