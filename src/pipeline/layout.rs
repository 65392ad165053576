//! Table layout: the versioned layout schema and column-boundary resolution.
//!
//! The transaction table has five printed headers but nine logical columns:
//! "Omschrijving" covers description, location and country, and both amount
//! headers cover an amount plus a currency or indicator. A [`LayoutSchema`]
//! records, per header, where its sub-columns start relative to the header
//! text. Boundaries are recomputed on every page from the header positions,
//! so small shifts between statement years are absorbed.

use crate::error::{StatementError, Warning};
use crate::pipeline::tokens::{Region, Token};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Header tokens closer than this horizontally are treated as one stacked
/// header ("Datum" above "transactie").
const SAME_COLUMN_TOLERANCE: f32 = 0.5;

/// Boundaries within this distance of the reference count as unchanged.
const DRIFT_TOLERANCE: f32 = 0.01;

/// One printed table header and the sub-column starts it defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderSpec {
    pub label: String,
    /// Column starts relative to the header's `x0`.
    pub offsets: Vec<f32>,
}

impl HeaderSpec {
    fn new(label: &str, offsets: &[f32]) -> Self {
        Self {
            label: label.to_string(),
            offsets: offsets.to_vec(),
        }
    }
}

/// Where each part of the statement sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegions {
    /// Date, customer number, serial number, balances. Page 1 only.
    pub metadata: Region,
    /// The table header row, restated on every page.
    pub table_header: Region,
    /// Table body on page 1 (below the letterhead).
    pub first_page_body: Region,
    /// Table body on later pages.
    pub later_page_body: Region,
}

impl LayoutRegions {
    /// Body region for a 0-based page index.
    pub fn body(&self, page: usize) -> &Region {
        if page == 0 {
            &self.first_page_body
        } else {
            &self.later_page_body
        }
    }
}

/// A known statement layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSchema {
    pub name: String,
    pub headers: Vec<HeaderSpec>,
    /// Boundaries a statement with this exact layout produces.
    pub reference_boundaries: Vec<f32>,
    pub regions: LayoutRegions,
}

impl Default for LayoutSchema {
    fn default() -> Self {
        Self::ics_2016()
    }
}

impl LayoutSchema {
    /// The layout used by ICS statements since 2016.
    pub fn ics_2016() -> Self {
        Self {
            name: "ics-2016".to_string(),
            headers: vec![
                HeaderSpec::new("Datum transactie", &[-1.0]),
                HeaderSpec::new("Datum boeking", &[-2.0]),
                HeaderSpec::new("Omschrijving", &[-4.0, 122.0, 209.0]),
                HeaderSpec::new("Bedrag in vreemde valuta", &[-3.0, 43.0]),
                HeaderSpec::new("Bedrag in euro's", &[-3.0, 56.0]),
            ],
            reference_boundaries: vec![60.0, 103.0, 150.0, 276.0, 363.0, 399.0, 445.0, 476.0, 535.0],
            regions: LayoutRegions {
                metadata: Region::new(56.0, 112.0, 526.0, 160.0),
                table_header: Region::new(56.0, 186.0, 550.0, 213.0),
                first_page_body: Region::new(56.0, 212.0, 550.0, 564.0),
                later_page_body: Region::new(56.0, 210.0, 550.0, 700.0),
            },
        }
    }

    /// Number of logical columns.
    pub fn column_count(&self) -> usize {
        self.headers.iter().map(|h| h.offsets.len()).sum()
    }

    /// Resolve column boundaries from the table-header words of one page.
    ///
    /// Returns the boundaries and, when they moved relative to the
    /// reference, a [`Warning::BoundaryDrift`] (already logged). `page` is
    /// 1-based and only used for reporting.
    pub fn resolve_boundaries(
        &self,
        words: &[Token],
        page: usize,
    ) -> Result<(Vec<f32>, Option<Warning>), StatementError> {
        let headers = merge_stacked_headers(words);

        let found: Vec<&str> = headers.iter().map(|(_, label)| label.as_str()).collect();
        let expected: Vec<&str> = self.headers.iter().map(|h| h.label.as_str()).collect();
        if found != expected {
            return Err(StatementError::Layout(format!(
                "Unexpected headers {found:?}. Expected {expected:?}."
            )));
        }

        let boundaries: Vec<f32> = headers
            .iter()
            .zip(&self.headers)
            .flat_map(|((x0, _), spec)| spec.offsets.iter().map(move |offset| x0 + offset))
            .collect();
        debug!("Page {}: column boundaries {:?}", page, boundaries);

        let unchanged = boundaries.len() == self.reference_boundaries.len()
            && boundaries
                .iter()
                .zip(&self.reference_boundaries)
                .all(|(a, b)| (a - b).abs() <= DRIFT_TOLERANCE);

        let drift = if unchanged {
            None
        } else {
            let w = Warning::BoundaryDrift {
                page,
                expected: self.reference_boundaries.clone(),
                found: boundaries.clone(),
            };
            warn!("{}", w);
            Some(w)
        };

        Ok((boundaries, drift))
    }
}

/// Merge header words that start at the same `x0` (a header wrapped over two
/// lines), keeping the order in which each column was first seen.
fn merge_stacked_headers(words: &[Token]) -> Vec<(f32, String)> {
    let mut headers: Vec<(f32, String)> = Vec::new();
    for word in words {
        match headers
            .iter_mut()
            .find(|(x0, _)| (x0 - word.x0).abs() <= SAME_COLUMN_TOLERANCE)
        {
            Some((_, label)) => {
                label.push(' ');
                label.push_str(&word.text);
            }
            None => headers.push((word.x0, word.text.clone())),
        }
    }
    headers
}
