//! Positioned tokens and the token-source seam.
//!
//! Everything downstream of this module works on [`Token`] values: a piece
//! of text with a box in page coordinates (origin top-left, y grows down)
//! and the few attributes the layout rules look at. A [`TokenSource`]
//! answers "which tokens lie inside this region of page N", at character or
//! word granularity.
//!
//! [`ExtractedDocument`] is the in-memory source: it holds every character
//! of every page and derives words on demand. The pdfium backend in
//! [`crate::pipeline::extract`] produces one; tests build them by hand.

use crate::error::StatementError;
use serde::{Deserialize, Serialize};

/// Vertical distance (in points) within which characters share a line when
/// assembling words.
const WORD_Y_TOLERANCE: f32 = 3.0;

/// Writing direction of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextDirection {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

/// A positioned unit of text (one character or one word).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
    /// Font name as reported by the PDF, e.g. `"ABCDEF+Arial-Bold"`. Empty
    /// when the source does not know it.
    pub font_name: String,
    pub direction: TextDirection,
    pub upright: bool,
}

impl Token {
    /// A left-to-right, upright token.
    pub fn new(text: impl Into<String>, x0: f32, x1: f32, top: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
            bottom,
            font_name: String::new(),
            direction: TextDirection::LeftToRight,
            upright: true,
        }
    }

    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }
}

/// Axis-aligned rectangle in page coordinates: `(left, top, right, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Region {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// True when the token's whole box lies inside the region.
    pub fn contains(&self, token: &Token) -> bool {
        token.x0 >= self.left
            && token.x1 <= self.right
            && token.top >= self.top
            && token.bottom <= self.bottom
    }
}

/// How tokens are returned by a [`TokenSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One token per character, in source order.
    Chars,
    /// Characters joined into words. Blank characters are kept inside words;
    /// only a horizontal gap or a new line starts a new word.
    ///
    /// With `text_flow` the source order is trusted; without it characters
    /// are ordered by line and then left to right first.
    Words { text_flow: bool },
}

/// Supplies positioned tokens per page and region.
pub trait TokenSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Tokens inside `region` of page `page` (0-based).
    fn tokens(
        &self,
        page: usize,
        region: &Region,
        granularity: Granularity,
    ) -> Result<Vec<Token>, StatementError>;
}

/// All characters of one page, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageChars {
    pub width: f32,
    pub height: f32,
    pub chars: Vec<Token>,
}

/// A document whose text layer has been fully extracted into memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub pages: Vec<PageChars>,
    /// Horizontal gap (in points) above which two characters belong to
    /// different words.
    pub x_tolerance: f32,
}

impl ExtractedDocument {
    pub fn new(pages: Vec<PageChars>) -> Self {
        Self {
            pages,
            x_tolerance: 3.0,
        }
    }

    pub fn with_x_tolerance(mut self, x_tolerance: f32) -> Self {
        self.x_tolerance = x_tolerance;
        self
    }
}

impl TokenSource for ExtractedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn tokens(
        &self,
        page: usize,
        region: &Region,
        granularity: Granularity,
    ) -> Result<Vec<Token>, StatementError> {
        let page_chars = self.pages.get(page).ok_or_else(|| {
            StatementError::Layout(format!(
                "page {} requested, document has {} pages",
                page + 1,
                self.pages.len()
            ))
        })?;

        let chars: Vec<&Token> = page_chars
            .chars
            .iter()
            .filter(|c| region.contains(c))
            .collect();

        Ok(match granularity {
            Granularity::Chars => chars.into_iter().cloned().collect(),
            Granularity::Words { text_flow } => {
                let ordered = if text_flow {
                    chars
                } else {
                    order_by_lines(chars)
                };
                assemble_words(&ordered, self.x_tolerance)
            }
        })
    }
}

/// Order characters top to bottom by line, then left to right.
fn order_by_lines(mut chars: Vec<&Token>) -> Vec<&Token> {
    chars.sort_by(|a, b| a.top.total_cmp(&b.top));

    let mut lines: Vec<Vec<&Token>> = Vec::new();
    let mut line_top = f32::NEG_INFINITY;
    for c in chars {
        if c.top < line_top + WORD_Y_TOLERANCE {
            if let Some(line) = lines.last_mut() {
                line.push(c);
                continue;
            }
        }
        line_top = c.top;
        lines.push(vec![c]);
    }

    lines
        .into_iter()
        .flat_map(|mut line| {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            line
        })
        .collect()
}

/// Join consecutive characters into words.
///
/// A new word starts when the next character begins more than `x_tolerance`
/// right of the current word, lies left of the word's start (text flowed
/// back), or sits on a different line.
pub fn assemble_words(chars: &[&Token], x_tolerance: f32) -> Vec<Token> {
    let mut words = Vec::new();
    let mut current: Option<Token> = None;

    for c in chars {
        let starts_new = match &current {
            None => true,
            Some(w) => {
                c.x0 > w.x1 + x_tolerance
                    || c.x0 < w.x0
                    || (c.top - w.top).abs() > WORD_Y_TOLERANCE
            }
        };

        if starts_new {
            if let Some(w) = current.take() {
                push_word(&mut words, w);
            }
            current = Some((*c).clone());
            continue;
        }

        if let Some(w) = current.as_mut() {
            w.text.push_str(&c.text);
            w.x1 = w.x1.max(c.x1);
            w.top = w.top.min(c.top);
            w.bottom = w.bottom.max(c.bottom);
            w.upright &= c.upright;
        }
    }
    if let Some(w) = current {
        push_word(&mut words, w);
    }
    words
}

fn push_word(words: &mut Vec<Token>, mut word: Token) {
    let trimmed = word.text.trim();
    if trimmed.is_empty() {
        return;
    }
    if trimmed.len() != word.text.len() {
        word.text = trimmed.to_string();
    }
    words.push(word);
}

/// Lay out `text` as one character token per `char`, each `advance` wide.
///
/// Handy for building pages by hand; the pdfium backend never uses it.
pub fn chars_from_text(text: &str, x0: f32, top: f32, advance: f32, font: &str) -> Vec<Token> {
    text.chars()
        .enumerate()
        .map(|(i, ch)| {
            let x = x0 + i as f32 * advance;
            Token::new(ch.to_string(), x, x + advance, top, top + 8.0).with_font(font)
        })
        .collect()
}
