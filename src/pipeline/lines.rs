//! Line grouping: partition tokens into visual lines by vertical position.

use crate::error::StatementError;
use crate::pipeline::tokens::{TextDirection, Token};

/// Default vertical tolerance, in points, for tokens on the same line.
pub const DEFAULT_LINE_TOLERANCE: f32 = 3.0;

/// One visual line: tokens sharing a vertical band, in source order.
pub type Line = Vec<Token>;

/// Group tokens (sorted by `top`) into lines.
///
/// A token starts a new line once its top is `line_tolerance` or more below
/// the top of the token that opened the current line. Only upright,
/// left-to-right text is supported.
pub fn group_by_lines(tokens: &[Token], line_tolerance: f32) -> Result<Vec<Line>, StatementError> {
    let mut lines: Vec<Line> = Vec::new();
    let Some(first) = tokens.first() else {
        return Ok(lines);
    };

    let mut line_top = first.top;
    let mut line: Line = Vec::new();

    for token in tokens {
        if !token.upright {
            return Err(StatementError::Layout(format!(
                "Word {:?} is not upright",
                token.text
            )));
        }
        if token.direction != TextDirection::LeftToRight {
            return Err(StatementError::Layout(format!(
                "Word {:?} is not left-to-right",
                token.text
            )));
        }
        if token.top >= line_top + line_tolerance {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            line_top = token.top;
        }
        line.push(token.clone());
    }
    if !line.is_empty() {
        lines.push(line);
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str, x0: f32, top: f32) -> Token {
        Token::new(text, x0, x0 + 5.0, top, top + 8.0)
    }

    #[test]
    fn empty_input_gives_no_lines() {
        assert!(group_by_lines(&[], 3.0).unwrap().is_empty());
    }

    #[test]
    fn groups_within_tolerance() {
        let tokens = vec![
            at("a", 10.0, 100.0),
            at("b", 20.0, 102.9),
            at("c", 10.0, 103.0),
            at("d", 20.0, 104.5),
            at("e", 10.0, 120.0),
        ];
        let lines = group_by_lines(&tokens, 3.0).unwrap();
        let texts: Vec<Vec<&str>> = lines
            .iter()
            .map(|l| l.iter().map(|t| t.text.as_str()).collect())
            .collect();
        assert_eq!(texts, vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]);
    }

    #[test]
    fn reference_top_is_the_line_opener() {
        // Each token is within tolerance of its predecessor but the third is
        // 3.2 below the opener, so it starts a new line.
        let tokens = vec![at("a", 0.0, 10.0), at("b", 5.0, 11.6), at("c", 10.0, 13.2)];
        let lines = group_by_lines(&tokens, 3.0).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1][0].text, "c");
    }

    #[test]
    fn keeps_source_order_within_a_line() {
        let tokens = vec![at("right", 300.0, 50.0), at("left", 10.0, 50.5)];
        let lines = group_by_lines(&tokens, 3.0).unwrap();
        assert_eq!(lines[0][0].text, "right");
    }

    #[test]
    fn rejects_rotated_text() {
        let mut t = at("x", 0.0, 0.0);
        t.upright = false;
        let err = group_by_lines(&[t], 3.0).unwrap_err();
        assert!(err.to_string().contains("not upright"));
    }

    #[test]
    fn rejects_right_to_left_text() {
        let mut t = at("x", 0.0, 0.0);
        t.direction = TextDirection::RightToLeft;
        let err = group_by_lines(&[t], 3.0).unwrap_err();
        assert!(err.to_string().contains("left-to-right"));
    }
}
