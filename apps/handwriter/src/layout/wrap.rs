//! Greedy word-boundary wrapping.
//!
//! Paragraph breaks are `'\n'` or the two-character escape `\n` (as typed into
//! a single-line form field). Blank paragraphs are skipped and whitespace runs
//! collapse to one space. A word is never split: one that cannot fit on a line
//! by itself fails the whole document.

use serde::{Deserialize, Serialize};

use crate::errors::HandwritingError;
use crate::layout::config::MAX_CHARS_PER_LINE_CEILING;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Position in the whole document, 0-based.
    pub index: usize,
    pub text: String,
    /// Last line of its paragraph. Such lines are never justified.
    pub ends_paragraph: bool,
}

fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').flat_map(|p| p.split("\\n"))
}

pub fn wrap(text: &str, max_chars_per_line: usize) -> Result<Vec<Line>, HandwritingError> {
    if max_chars_per_line == 0 || max_chars_per_line > MAX_CHARS_PER_LINE_CEILING {
        return Err(HandwritingError::InvalidLayout(format!(
            "max_chars_per_line must be in 1..={MAX_CHARS_PER_LINE_CEILING}, got {max_chars_per_line}"
        )));
    }

    let mut lines: Vec<Line> = Vec::new();
    for paragraph in paragraphs(text) {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if word_len > max_chars_per_line {
                return Err(HandwritingError::WordTooLong {
                    word: word.to_string(),
                    length: word_len,
                    max: max_chars_per_line,
                });
            }

            let needed = if current.is_empty() {
                word_len
            } else {
                current_len + 1 + word_len
            };
            if needed > max_chars_per_line {
                lines.push(Line {
                    index: lines.len(),
                    text: std::mem::take(&mut current),
                    ends_paragraph: false,
                });
                current.push_str(word);
                current_len = word_len;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_len = needed;
            }
        }

        if !current.is_empty() {
            lines.push(Line {
                index: lines.len(),
                text: current,
                ends_paragraph: true,
            });
        }
    }
    Ok(lines)
}
