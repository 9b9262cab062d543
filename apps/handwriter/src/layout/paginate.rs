use serde::{Deserialize, Serialize};

use crate::errors::HandwritingError;
use crate::layout::wrap::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCapacity {
    /// Blank paper: everything on one page.
    Unbounded,
    Lines(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub lines: Vec<Line>,
}

/// Groups lines into pages. Every page but the last is full.
pub fn paginate(lines: Vec<Line>, capacity: PageCapacity) -> Vec<Page> {
    if lines.is_empty() {
        return Vec::new();
    }
    match capacity {
        PageCapacity::Unbounded => vec![Page { index: 0, lines }],
        PageCapacity::Lines(per_page) => lines
            .chunks(per_page.max(1))
            .enumerate()
            .map(|(index, chunk)| Page {
                index,
                lines: chunk.to_vec(),
            })
            .collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-line parameters
// ────────────────────────────────────────────────────────────────────────────

/// A parameter given once for the whole document or once per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerLine<T> {
    Each(Vec<T>),
    One(T),
}

impl<T: Clone> PerLine<T> {
    /// One value per line: a single value is broadcast, a list must match exactly.
    pub fn expand(&self, parameter: &'static str, lines: usize) -> Result<Vec<T>, HandwritingError> {
        match self {
            PerLine::One(value) => Ok(vec![value.clone(); lines]),
            PerLine::Each(values) if values.len() == lines => Ok(values.clone()),
            PerLine::Each(values) => Err(HandwritingError::ParameterCountMismatch {
                parameter,
                expected: lines,
                actual: values.len(),
            }),
        }
    }
}

impl<T> From<T> for PerLine<T> {
    fn from(value: T) -> Self {
        PerLine::One(value)
    }
}
