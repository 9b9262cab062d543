//! Style primers: recorded (text, strokes) pairs that seed the generator with a
//! particular writer's hand.
//!
//! Primers are read once at startup from `style-{i}.json` files and are
//! read-only afterwards. Each file looks like:
//!
//! ```json
//! { "text": "the quick brown fox", "strokes": [[dx, dy, lift], ...] }
//! ```
//!
//! A primer captured on a tablet can give absolute `"points": [[x, y, lift], ...]`
//! instead. Those are converted to offsets and normalized to unit median step,
//! the scale recorded primers are already in.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::HandwritingError;
use crate::geometry::offsets::{normalize, to_offsets};
use crate::geometry::{AbsoluteStroke, Point, StrokeSample, StrokeSequence};
use crate::synthesis::alphabet::{encode, CharacterSequence, UnsupportedCharacter};

/// Styles are indexed `0..STYLE_COUNT`.
pub const STYLE_COUNT: usize = 13;

#[derive(Debug, Clone, PartialEq)]
pub struct StylePrimer {
    pub index: usize,
    pub text: String,
    pub characters: CharacterSequence,
    pub strokes: StrokeSequence,
}

#[derive(Debug, Serialize, Deserialize)]
struct StyleFile {
    text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    strokes: Vec<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    points: Vec<[f32; 3]>,
}

impl StylePrimer {
    pub fn new(
        index: usize,
        text: impl Into<String>,
        strokes: StrokeSequence,
    ) -> std::result::Result<Self, UnsupportedCharacter> {
        let text = text.into();
        let characters = encode(&text)?;
        Ok(Self {
            index,
            text,
            characters,
            strokes,
        })
    }

    pub fn from_json(index: usize, raw: &str) -> Result<Self> {
        let file: StyleFile =
            serde_json::from_str(raw).with_context(|| format!("Malformed style {index} file"))?;
        if file.text.trim().is_empty() {
            bail!("Style {index} has no primer text");
        }
        let strokes = match (file.strokes.is_empty(), file.points.is_empty()) {
            (false, true) => file
                .strokes
                .iter()
                .map(|&[dx, dy, lift]| StrokeSample::new(dx, dy, lift > 0.5))
                .collect::<Vec<_>>()
                .into(),
            (true, false) => {
                // The pen starts at the first captured point.
                let [x0, y0, _] = file.points[0];
                let captured: AbsoluteStroke = file
                    .points
                    .iter()
                    .map(|&[x, y, lift]| Point::new(x - x0, y - y0, lift > 0.5))
                    .collect::<Vec<_>>()
                    .into();
                normalize(&to_offsets(&captured))
            }
            (true, true) => bail!("Style {index} has no primer strokes"),
            (false, false) => bail!("Style {index} gives both strokes and points"),
        };
        Self::new(index, file.text, strokes)
            .with_context(|| format!("Style {index} primer text is not writable"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Library
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StyleLibrary {
    primers: Vec<Option<Arc<StylePrimer>>>,
}

impl Default for StyleLibrary {
    fn default() -> Self {
        Self {
            primers: vec![None; STYLE_COUNT],
        }
    }
}

impl StyleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every `style-{i}.json` present in `dir`. A missing directory gives an
    /// empty library (handwriting still works, just unprimed).
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut library = Self::new();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Styles directory not found; running without style primers");
            return Ok(library);
        }

        for index in 0..STYLE_COUNT {
            let path = dir.join(format!("style-{index}.json"));
            if !path.is_file() {
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            library.insert(StylePrimer::from_json(index, &raw)?)?;
        }

        info!(dir = %dir.display(), loaded = library.len(), "Style primers loaded");
        Ok(library)
    }

    pub fn insert(&mut self, primer: StylePrimer) -> std::result::Result<(), HandwritingError> {
        let index = primer.index;
        let slot = self
            .primers
            .get_mut(index)
            .ok_or(HandwritingError::InvalidStyleIndex(index))?;
        *slot = Some(Arc::new(primer));
        Ok(())
    }

    /// Looks up a primer by style index.
    pub fn load(&self, index: usize) -> std::result::Result<Arc<StylePrimer>, HandwritingError> {
        match self.primers.get(index) {
            None => Err(HandwritingError::InvalidStyleIndex(index)),
            Some(None) => Err(HandwritingError::StyleUnavailable(index)),
            Some(Some(primer)) => Ok(Arc::clone(primer)),
        }
    }

    pub fn available(&self) -> impl Iterator<Item = &StylePrimer> {
        self.primers.iter().filter_map(|p| p.as_deref())
    }

    pub fn len(&self) -> usize {
        self.available().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
