//! Document pipeline: text in, ordered page descriptions out.
//!
//! # Steps
//! 1. Wrap text into lines (word-safe).
//! 2. Validate everything up front: characters, per-line parameter counts,
//!    biases, style indices. Any failure here aborts before generation starts.
//! 3. Generate every line on the pool (bounded parallel, input order kept).
//! 4. Paginate and render. Lines whose generation failed keep their slot on the
//!    page but draw nothing; their error is in the line report.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::HandwritingError;
use crate::geometry::StrokeSequence;
use crate::layout::{
    paginate, render_page, wrap, LayoutConfig, Line, LineInk, PageDescription, PaperMode, PerLine,
};
use crate::model::StrokeModel;
use crate::synthesis::alphabet::{encode, CharacterSequence};
use crate::synthesis::generator::{Generation, GeneratorConfig, StopReason};
use crate::synthesis::pool::{GenerationPool, LineJob};
use crate::synthesis::primer::{StyleLibrary, StylePrimer};
use crate::synthesis::sampler::RECOMMENDED_BIAS;

pub const DEFAULT_BIAS: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub text: String,
    #[serde(default = "default_bias")]
    pub bias: PerLine<f32>,
    /// `None` writes unprimed.
    #[serde(default = "default_style")]
    pub style: PerLine<Option<usize>>,
    /// Pen colour per line. `None` keeps the paper's ink.
    #[serde(default = "default_ink", alias = "stroke_colors")]
    pub stroke_color: PerLine<Option<String>>,
    #[serde(default = "default_ink", alias = "stroke_widths")]
    pub stroke_width: PerLine<Option<f32>>,
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Caps the server's step limit for this request.
    #[serde(default)]
    pub max_generation_steps: Option<usize>,
    #[serde(flatten)]
    pub layout: LayoutOverrides,
}

/// Per-request layout knobs. Anything unset falls back to the server's layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutOverrides {
    #[serde(default, alias = "paper_type")]
    pub paper: Option<PaperMode>,
    #[serde(default)]
    pub max_chars_per_line: Option<usize>,
    #[serde(default)]
    pub lines_per_page: Option<usize>,
}

impl LayoutOverrides {
    pub fn apply(&self, base: &LayoutConfig) -> LayoutConfig {
        let mut layout = base.clone();
        if let Some(paper) = self.paper {
            layout.paper = paper;
        }
        if let Some(max) = self.max_chars_per_line {
            layout.max_chars_per_line = max;
        }
        if let Some(lines) = self.lines_per_page {
            layout.ruled.lines_per_page = lines;
        }
        layout
    }
}

fn default_bias() -> PerLine<f32> {
    PerLine::One(DEFAULT_BIAS)
}

fn default_style() -> PerLine<Option<usize>> {
    PerLine::One(None)
}

fn default_ink<T>() -> PerLine<Option<T>> {
    PerLine::One(None)
}

impl DocumentRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bias: default_bias(),
            style: default_style(),
            stroke_color: default_ink(),
            stroke_width: default_ink(),
            random_seed: None,
            max_generation_steps: None,
            layout: LayoutOverrides::default(),
        }
    }
}

/// Shared, read-only collaborators for a document run.
#[derive(Clone)]
pub struct Synthesis<'a> {
    pub model: &'a Arc<dyn StrokeModel>,
    pub styles: &'a StyleLibrary,
    pub pool: &'a GenerationPool,
    pub generator: GeneratorConfig,
    pub timeout: Option<Duration>,
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineError {
    pub code: String,
    pub message: String,
}

impl From<&HandwritingError> for LineError {
    fn from(err: &HandwritingError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineReport {
    pub index: usize,
    pub page: usize,
    pub text: String,
    pub bias: f32,
    pub style: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LineError>,
}

impl LineReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposedDocument {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<PageDescription>,
    pub lines: Vec<LineReport>,
    pub failed_lines: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

fn encode_lines(lines: &[Line]) -> Result<Vec<CharacterSequence>, HandwritingError> {
    lines
        .iter()
        .map(|line| {
            encode(&line.text).map_err(|e| HandwritingError::UnsupportedCharacter {
                line: line.index,
                column: e.column,
                character: e.character,
            })
        })
        .collect()
}

fn check_bias(bias: f32) -> Result<f32, HandwritingError> {
    if !bias.is_finite() || bias < 0.0 {
        return Err(HandwritingError::InvalidBias(bias));
    }
    if !RECOMMENDED_BIAS.contains(&bias) {
        warn!(
            bias,
            "Bias outside the recommended {}..={} range",
            RECOMMENDED_BIAS.start(),
            RECOMMENDED_BIAS.end()
        );
    }
    Ok(bias)
}

fn resolve_inks(request: &DocumentRequest, lines: usize) -> Result<Vec<LineInk>, HandwritingError> {
    let colors = request.stroke_color.expand("stroke_color", lines)?;
    let widths = request.stroke_width.expand("stroke_width", lines)?;
    colors
        .into_iter()
        .zip(widths)
        .map(|(color, width)| {
            if let Some(color) = color.as_deref().filter(|c| c.trim().is_empty()) {
                return Err(HandwritingError::InvalidStrokeColor(color.to_string()));
            }
            if let Some(width) = width.filter(|w| !w.is_finite() || *w <= 0.0) {
                return Err(HandwritingError::InvalidStrokeWidth(width));
            }
            Ok(LineInk { color, width })
        })
        .collect()
}

fn resolve_styles(
    styles: &[Option<usize>],
    library: &StyleLibrary,
) -> Result<Vec<Option<Arc<StylePrimer>>>, HandwritingError> {
    styles
        .iter()
        .map(|style| style.map(|index| library.load(index)).transpose())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// `base` is the server layout; request overrides are applied on top of it.
pub async fn compose_document(
    request: &DocumentRequest,
    base: &LayoutConfig,
    synthesis: &Synthesis<'_>,
) -> Result<ComposedDocument, HandwritingError> {
    let layout = &request.layout.apply(base);
    layout.validate()?;

    let lines = wrap(&request.text, layout.max_chars_per_line)?;
    if lines.is_empty() {
        return Err(HandwritingError::EmptyDocument);
    }
    let characters = encode_lines(&lines)?;
    let biases = request
        .bias
        .expand("bias", lines.len())?
        .into_iter()
        .map(check_bias)
        .collect::<Result<Vec<_>, _>>()?;
    let styles = request.style.expand("style", lines.len())?;
    let primers = resolve_styles(&styles, synthesis.styles)?;
    let inks = resolve_inks(request, lines.len())?;

    let jobs: Vec<LineJob> = lines
        .iter()
        .zip(characters)
        .zip(biases.iter().zip(primers))
        .map(|((line, characters), (&bias, primer))| LineJob {
            line_index: line.index,
            characters,
            primer,
            bias,
            seed: request.random_seed,
        })
        .collect();

    let mut generator = synthesis.generator;
    if let Some(max_steps) = request.max_generation_steps {
        generator.max_steps = generator.max_steps.min(max_steps);
    }

    let results = synthesis
        .pool
        .run_all(
            Arc::clone(synthesis.model),
            generator,
            synthesis.timeout,
            jobs,
        )
        .await;

    if results.iter().all(Result::is_err) {
        // Nothing to draw. Surface the first failure so the caller can act on it.
        if let Some(Err(first)) = results.into_iter().next() {
            return Err(first);
        }
        return Err(HandwritingError::EmptyDocument);
    }

    let pages = paginate(lines, layout.page_capacity());
    let mut reports = Vec::with_capacity(results.len());
    let mut descriptions = Vec::with_capacity(pages.len());

    for page in &pages {
        let generated: Vec<Option<StrokeSequence>> = page
            .lines
            .iter()
            .map(|line| results[line.index].as_ref().ok().map(|g| g.strokes.clone()))
            .collect();
        let page_inks: Vec<LineInk> = page
            .lines
            .iter()
            .map(|line| inks[line.index].clone())
            .collect();
        descriptions.push(render_page(page, &generated, &page_inks, layout));

        for line in &page.lines {
            reports.push(line_report(
                line,
                page.index,
                biases[line.index],
                styles[line.index],
                &results[line.index],
            ));
        }
    }

    let failed_lines = reports.iter().filter(|r| !r.succeeded()).count();
    let document = ComposedDocument {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        pages: descriptions,
        lines: reports,
        failed_lines,
    };
    info!(
        document = %document.id,
        generated_at = %document.generated_at,
        pages = document.pages.len(),
        lines = document.lines.len(),
        failed = failed_lines,
        "Composed handwriting document"
    );
    Ok(document)
}

fn line_report(
    line: &Line,
    page: usize,
    bias: f32,
    style: Option<usize>,
    result: &Result<Generation, HandwritingError>,
) -> LineReport {
    let (steps, stop, error) = match result {
        Ok(generation) => (Some(generation.steps), Some(generation.stop), None),
        Err(err) => {
            warn!(line = line.index, error = %err, "Line generation failed");
            (None, None, Some(LineError::from(err)))
        }
    };
    LineReport {
        index: line.index,
        page,
        text: line.text.clone(),
        bias,
        style,
        steps,
        stop,
        error,
    }
}
