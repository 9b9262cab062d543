//! Canvas Layout Renderer: places post-processed line strokes on a page.
//!
//! # Coordinates
//! Model output is y-up; pages are y-down. Every line is scaled, cleaned
//! (align → denoise → optional tail pass → interpolate), flipped, then moved
//! into its slot:
//! - blank: top-left of the stroke box at `padding_top + k × line_height`,
//!   centred horizontally when it fits inside the overflow margins
//! - ruled: mean height on rule `k` plus the baseline offset, left edge on the
//!   left margin, stretched horizontally (justified when nearly full)
//!
//! Output is an ordered primitive list: guides first, then one stroke path per
//! rendered line. Lines with no strokes (failed generation) leave their slot empty.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::{
    align, denoise, denoise_tail, interpolate, scale_offsets, to_absolute, AbsoluteStroke,
    StrokeSequence,
};
use crate::layout::config::{LayoutConfig, PaperMode, RuledCanvasConfig};
use crate::layout::paginate::Page;
use crate::layout::wrap::Line;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideKind {
    Margin,
    Header,
    Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
}

impl PathCommand {
    pub fn point(&self) -> (f32, f32) {
        match *self {
            PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => (x, y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Guide {
        kind: GuideKind,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        width: f32,
    },
    Stroke {
        line: usize,
        commands: Vec<PathCommand>,
        color: String,
        width: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDescription {
    pub index: usize,
    pub paper: PaperMode,
    pub width: f32,
    pub height: f32,
    pub primitives: Vec<Primitive>,
}

impl PageDescription {
    pub fn guides(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Guide { .. }))
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Stroke { .. }))
    }
}

/// Per-line pen override. Unset fields use the paper's configured ink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineInk {
    pub color: Option<String>,
    pub width: Option<f32>,
}

impl LineInk {
    fn resolve(ink: Option<&LineInk>, color: &str, width: f32) -> (String, f32) {
        let color = ink
            .and_then(|i| i.color.clone())
            .unwrap_or_else(|| color.to_string());
        let width = ink.and_then(|i| i.width).unwrap_or(width);
        (color, width)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Line post-processing
// ────────────────────────────────────────────────────────────────────────────

/// Raw generator output → cleaned absolute stroke in scaled model units (y-up).
pub fn prepare_line(
    strokes: &StrokeSequence,
    scale: f32,
    tail_smoothing: bool,
    interpolation_factor: usize,
) -> AbsoluteStroke {
    let absolute = to_absolute(&scale_offsets(strokes, scale));
    let mut cleaned = denoise(&align(&absolute));
    if tail_smoothing {
        cleaned = denoise_tail(&cleaned);
    }
    interpolate(&cleaned, interpolation_factor)
}

/// Pen-up after a lifted point starts a new subpath.
pub fn path_commands(stroke: &AbsoluteStroke) -> Vec<PathCommand> {
    let mut commands = Vec::with_capacity(stroke.len());
    let mut pen_up = true;
    for p in stroke.points() {
        commands.push(if pen_up {
            PathCommand::MoveTo { x: p.x, y: p.y }
        } else {
            PathCommand::LineTo { x: p.x, y: p.y }
        });
        pen_up = p.pen_lift;
    }
    commands
}

fn flip(stroke: AbsoluteStroke) -> AbsoluteStroke {
    stroke.map_points(|p| p.y = -p.y)
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out one page. `generated[i]` holds the strokes for `page.lines[i]`,
/// `None` when that line failed. `inks[i]` overrides its pen; a missing entry
/// keeps the paper default.
pub fn render_page(
    page: &Page,
    generated: &[Option<StrokeSequence>],
    inks: &[LineInk],
    config: &LayoutConfig,
) -> PageDescription {
    match config.paper {
        PaperMode::Blank => render_blank(page, generated, inks, config),
        PaperMode::Lined => render_ruled(page, generated, inks, config),
    }
}

fn render_blank(
    page: &Page,
    generated: &[Option<StrokeSequence>],
    inks: &[LineInk],
    config: &LayoutConfig,
) -> PageDescription {
    let blank = &config.blank;
    let line_count = page.lines.len();
    if line_count > blank.warn_above_lines {
        warn!(
            lines = line_count,
            "Blank page with many lines; quality may vary for very long documents"
        );
    }

    let mut primitives = Vec::new();
    for (slot, (line, strokes)) in page.lines.iter().zip(generated).enumerate() {
        let Some(strokes) = strokes else { continue };
        let stroke = flip(prepare_line(
            strokes,
            blank.stroke_scale,
            true,
            config.interpolation_factor,
        ));
        let Some((min_x, min_y, max_x, _)) = stroke.bounds() else {
            continue;
        };

        let natural_width = max_x - min_x;
        let x_offset = if natural_width < blank.width - 2.0 * blank.overflow_margin {
            (blank.width - natural_width) / 2.0
        } else {
            blank.overflow_margin
        };
        let y_offset = blank.padding_top + slot as f32 * blank.line_height;
        let placed = stroke.map_points(|p| {
            p.x = p.x - min_x + x_offset;
            p.y = p.y - min_y + y_offset;
        });

        let (color, width) = LineInk::resolve(inks.get(slot), &blank.stroke_color, blank.stroke_width);
        primitives.push(Primitive::Stroke {
            line: line.index,
            commands: path_commands(&placed),
            color,
            width,
        });
    }

    PageDescription {
        index: page.index,
        paper: PaperMode::Blank,
        width: blank.width,
        height: blank.height(line_count),
        primitives,
    }
}

fn ruled_guides(ruled: &RuledCanvasConfig) -> Vec<Primitive> {
    let width = ruled.width;
    let height = ruled.page_height();
    let guide = |kind, x1, y1, x2, y2, color: &str, stroke: f32| Primitive::Guide {
        kind,
        x1,
        y1,
        x2,
        y2,
        color: color.to_string(),
        width: stroke,
    };

    let left = ruled.margins.left - 20.0;
    let right = width - ruled.margins.right + 20.0;
    let top = ruled.margins.top;
    let mut guides = vec![
        guide(GuideKind::Margin, left, 0.0, left, height, &ruled.margin_color, ruled.margin_width),
        guide(GuideKind::Margin, right, 0.0, right, height, &ruled.margin_color, ruled.margin_width),
        guide(GuideKind::Header, 0.0, top, width, top, &ruled.header_color, ruled.header_width),
        guide(
            GuideKind::Header,
            0.0,
            top + ruled.header_gap,
            width,
            top + ruled.header_gap,
            &ruled.header_color,
            ruled.header_width,
        ),
    ];

    let mut y = ruled.rule_y(0);
    while y < height - ruled.margins.bottom + 10.0 {
        guides.push(guide(GuideKind::Rule, 0.0, y, width, y, &ruled.rule_color, ruled.rule_width));
        y += ruled.line_gap;
    }
    guides
}

/// Horizontal stretch for a line of `natural_width` on ruled paper. Never
/// pushes the line past the right margin.
pub fn ruled_stretch(ruled: &RuledCanvasConfig, natural_width: f32, line: &Line) -> f32 {
    let writing = ruled.writing_width();
    if natural_width <= 0.0 {
        return ruled.default_stretch;
    }
    let fill = natural_width * ruled.default_stretch / writing;
    if fill > ruled.justify_threshold && !line.ends_paragraph {
        (writing / natural_width).min(ruled.max_stretch)
    } else {
        ruled.default_stretch.min(writing / natural_width)
    }
}

fn render_ruled(
    page: &Page,
    generated: &[Option<StrokeSequence>],
    inks: &[LineInk],
    config: &LayoutConfig,
) -> PageDescription {
    let ruled = &config.ruled;
    let mut primitives = ruled_guides(ruled);

    for (slot, (line, strokes)) in page.lines.iter().zip(generated).enumerate() {
        let Some(strokes) = strokes else { continue };
        let stroke = flip(prepare_line(
            strokes,
            ruled.stroke_scale,
            false,
            config.interpolation_factor,
        ));
        let Some((min_x, _, max_x, _)) = stroke.bounds() else {
            continue;
        };

        let stretch = ruled_stretch(ruled, max_x - min_x, line);
        let mean_y = stroke.mean_y();
        let baseline = ruled.rule_y(slot) + ruled.baseline_offset;
        let placed = stroke.map_points(|p| {
            p.x = (p.x - min_x) * stretch + ruled.margins.left;
            p.y = p.y - mean_y + baseline;
        });

        let (color, width) = LineInk::resolve(inks.get(slot), &ruled.stroke_color, ruled.stroke_width);
        primitives.push(Primitive::Stroke {
            line: line.index,
            commands: path_commands(&placed),
            color,
            width,
        });
    }

    PageDescription {
        index: page.index,
        paper: PaperMode::Lined,
        width: ruled.width,
        height: ruled.page_height(),
        primitives,
    }
}
