//! Offset ↔ coordinate conversion and step-length normalization.

use super::{AbsoluteStroke, Point, StrokeSample, StrokeSequence};

/// Median step length after `normalize`.
pub const UNIT_STEP: f32 = 1.0;

/// Cumulative sum of offsets, starting from the origin.
///
/// Accumulates in f64 so long lines do not drift.
pub fn to_absolute(sequence: &StrokeSequence) -> AbsoluteStroke {
    let mut x = 0.0_f64;
    let mut y = 0.0_f64;
    sequence
        .samples()
        .iter()
        .map(|s| {
            x += s.dx as f64;
            y += s.dy as f64;
            Point::new(x as f32, y as f32, s.pen_lift)
        })
        .collect::<Vec<_>>()
        .into()
}

/// Inverse of [`to_absolute`]: the first point is its own offset from the origin.
pub fn to_offsets(stroke: &AbsoluteStroke) -> StrokeSequence {
    let mut prev = (0.0_f32, 0.0_f32);
    stroke
        .points()
        .iter()
        .map(|p| {
            let sample = StrokeSample::new(p.x - prev.0, p.y - prev.1, p.pen_lift);
            prev = (p.x, p.y);
            sample
        })
        .collect::<Vec<_>>()
        .into()
}

/// Multiplies every offset by `factor` (the stroke-to-pixel scale).
pub fn scale_offsets(sequence: &StrokeSequence, factor: f32) -> StrokeSequence {
    sequence
        .samples()
        .iter()
        .map(|s| StrokeSample::new(s.dx * factor, s.dy * factor, s.pen_lift))
        .collect::<Vec<_>>()
        .into()
}

/// Rescales offsets so the median step length equals [`UNIT_STEP`].
///
/// Sequences whose median step is zero are returned unchanged.
pub fn normalize(sequence: &StrokeSequence) -> StrokeSequence {
    let mut lengths: Vec<f32> = sequence
        .samples()
        .iter()
        .map(|s| s.dx.hypot(s.dy))
        .collect();
    if lengths.is_empty() {
        return sequence.clone();
    }
    lengths.sort_by(|a, b| a.total_cmp(b));
    let mid = lengths.len() / 2;
    let median = if lengths.len() % 2 == 0 {
        (lengths[mid - 1] + lengths[mid]) / 2.0
    } else {
        lengths[mid]
    };
    if median <= f32::EPSILON {
        return sequence.clone();
    }
    scale_offsets(sequence, UNIT_STEP / median)
}
