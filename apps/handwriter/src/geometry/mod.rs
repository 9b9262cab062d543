// Stroke geometry: offset/coordinate conversion, slant alignment, smoothing,
// resampling. Everything here is a pure function over owned point data.

pub mod align;
pub mod offsets;
pub mod smoothing;
pub mod spline;

pub use align::align;
pub use offsets::{scale_offsets, to_absolute};
pub use smoothing::{denoise, denoise_tail};
pub use spline::interpolate;

/// One generator output: a pen offset plus "pen leaves the paper after this point".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSample {
    pub dx: f32,
    pub dy: f32,
    pub pen_lift: bool,
}

impl StrokeSample {
    pub fn new(dx: f32, dy: f32, pen_lift: bool) -> Self {
        Self { dx, dy, pen_lift }
    }

    /// The input fed to the model before anything has been written: no motion, pen up.
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, true)
    }

    /// `[dx, dy, lift]` as the model consumes it.
    pub fn as_input(&self) -> [f32; 3] {
        [self.dx, self.dy, if self.pen_lift { 1.0 } else { 0.0 }]
    }
}

/// Ordered generator output for one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeSequence(Vec<StrokeSample>);

impl StrokeSequence {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, sample: StrokeSample) {
        self.0.push(sample);
    }

    pub fn samples(&self) -> &[StrokeSample] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last_mut(&mut self) -> Option<&mut StrokeSample> {
        self.0.last_mut()
    }

    /// Number of pen-down runs, i.e. contiguous groups of samples closed by a pen lift
    /// (or by the end of the sequence).
    pub fn pen_down_segments(&self) -> usize {
        self.0.split_inclusive(|s| s.pen_lift).count()
    }
}

impl From<Vec<StrokeSample>> for StrokeSequence {
    fn from(samples: Vec<StrokeSample>) -> Self {
        Self(samples)
    }
}

/// A point in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub pen_lift: bool,
}

impl Point {
    pub fn new(x: f32, y: f32, pen_lift: bool) -> Self {
        Self { x, y, pen_lift }
    }
}

/// Cumulative-sum view of a `StrokeSequence`. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbsoluteStroke(Vec<Point>);

impl AbsoluteStroke {
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pen-down strokes: each slice ends at a pen-lift point (the last may not).
    pub fn strokes(&self) -> impl Iterator<Item = &[Point]> {
        self.0.split_inclusive(|p| p.pen_lift)
    }

    /// `(min_x, min_y, max_x, max_y)`, or `None` for an empty stroke.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let first = self.0.first()?;
        Some(self.0.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        ))
    }

    pub fn mean_y(&self) -> f32 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().map(|p| p.y as f64).sum::<f64>() as f32 / self.0.len() as f32
    }

    /// Applies `f` to every point in place and returns the stroke.
    pub fn map_points(mut self, mut f: impl FnMut(&mut Point)) -> Self {
        self.0.iter_mut().for_each(|p| f(p));
        self
    }
}

impl From<Vec<Point>> for AbsoluteStroke {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pen_down_segments_counts_lifts() {
        let seq = StrokeSequence::from(vec![
            StrokeSample::new(1.0, 0.0, false),
            StrokeSample::new(1.0, 0.0, true),
            StrokeSample::new(1.0, 1.0, false),
            StrokeSample::new(1.0, 1.0, true),
        ]);
        assert_eq!(seq.pen_down_segments(), 2);
    }

    #[test]
    fn test_pen_down_segments_open_tail() {
        let seq = StrokeSequence::from(vec![
            StrokeSample::new(1.0, 0.0, true),
            StrokeSample::new(1.0, 0.0, false),
        ]);
        assert_eq!(seq.pen_down_segments(), 2);
        assert_eq!(StrokeSequence::new().pen_down_segments(), 0);
    }

    #[test]
    fn test_bounds() {
        let stroke = AbsoluteStroke::from(vec![
            Point::new(1.0, -2.0, false),
            Point::new(-3.0, 4.0, true),
        ]);
        assert_eq!(stroke.bounds(), Some((-3.0, -2.0, 1.0, 4.0)));
        assert_eq!(AbsoluteStroke::default().bounds(), None);
    }

    #[test]
    fn test_strokes_split_after_lift() {
        let stroke = AbsoluteStroke::from(vec![
            Point::new(0.0, 0.0, false),
            Point::new(1.0, 0.0, true),
            Point::new(2.0, 0.0, false),
        ]);
        let lens: Vec<usize> = stroke.strokes().map(|s| s.len()).collect();
        assert_eq!(lens, vec![2, 1]);
    }
}
