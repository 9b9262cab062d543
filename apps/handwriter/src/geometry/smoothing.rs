//! Savitzky–Golay smoothing applied per pen-down stroke.
//!
//! Edge samples are taken from the polynomial fitted to the first/last full
//! window, so any polynomial of degree ≤ `SAVGOL_ORDER` passes through the
//! filter unchanged. Strokes shorter than the window are left as they are.

use super::{AbsoluteStroke, Point};

pub const SAVGOL_WINDOW: usize = 7;
pub const SAVGOL_ORDER: usize = 3;

/// Lines longer than this get their tail smoothed a second time.
pub const TAIL_SMOOTHING_MIN_POINTS: usize = 20;
/// Where the tail starts, as a fraction of the line's points.
pub const TAIL_START_FRACTION: f32 = 0.75;

pub fn denoise(stroke: &AbsoluteStroke) -> AbsoluteStroke {
    let mut out = Vec::with_capacity(stroke.len());
    for segment in stroke.strokes() {
        let xs: Vec<f32> = segment.iter().map(|p| p.x).collect();
        let ys: Vec<f32> = segment.iter().map(|p| p.y).collect();
        let xs = savgol_filter(&xs, SAVGOL_WINDOW, SAVGOL_ORDER);
        let ys = savgol_filter(&ys, SAVGOL_WINDOW, SAVGOL_ORDER);
        out.extend(
            segment
                .iter()
                .zip(xs.into_iter().zip(ys))
                .map(|(p, (x, y))| Point::new(x, y, p.pen_lift)),
        );
    }
    out.into()
}

/// Smooths the last quarter of a line once more. Generated lines tend to get
/// shakier towards the end.
pub fn denoise_tail(stroke: &AbsoluteStroke) -> AbsoluteStroke {
    let start = (stroke.len() as f32 * TAIL_START_FRACTION) as usize;
    if stroke.len() <= TAIL_SMOOTHING_MIN_POINTS || start <= 10 {
        return stroke.clone();
    }
    let points = stroke.points();
    let tail = denoise(&AbsoluteStroke::from(points[start..].to_vec()));
    let mut out = points[..start].to_vec();
    out.extend(tail.into_points());
    out.into()
}

// ────────────────────────────────────────────────────────────────────────────
// Filter
// ────────────────────────────────────────────────────────────────────────────

pub fn savgol_filter(values: &[f32], window: usize, order: usize) -> Vec<f32> {
    let n = values.len();
    if window < 3 || window % 2 == 0 || order >= window || n < window {
        return values.to_vec();
    }
    let half = window / 2;
    let dot = |w: &[f64], v: &[f32]| -> f32 {
        w.iter().zip(v).map(|(a, &b)| a * b as f64).sum::<f64>() as f32
    };

    let mut out = vec![0.0_f32; n];
    let centre = savgol_weights(window, order, 0.0);
    for i in half..n - half {
        out[i] = dot(&centre, &values[i - half..=i + half]);
    }
    for i in 0..half {
        let offset = i as f64 - half as f64;
        out[i] = dot(&savgol_weights(window, order, offset), &values[..window]);
        out[n - 1 - i] = dot(&savgol_weights(window, order, -offset), &values[n - window..]);
    }
    out
}

/// Weights `w` such that `Σ w_j · v_j` evaluates, at `at`, the degree-`order`
/// least-squares polynomial through samples at positions `-half..=half`.
///
/// `w = A (AᵀA)⁻¹ p` where `A[j][k] = t_jᵏ` and `p_k = atᵏ`.
pub fn savgol_weights(window: usize, order: usize, at: f64) -> Vec<f64> {
    let half = (window / 2) as f64;
    let terms = order + 1;
    let positions: Vec<f64> = (0..window).map(|j| j as f64 - half).collect();

    let mut gram = vec![vec![0.0_f64; terms]; terms];
    for (r, row) in gram.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = positions.iter().map(|t| t.powi((r + c) as i32)).sum();
        }
    }
    let rhs: Vec<f64> = (0..terms).map(|k| at.powi(k as i32)).collect();
    let z = solve(gram, rhs);

    positions
        .iter()
        .map(|t| (0..terms).map(|k| t.powi(k as i32) * z[k]).sum())
        .collect()
}

/// Gaussian elimination with partial pivoting. The Gram matrix of distinct
/// sample positions is symmetric positive definite, so it never degenerates.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0_f64; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    x
}
