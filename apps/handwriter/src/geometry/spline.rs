//! Natural cubic-spline upsampling, per pen-down stroke, parameterised by point index.

use super::{AbsoluteStroke, Point};

pub const DEFAULT_UPSAMPLE_FACTOR: usize = 2;

/// Inserts `factor - 1` spline points between every pair of neighbours.
///
/// Original points are kept bit-for-bit, so stroke endpoints never move. Only the
/// last point of each stroke keeps its pen-lift flag.
pub fn interpolate(stroke: &AbsoluteStroke, factor: usize) -> AbsoluteStroke {
    if factor <= 1 {
        return stroke.clone();
    }
    let mut out = Vec::with_capacity(stroke.len() * factor);
    for segment in stroke.strokes() {
        if segment.len() < 2 {
            out.extend_from_slice(segment);
            continue;
        }
        let xs: Vec<f32> = segment.iter().map(|p| p.x).collect();
        let ys: Vec<f32> = segment.iter().map(|p| p.y).collect();
        let mx = second_derivatives(&xs);
        let my = second_derivatives(&ys);

        let last = segment.len() - 1;
        for (i, p) in segment.iter().enumerate() {
            out.push(Point::new(p.x, p.y, i == last && p.pen_lift));
            if i == last {
                break;
            }
            for step in 1..factor {
                let u = step as f64 / factor as f64;
                out.push(Point::new(
                    eval(&xs, &mx, i, u),
                    eval(&ys, &my, i, u),
                    false,
                ));
            }
        }
    }
    out.into()
}

/// Second derivatives of the natural spline through `values` at unit spacing.
/// Solves `M[i-1] + 4 M[i] + M[i+1] = 6 (y[i+1] - 2 y[i] + y[i-1])` with the
/// Thomas algorithm, `M[0] = M[n-1] = 0`.
fn second_derivatives(values: &[f32]) -> Vec<f64> {
    let n = values.len();
    let mut m = vec![0.0_f64; n];
    if n < 3 {
        return m;
    }
    let inner = n - 2;
    let mut diag = vec![4.0_f64; inner];
    let mut rhs: Vec<f64> = (1..n - 1)
        .map(|i| 6.0 * (values[i + 1] as f64 - 2.0 * values[i] as f64 + values[i - 1] as f64))
        .collect();
    for i in 1..inner {
        let w = 1.0 / diag[i - 1];
        diag[i] -= w;
        rhs[i] -= w * rhs[i - 1];
    }
    m[inner] = rhs[inner - 1] / diag[inner - 1];
    for i in (0..inner - 1).rev() {
        m[i + 1] = (rhs[i] - m[i + 2]) / diag[i];
    }
    m
}

fn eval(values: &[f32], m: &[f64], i: usize, u: f64) -> f32 {
    let a = values[i] as f64;
    let b = values[i + 1] as f64;
    let v = 1.0 - u;
    let s = v * a + u * b + ((v * v * v - v) * m[i] + (u * u * u - u) * m[i + 1]) / 6.0;
    s as f32
}
