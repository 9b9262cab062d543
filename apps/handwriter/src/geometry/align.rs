//! Slant correction.
//!
//! The rotation angle is the one for which the least-squares slope of the
//! rotated cloud is exactly zero: `tan 2θ = 2·Sxy / (Sxx − Syy)`, taking the root
//! in (−45°, 45°). Rotation is about the centroid, so zero-slant input comes back
//! untouched and a second pass rotates by (numerically) nothing.

use super::AbsoluteStroke;

pub fn align(stroke: &AbsoluteStroke) -> AbsoluteStroke {
    let points = stroke.points();
    if points.len() < 2 {
        return stroke.clone();
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y as f64).sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for p in points {
        let dx = p.x as f64 - mean_x;
        let dy = p.y as f64 - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx <= f64::EPSILON || sxy.abs() <= 1e-9 * sxx {
        return stroke.clone();
    }

    let theta = slant_angle(sxx, syy, sxy);
    let (sin, cos) = theta.sin_cos();

    stroke.clone().map_points(|p| {
        let dx = p.x as f64 - mean_x;
        let dy = p.y as f64 - mean_y;
        p.x = (mean_x + dx * cos + dy * sin) as f32;
        p.y = (mean_y - dx * sin + dy * cos) as f32;
    })
}

fn slant_angle(sxx: f64, syy: f64, sxy: f64) -> f64 {
    let spread = sxx - syy;
    if spread.abs() <= f64::EPSILON * (sxx + syy) {
        std::f64::consts::FRAC_PI_4.copysign(sxy)
    } else {
        0.5 * (2.0 * sxy / spread).atan()
    }
}
