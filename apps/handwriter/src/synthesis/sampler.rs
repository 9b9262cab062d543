//! Bias-adjusted mixture density sampling.
//!
//! A larger bias sharpens the mixture weights and shrinks every σ, trading
//! variety for legibility. Bias 0 samples the model's raw distribution.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::geometry::StrokeSample;
use crate::model::MixtureParams;

/// Recommended bias range. Values outside it are accepted but logged.
pub const RECOMMENDED_BIAS: std::ops::RangeInclusive<f32> = 0.1..=1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct BiasedMixture {
    pub weights: Vec<f32>,
    pub mu_x: Vec<f32>,
    pub mu_y: Vec<f32>,
    pub sigma_x: Vec<f32>,
    pub sigma_y: Vec<f32>,
    pub rho: Vec<f32>,
    pub pen_lift_probability: f32,
}

fn softmax(logits: impl Iterator<Item = f32>) -> Vec<f32> {
    let logits: Vec<f32> = logits.collect();
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl BiasedMixture {
    pub fn new(params: &MixtureParams, bias: f32) -> Self {
        let sharpen = 1.0 + bias;
        Self {
            weights: softmax(params.weight_logits.iter().map(|l| l * sharpen)),
            mu_x: params.mu_x.clone(),
            mu_y: params.mu_y.clone(),
            sigma_x: params.log_sigma_x.iter().map(|s| (s - bias).exp()).collect(),
            sigma_y: params.log_sigma_y.iter().map(|s| (s - bias).exp()).collect(),
            rho: params.rho_logits.iter().map(|r| r.tanh()).collect(),
            pen_lift_probability: 1.0 / (1.0 + (-params.pen_lift_logit).exp()),
        }
    }

    /// Index of the component selected by a uniform draw `u ∈ [0, 1)`.
    pub fn component_for(&self, u: f32) -> usize {
        let mut cumulative = 0.0_f32;
        for (i, &w) in self.weights.iter().enumerate() {
            cumulative += w;
            if u < cumulative {
                return i;
            }
        }
        // Rounding can leave the cumulative sum a hair under 1.
        self.weights.len().saturating_sub(1)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> StrokeSample {
        let k = self.component_for(rng.gen::<f32>());
        let z1: f32 = rng.sample(StandardNormal);
        let z2: f32 = rng.sample(StandardNormal);
        let rho = self.rho[k];

        let dx = self.mu_x[k] + self.sigma_x[k] * z1;
        let spread = (1.0 - rho * rho).max(0.0).sqrt();
        let dy = self.mu_y[k] + self.sigma_y[k] * (rho * z1 + spread * z2);
        let pen_lift = rng.gen::<f32>() < self.pen_lift_probability;
        StrokeSample::new(dx, dy, pen_lift)
    }
}
