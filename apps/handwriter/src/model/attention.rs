//! Gaussian attention window over the character sequence.
//!
//! `phi(u) = Σ_k α_k · exp(−β_k (κ_k − u)²)`. The centres κ only ever move
//! forward: each step adds `softplus(κ̂) / KAPPA_SCALE ≥ 0`.

use crate::model::ModelError;
use crate::synthesis::alphabet::{CharacterSequence, ALPHABET_SIZE};

/// Divides the per-step kernel advance. Keeps the window moving roughly one
/// character every couple of dozen samples at initialisation.
pub const KAPPA_SCALE: f32 = 25.0;
pub const MIN_BETA: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct AttentionWindow {
    pub alpha: Vec<f32>,
    pub beta: Vec<f32>,
    pub kappa: Vec<f32>,
}

pub(crate) fn softplus(x: f32) -> f32 {
    if x > 20.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

impl AttentionWindow {
    /// Builds the next window from the attention layer's raw `[α̂ × K, β̂ × K, κ̂ × K]`.
    pub fn advance(previous_kappa: &[f32], raw: &[f32]) -> Result<Self, ModelError> {
        let k = previous_kappa.len();
        if raw.len() != 3 * k {
            return Err(ModelError::ShapeMismatch {
                name: "attention_output".to_string(),
                expected: 3 * k,
                actual: raw.len(),
            });
        }
        let alpha = raw[..k].iter().map(|&a| softplus(a)).collect();
        let beta = raw[k..2 * k]
            .iter()
            .map(|&b| softplus(b).max(MIN_BETA))
            .collect();
        let kappa = previous_kappa
            .iter()
            .zip(&raw[2 * k..])
            .map(|(&prev, &step)| prev + softplus(step) / KAPPA_SCALE)
            .collect();
        Ok(Self { alpha, beta, kappa })
    }

    pub fn density(&self, u: f32) -> f32 {
        self.alpha
            .iter()
            .zip(&self.beta)
            .zip(&self.kappa)
            .map(|((a, b), k)| a * (-b * (k - u) * (k - u)).exp())
            .sum()
    }

    /// `phi` evaluated at character positions `0..positions`.
    pub fn profile(&self, positions: usize) -> Vec<f32> {
        (0..positions).map(|u| self.density(u as f32)).collect()
    }

    /// The character position the window is focused on: argmax of the profile
    /// over `0..positions`. Ties go to the earlier position.
    pub fn position(&self, positions: usize) -> usize {
        let mut best = 0;
        let mut best_value = f32::NEG_INFINITY;
        for (u, value) in self.profile(positions).into_iter().enumerate() {
            if value > best_value {
                best = u;
                best_value = value;
            }
        }
        best
    }

    /// Soft window `w = Σ_u phi(u) · onehot(c_u)` over the alphabet.
    pub fn context(&self, characters: &CharacterSequence) -> Vec<f32> {
        let mut window = vec![0.0_f32; ALPHABET_SIZE];
        for (u, &c) in characters.indices().iter().enumerate() {
            window[c as usize] += self.density(u as f32);
        }
        window
    }
}
