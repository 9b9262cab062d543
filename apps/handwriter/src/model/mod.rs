//! Recurrent stroke model: the single point of entry for network weights.
//!
//! ARCHITECTURAL RULE: the generator never touches weights directly. It talks to
//! the model through [`StrokeModel`], handing in an explicit [`RecurrentState`]
//! and getting a new one back, so a run's state machine can be tested without
//! trained weights.
//!
//! Weights are loaded once at startup and shared read-only (`Arc<dyn StrokeModel>`)
//! across every concurrent line generation.

use thiserror::Error;

use crate::geometry::StrokeSample;
use crate::model::attention::AttentionWindow;
use crate::synthesis::alphabet::CharacterSequence;

pub mod attention;
pub mod lstm;
pub mod network;
pub mod weights;

#[cfg(test)]
pub(crate) mod testing;

pub use network::LstmAttentionModel;
pub use weights::ModelWeights;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Failed to read weights from {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse weights: {0}")]
    Parse(String),

    #[error("Weight tensor {name} has {actual} values, expected {expected}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Model dimension {name} must be non-zero")]
    ZeroDimension { name: &'static str },

    #[error("Recurrent state does not match the model: {0}")]
    StateMismatch(String),

    #[error("Cannot attend over an empty character sequence")]
    EmptyCharacters,
}

// ────────────────────────────────────────────────────────────────────────────
// State and outputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub hidden: Vec<f32>,
    pub cell: Vec<f32>,
}

impl LayerState {
    pub fn zeros(size: usize) -> Self {
        Self {
            hidden: vec![0.0; size],
            cell: vec![0.0; size],
        }
    }
}

/// Everything the model carries from one step to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentState {
    pub layers: Vec<LayerState>,
    /// Attention kernel centres, one per kernel. Never decreases.
    pub kappa: Vec<f32>,
    /// Previous soft window over the alphabet (the context vector).
    pub window: Vec<f32>,
}

/// Raw, pre-activation mixture density output for one step.
///
/// Activations (and the bias) are applied by the sampler, not the model.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureParams {
    pub weight_logits: Vec<f32>,
    pub mu_x: Vec<f32>,
    pub mu_y: Vec<f32>,
    pub log_sigma_x: Vec<f32>,
    pub log_sigma_y: Vec<f32>,
    pub rho_logits: Vec<f32>,
    pub pen_lift_logit: f32,
}

impl MixtureParams {
    /// Splits a flat output vector laid out as
    /// `[π̂ × M, μx × M, μy × M, log σx × M, log σy × M, ρ̂ × M, ê]`.
    pub fn from_flat(raw: &[f32], components: usize) -> Result<Self, ModelError> {
        let expected = 6 * components + 1;
        if raw.len() != expected {
            return Err(ModelError::ShapeMismatch {
                name: "mixture_output".to_string(),
                expected,
                actual: raw.len(),
            });
        }
        let chunk = |i: usize| raw[i * components..(i + 1) * components].to_vec();
        Ok(Self {
            weight_logits: chunk(0),
            mu_x: chunk(1),
            mu_y: chunk(2),
            log_sigma_x: chunk(3),
            log_sigma_y: chunk(4),
            rho_logits: chunk(5),
            pen_lift_logit: raw[expected - 1],
        })
    }

    pub fn components(&self) -> usize {
        self.weight_logits.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub mixture: MixtureParams,
    pub attention: AttentionWindow,
}

/// The narrow "sample next step" interface the generator depends on.
pub trait StrokeModel: Send + Sync {
    /// Zero state: no hidden activity, attention parked before the first character.
    fn initial_state(&self) -> RecurrentState;

    /// Advances the model by one input sample while attending over `characters`.
    fn step(
        &self,
        state: &RecurrentState,
        input: &StrokeSample,
        characters: &CharacterSequence,
    ) -> Result<(RecurrentState, StepOutput), ModelError>;
}
