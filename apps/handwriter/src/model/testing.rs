//! Deterministic `StrokeModel` for tests: writes each character as a fixed number
//! of unit steps to the right, lifting the pen after the last one.

use crate::geometry::StrokeSample;
use crate::model::attention::AttentionWindow;
use crate::model::{LayerState, MixtureParams, ModelError, RecurrentState, StepOutput, StrokeModel};
use crate::synthesis::alphabet::{CharacterSequence, ALPHABET_SIZE};

/// Kernel offset so that the lift step of character `j` is still attended at `j`.
const KAPPA_OFFSET: f32 = 0.55;
const CERTAIN_LOGIT: f32 = 200.0;

#[derive(Debug, Clone)]
pub struct ScriptedModel {
    steps_per_character: usize,
    stalled: bool,
    lifts: bool,
}

impl ScriptedModel {
    pub fn new(steps_per_character: usize) -> Self {
        Self {
            steps_per_character,
            stalled: false,
            lifts: true,
        }
    }

    /// Attention never leaves the first character, so generation can only end
    /// at the step bound.
    pub fn stalled(steps_per_character: usize) -> Self {
        Self {
            steps_per_character,
            stalled: true,
            lifts: true,
        }
    }

    /// Never lifts the pen, so attention has to walk past the last character.
    pub fn without_lifts(mut self) -> Self {
        self.lifts = false;
        self
    }
}

impl StrokeModel for ScriptedModel {
    fn initial_state(&self) -> RecurrentState {
        RecurrentState {
            // The step counter is parked in the single hidden unit.
            layers: vec![LayerState::zeros(1)],
            kappa: vec![-KAPPA_OFFSET],
            window: vec![0.0; ALPHABET_SIZE],
        }
    }

    fn step(
        &self,
        state: &RecurrentState,
        _input: &StrokeSample,
        characters: &CharacterSequence,
    ) -> Result<(RecurrentState, StepOutput), ModelError> {
        if characters.is_empty() {
            return Err(ModelError::EmptyCharacters);
        }
        let counter = state
            .layers
            .first()
            .and_then(|l| l.hidden.first())
            .copied()
            .ok_or_else(|| ModelError::StateMismatch("missing step counter".to_string()))?;
        let taken = counter as usize + 1;

        let advance = if self.stalled {
            0.0
        } else {
            1.0 / self.steps_per_character as f32
        };
        let attention = AttentionWindow {
            alpha: vec![1.0],
            beta: vec![4.0],
            kappa: vec![state.kappa[0] + advance],
        };
        let lift = self.lifts && taken % self.steps_per_character == 0;

        let mixture = MixtureParams {
            weight_logits: vec![0.0],
            mu_x: vec![1.0],
            mu_y: vec![0.0],
            log_sigma_x: vec![-2.0],
            log_sigma_y: vec![-2.0],
            rho_logits: vec![0.0],
            pen_lift_logit: if lift { CERTAIN_LOGIT } else { -CERTAIN_LOGIT },
        };

        let mut layer = LayerState::zeros(1);
        layer.hidden[0] = taken as f32;
        let next = RecurrentState {
            layers: vec![layer],
            kappa: attention.kappa.clone(),
            window: attention.context(characters),
        };
        Ok((next, StepOutput { mixture, attention }))
    }
}
