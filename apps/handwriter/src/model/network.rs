use crate::geometry::StrokeSample;
use crate::model::attention::AttentionWindow;
use crate::model::weights::{ModelWeights, LAYER_COUNT};
use crate::model::{LayerState, MixtureParams, ModelError, RecurrentState, StepOutput, StrokeModel};
use crate::synthesis::alphabet::{CharacterSequence, ALPHABET_SIZE};

/// Three stacked LSTMs with a Gaussian attention window between the first and
/// second layer and a mixture density head on the last.
///
/// ```text
///   x ─┬─► LSTM1 ──h1──► attention ──► w
///      │    ▲ w(t-1)                   │
///      ├────┼──────────────────────────┼─► LSTM2 ──h2──► LSTM3 ──h3──► MDN
///      └────┴──────────────────────────┘       (x, w, h below)
/// ```
#[derive(Debug, Clone)]
pub struct LstmAttentionModel {
    weights: ModelWeights,
}

impl LstmAttentionModel {
    pub fn new(weights: ModelWeights) -> Result<Self, ModelError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    fn check_state(&self, state: &RecurrentState) -> Result<(), ModelError> {
        let dims = &self.weights.dimensions;
        if state.layers.len() != LAYER_COUNT {
            return Err(ModelError::StateMismatch(format!(
                "expected {LAYER_COUNT} layer states, got {}",
                state.layers.len()
            )));
        }
        if state.kappa.len() != dims.attention_components {
            return Err(ModelError::StateMismatch(format!(
                "expected {} attention kernels, got {}",
                dims.attention_components,
                state.kappa.len()
            )));
        }
        if state.window.len() != ALPHABET_SIZE {
            return Err(ModelError::StateMismatch(format!(
                "expected a {ALPHABET_SIZE}-wide window, got {}",
                state.window.len()
            )));
        }
        Ok(())
    }
}

fn concat(parts: &[&[f32]]) -> Vec<f32> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

impl StrokeModel for LstmAttentionModel {
    fn initial_state(&self) -> RecurrentState {
        let dims = &self.weights.dimensions;
        RecurrentState {
            layers: (0..LAYER_COUNT)
                .map(|_| LayerState::zeros(dims.lstm_size))
                .collect(),
            kappa: vec![0.0; dims.attention_components],
            window: vec![0.0; ALPHABET_SIZE],
        }
    }

    fn step(
        &self,
        state: &RecurrentState,
        input: &StrokeSample,
        characters: &CharacterSequence,
    ) -> Result<(RecurrentState, StepOutput), ModelError> {
        if characters.is_empty() {
            return Err(ModelError::EmptyCharacters);
        }
        self.check_state(state)?;

        let x = input.as_input();
        let layers = &self.weights.layers;

        let first_in = concat(&[&x[..], &state.window[..]]);
        let first = layers[0].forward(&first_in, &state.layers[0])?;
        let attention =
            AttentionWindow::advance(&state.kappa, &self.weights.attention.apply(&first.hidden))?;
        let window = attention.context(characters);

        let second_in = concat(&[&x[..], &window[..], &first.hidden[..]]);
        let second = layers[1].forward(&second_in, &state.layers[1])?;
        let third_in = concat(&[&x[..], &window[..], &second.hidden[..]]);
        let third = layers[2].forward(&third_in, &state.layers[2])?;

        let mixture = MixtureParams::from_flat(
            &self.weights.output.apply(&third.hidden),
            self.weights.dimensions.mixture_components,
        )?;

        let next = RecurrentState {
            layers: vec![first, second, third],
            kappa: attention.kappa.clone(),
            window,
        };
        Ok((next, StepOutput { mixture, attention }))
    }
}
