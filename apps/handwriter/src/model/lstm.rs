//! Dense and LSTM layers over flat row-major weight buffers.

use serde::{Deserialize, Serialize};

use crate::model::{LayerState, ModelError};

fn sigmoid(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

fn check_len(name: &str, actual: usize, expected: usize) -> Result<(), ModelError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ModelError::ShapeMismatch {
            name: name.to_string(),
            expected,
            actual,
        })
    }
}

/// `y = x · W + b`, `W` stored row-major as `input_dim × output_dim`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub input_dim: usize,
    pub output_dim: usize,
    pub kernel: Vec<f32>,
    pub bias: Vec<f32>,
}

impl Dense {
    pub fn validate(&self, name: &str) -> Result<(), ModelError> {
        check_len(
            &format!("{name}.kernel"),
            self.kernel.len(),
            self.input_dim * self.output_dim,
        )?;
        check_len(&format!("{name}.bias"), self.bias.len(), self.output_dim)
    }

    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let mut out = self.bias.clone();
        for (row, &x) in input.iter().enumerate().take(self.input_dim) {
            if x == 0.0 {
                continue;
            }
            let weights = &self.kernel[row * self.output_dim..(row + 1) * self.output_dim];
            for (o, w) in out.iter_mut().zip(weights) {
                *o += x * w;
            }
        }
        out
    }
}

/// A single LSTM layer. The kernel acts on `[input, hidden]` concatenated and
/// produces the four gates in `i, f, g, o` order, each `hidden_dim` wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    pub input_dim: usize,
    pub hidden_dim: usize,
    /// `(input_dim + hidden_dim) × 4·hidden_dim`, row-major.
    pub kernel: Vec<f32>,
    /// `4·hidden_dim`.
    pub bias: Vec<f32>,
    /// Added to the forget gate pre-activation.
    #[serde(default)]
    pub forget_bias: f32,
}

impl LstmLayer {
    pub fn validate(&self, name: &str) -> Result<(), ModelError> {
        let gates = 4 * self.hidden_dim;
        check_len(
            &format!("{name}.kernel"),
            self.kernel.len(),
            (self.input_dim + self.hidden_dim) * gates,
        )?;
        check_len(&format!("{name}.bias"), self.bias.len(), gates)
    }

    pub fn forward(&self, input: &[f32], state: &LayerState) -> Result<LayerState, ModelError> {
        check_len("lstm.input", input.len(), self.input_dim)?;
        if state.hidden.len() != self.hidden_dim || state.cell.len() != self.hidden_dim {
            return Err(ModelError::StateMismatch(format!(
                "layer expects hidden size {}, state has {}/{}",
                self.hidden_dim,
                state.hidden.len(),
                state.cell.len()
            )));
        }

        let h = self.hidden_dim;
        let gates_width = 4 * h;
        let mut gates = self.bias.clone();
        for (row, &x) in input.iter().chain(state.hidden.iter()).enumerate() {
            if x == 0.0 {
                continue;
            }
            let weights = &self.kernel[row * gates_width..(row + 1) * gates_width];
            for (g, w) in gates.iter_mut().zip(weights) {
                *g += x * w;
            }
        }

        let mut next = LayerState::zeros(h);
        for unit in 0..h {
            let i = sigmoid(gates[unit]);
            let f = sigmoid(gates[h + unit] + self.forget_bias);
            let g = gates[2 * h + unit].tanh();
            let o = sigmoid(gates[3 * h + unit]);
            let cell = f * state.cell[unit] + i * g;
            next.cell[unit] = cell;
            next.hidden[unit] = o * cell.tanh();
        }
        Ok(next)
    }
}
