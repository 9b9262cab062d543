//! Frozen network weights, loaded once from a JSON document.

use std::path::Path;

#[cfg(test)]
use rand::{Rng, SeedableRng};
#[cfg(test)]
use rand_chacha::ChaCha8Rng;
#[cfg(test)]
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::model::lstm::{Dense, LstmLayer};
use crate::model::ModelError;
use crate::synthesis::alphabet::ALPHABET_SIZE;

/// Width of one stroke input `[dx, dy, lift]`.
pub const INPUT_DIM: usize = 3;
pub const LAYER_COUNT: usize = 3;

/// Shape of the network, independent of any weight values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDimensions {
    pub lstm_size: usize,
    pub attention_components: usize,
    pub mixture_components: usize,
}

impl Default for ModelDimensions {
    fn default() -> Self {
        Self {
            lstm_size: 400,
            attention_components: 10,
            mixture_components: 20,
        }
    }
}

impl ModelDimensions {
    /// Input width of LSTM layer `layer` (0-based). The first layer sees the
    /// stroke and the previous window; deeper layers also see the layer below.
    pub fn layer_input_dim(&self, layer: usize) -> usize {
        if layer == 0 {
            INPUT_DIM + ALPHABET_SIZE
        } else {
            INPUT_DIM + ALPHABET_SIZE + self.lstm_size
        }
    }

    pub fn attention_output_dim(&self) -> usize {
        3 * self.attention_components
    }

    pub fn mixture_output_dim(&self) -> usize {
        6 * self.mixture_components + 1
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.lstm_size == 0 {
            return Err(ModelError::ZeroDimension { name: "lstm_size" });
        }
        if self.attention_components == 0 {
            return Err(ModelError::ZeroDimension {
                name: "attention_components",
            });
        }
        if self.mixture_components == 0 {
            return Err(ModelError::ZeroDimension {
                name: "mixture_components",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelWeights {
    #[serde(flatten)]
    pub dimensions: ModelDimensions,
    pub layers: Vec<LstmLayer>,
    pub attention: Dense,
    pub output: Dense,
}

impl ModelWeights {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        let weights: Self =
            serde_json::from_str(raw).map_err(|e| ModelError::Parse(e.to_string()))?;
        weights.validate()?;
        Ok(weights)
    }

    /// Checks every tensor against the declared dimensions.
    pub fn validate(&self) -> Result<(), ModelError> {
        let dims = &self.dimensions;
        dims.validate()?;

        if self.layers.len() != LAYER_COUNT {
            return Err(ModelError::ShapeMismatch {
                name: "layers".to_string(),
                expected: LAYER_COUNT,
                actual: self.layers.len(),
            });
        }
        for (i, layer) in self.layers.iter().enumerate() {
            let name = format!("layers[{i}]");
            expect_dim(&format!("{name}.input_dim"), layer.input_dim, dims.layer_input_dim(i))?;
            expect_dim(&format!("{name}.hidden_dim"), layer.hidden_dim, dims.lstm_size)?;
            layer.validate(&name)?;
        }

        expect_dim("attention.input_dim", self.attention.input_dim, dims.lstm_size)?;
        expect_dim(
            "attention.output_dim",
            self.attention.output_dim,
            dims.attention_output_dim(),
        )?;
        self.attention.validate("attention")?;

        expect_dim("output.input_dim", self.output.input_dim, dims.lstm_size)?;
        expect_dim("output.output_dim", self.output.output_dim, dims.mixture_output_dim())?;
        self.output.validate("output")
    }

    /// Small random weights of the right shape. Not a trained model.
    #[cfg(test)]
    pub fn seeded(dimensions: ModelDimensions, seed: u64) -> Result<Self, ModelError> {
        dimensions.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let h = dimensions.lstm_size;

        let layers = (0..LAYER_COUNT)
            .map(|i| {
                let input_dim = dimensions.layer_input_dim(i);
                LstmLayer {
                    input_dim,
                    hidden_dim: h,
                    kernel: random_vec(&mut rng, (input_dim + h) * 4 * h, 0.1),
                    bias: vec![0.0; 4 * h],
                    forget_bias: 1.0,
                }
            })
            .collect();

        let attention = Dense {
            input_dim: h,
            output_dim: dimensions.attention_output_dim(),
            kernel: random_vec(&mut rng, h * dimensions.attention_output_dim(), 0.1),
            bias: vec![0.0; dimensions.attention_output_dim()],
        };
        let output = Dense {
            input_dim: h,
            output_dim: dimensions.mixture_output_dim(),
            kernel: random_vec(&mut rng, h * dimensions.mixture_output_dim(), 0.1),
            bias: vec![0.0; dimensions.mixture_output_dim()],
        };

        let weights = Self {
            dimensions,
            layers,
            attention,
            output,
        };
        weights.validate()?;
        Ok(weights)
    }
}

fn expect_dim(name: &str, actual: usize, expected: usize) -> Result<(), ModelError> {
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

#[cfg(test)]
fn random_vec(rng: &mut ChaCha8Rng, len: usize, scale: f32) -> Vec<f32> {
    (0..len)
        .map(|_| rng.sample::<f32, _>(StandardNormal) * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_dims() -> ModelDimensions {
        ModelDimensions {
            lstm_size: 4,
            attention_components: 2,
            mixture_components: 3,
        }
    }

    #[test]
    fn test_seeded_weights_validate() {
        let weights = ModelWeights::seeded(make_dims(), 7).unwrap();
        assert_eq!(weights.layers.len(), 3);
        assert_eq!(weights.layers[0].input_dim, 78);
        assert_eq!(weights.layers[1].input_dim, 82);
        assert_eq!(weights.output.output_dim, 19);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let a = ModelWeights::seeded(make_dims(), 7).unwrap();
        let b = ModelWeights::seeded(make_dims(), 7).unwrap();
        assert_eq!(a.layers[2].kernel, b.layers[2].kernel);
        assert_eq!(a.output.kernel, b.output.kernel);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let dims = ModelDimensions {
            mixture_components: 0,
            ..make_dims()
        };
        let err = ModelWeights::seeded(dims, 1).unwrap_err();
        assert_eq!(
            err,
            ModelError::ZeroDimension {
                name: "mixture_components"
            }
        );
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let weights = ModelWeights::seeded(make_dims(), 3).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&weights).unwrap().as_bytes())
            .unwrap();

        let loaded = ModelWeights::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.dimensions, weights.dimensions);
        assert_eq!(loaded.attention.kernel, weights.attention.kernel);
    }

    #[test]
    fn test_truncated_tensor_rejected() {
        let mut weights = ModelWeights::seeded(make_dims(), 3).unwrap();
        weights.layers[1].kernel.pop();
        let raw = serde_json::to_string(&weights).unwrap();
        let err = ModelWeights::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { ref name, .. } if name == "layers[1].kernel"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelWeights::from_json_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = ModelWeights::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }
}
