use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::forest::{ForestArtifact, ForestModel};

/// A fitted model producing one decision score per class.
pub trait EmotionModel: Send + Sync + std::fmt::Debug {
    fn input_dim(&self) -> usize;

    fn class_count(&self) -> usize;

    /// Raw per-class scores; larger means more likely.
    fn decision(&self, input: ArrayView1<'_, f64>) -> Array1<f64>;

    /// Class probabilities for scores returned by [`EmotionModel::decision`].
    fn probabilities(&self, scores: &Array1<f64>) -> Array1<f64> {
        softmax(scores)
    }
}

/// Index of the highest score, lowest index on ties.
pub(crate) fn argmax(scores: &Array1<f64>) -> usize {
    let mut best = 0;
    for (index, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = index;
        }
    }
    best
}

/// Serialized model, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Mlp(MlpArtifact),
    Linear(LinearArtifact),
    Forest(ForestArtifact),
}

impl ModelArtifact {
    pub fn build(self) -> Result<Box<dyn EmotionModel>, String> {
        match self {
            ModelArtifact::Mlp(artifact) => Ok(Box::new(MlpModel::try_from(artifact)?)),
            ModelArtifact::Linear(artifact) => Ok(Box::new(LinearModel::try_from(artifact)?)),
            ModelArtifact::Forest(artifact) => Ok(Box::new(ForestModel::try_from(artifact)?)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Identity,
    Logistic,
    Tanh,
    Relu,
}

impl Activation {
    fn apply(self, value: f64) -> f64 {
        match self {
            Activation::Identity => value,
            Activation::Logistic => 1.0 / (1.0 + (-value).exp()),
            Activation::Tanh => value.tanh(),
            Activation::Relu => value.max(0.0),
        }
    }
}

/// Dense layer with `weights` laid out input-major (`inputs x outputs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerArtifact {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpArtifact {
    #[serde(default = "default_activation")]
    pub activation: Activation,
    pub layers: Vec<LayerArtifact>,
}

fn default_activation() -> Activation {
    Activation::Relu
}

/// Linear scorer with one weight row per class (`classes x inputs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl DenseLayer {
    fn forward(&self, input: ArrayView1<'_, f64>) -> Array1<f64> {
        input.dot(&self.weights) + &self.bias
    }
}

/// Feed-forward network; hidden layers use `activation`, the output layer is linear.
#[derive(Debug, Clone)]
pub struct MlpModel {
    activation: Activation,
    layers: Vec<DenseLayer>,
}

impl TryFrom<MlpArtifact> for MlpModel {
    type Error = String;

    fn try_from(artifact: MlpArtifact) -> Result<Self, Self::Error> {
        if artifact.layers.is_empty() {
            return Err("network has no layers".to_string());
        }
        let mut layers = Vec::with_capacity(artifact.layers.len());
        for (index, layer) in artifact.layers.into_iter().enumerate() {
            let weights = matrix_from_rows(layer.weights)
                .map_err(|reason| format!("layer {index}: {reason}"))?;
            if weights.ncols() != layer.bias.len() {
                return Err(format!(
                    "layer {index}: {} outputs but {} biases",
                    weights.ncols(),
                    layer.bias.len()
                ));
            }
            if let Some(previous) = layers.last().map(|l: &DenseLayer| l.weights.ncols()) {
                if previous != weights.nrows() {
                    return Err(format!(
                        "layer {index} expects {} inputs but previous layer emits {}",
                        weights.nrows(),
                        previous
                    ));
                }
            }
            layers.push(DenseLayer {
                weights,
                bias: Array1::from(layer.bias),
            });
        }
        Ok(Self {
            activation: artifact.activation,
            layers,
        })
    }
}

impl EmotionModel for MlpModel {
    fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.weights.nrows())
    }

    fn class_count(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.weights.ncols())
    }

    fn decision(&self, input: ArrayView1<'_, f64>) -> Array1<f64> {
        let (output, hidden) = match self.layers.split_last() {
            Some(split) => split,
            None => return Array1::zeros(0),
        };
        let mut activations = input.to_owned();
        for layer in hidden {
            activations = layer.forward(activations.view());
            activations.mapv_inplace(|v| self.activation.apply(v));
        }
        output.forward(activations.view())
    }
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl TryFrom<LinearArtifact> for LinearModel {
    type Error = String;

    fn try_from(artifact: LinearArtifact) -> Result<Self, Self::Error> {
        let weights = matrix_from_rows(artifact.weights)?;
        if weights.nrows() != artifact.bias.len() {
            return Err(format!(
                "{} weight rows but {} biases",
                weights.nrows(),
                artifact.bias.len()
            ));
        }
        Ok(Self {
            weights,
            bias: Array1::from(artifact.bias),
        })
    }
}

impl EmotionModel for LinearModel {
    fn input_dim(&self) -> usize {
        self.weights.ncols()
    }

    fn class_count(&self) -> usize {
        self.weights.nrows()
    }

    fn decision(&self, input: ArrayView1<'_, f64>) -> Array1<f64> {
        self.weights.dot(&input) + &self.bias
    }
}

fn matrix_from_rows(rows: Vec<Vec<f64>>) -> Result<Array2<f64>, String> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if height == 0 || width == 0 {
        return Err("weight matrix is empty".to_string());
    }
    let mut flat = Vec::with_capacity(height * width);
    for (index, row) in rows.into_iter().enumerate() {
        if row.len() != width {
            return Err(format!(
                "weight row {index} has {} entries, expected {width}",
                row.len()
            ));
        }
        flat.extend(row);
    }
    if flat.iter().any(|w| !w.is_finite()) {
        return Err("weight matrix contains non-finite values".to_string());
    }
    Array2::from_shape_vec((height, width), flat).map_err(|err| err.to_string())
}

/// Probabilities from decision scores via a numerically stable softmax.
pub(crate) fn softmax(scores: &Array1<f64>) -> Array1<f64> {
    let peak = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !peak.is_finite() {
        return Array1::from_elem(scores.len(), 1.0 / scores.len().max(1) as f64);
    }
    let exp = scores.mapv(|s| (s - peak).exp());
    let total = exp.sum();
    exp / total
}

#[cfg(test)]
mod tests {
    use super::{argmax, softmax, EmotionModel, LinearModel, MlpModel, ModelArtifact};
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn mlp_runs_hidden_activation_then_linear_output() {
        let artifact: ModelArtifact = serde_json::from_str(
            r#"{
                "kind": "mlp",
                "activation": "relu",
                "layers": [
                    {"weights": [[1.0, -1.0], [0.0, 1.0]], "bias": [0.0, 0.0]},
                    {"weights": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], "bias": [0.0, 0.0, 0.5]}
                ]
            }"#,
        )
        .unwrap();
        let model = artifact.build().unwrap();
        assert_eq!(model.input_dim(), 2);
        assert_eq!(model.class_count(), 3);

        // hidden = relu([2, -2 + 1]) = [2, 0]
        let scores = model.decision(array![2.0, 1.0].view());
        assert_eq!(scores, array![2.0, 0.0, 0.5]);
        assert_eq!(argmax(&scores), 0);
    }

    #[test]
    fn mlp_rejects_mismatched_layers() {
        let artifact: ModelArtifact = serde_json::from_str(
            r#"{"kind": "mlp", "layers": [
                {"weights": [[1.0, 0.0]], "bias": [0.0, 0.0]},
                {"weights": [[1.0]], "bias": [0.0]}
            ]}"#,
        )
        .unwrap();
        assert!(artifact.build().is_err());
    }

    #[test]
    fn linear_model_scores_each_class() {
        let artifact: ModelArtifact = serde_json::from_str(
            r#"{"kind": "linear", "weights": [[1.0, 0.0], [0.0, 1.0]], "bias": [0.0, 0.1]}"#,
        )
        .unwrap();
        let model = artifact.build().unwrap();
        assert_eq!(argmax(&model.decision(array![1.0, 1.0].view())), 1);
    }

    #[test]
    fn linear_model_rejects_ragged_rows() {
        let artifact = super::LinearArtifact {
            weights: vec![vec![1.0, 0.0], vec![1.0]],
            bias: vec![0.0, 0.0],
        };
        assert!(LinearModel::try_from(artifact).is_err());
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        assert_eq!(argmax(&array![0.3, 0.7, 0.7]), 1);
    }

    #[test]
    fn softmax_is_a_distribution() {
        let probs = softmax(&array![1000.0, 1000.0, -1000.0]);
        assert_relative_eq!(probs.sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(probs[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn empty_network_is_rejected() {
        let artifact = super::MlpArtifact {
            activation: super::Activation::Relu,
            layers: Vec::new(),
        };
        assert!(MlpModel::try_from(artifact).is_err());
    }
}
