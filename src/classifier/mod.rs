pub mod forest;
pub mod labels;
pub mod model;
pub mod scaler;

use tracing::debug;

pub use forest::{ForestArtifact, ForestModel, TreeArtifact};
pub use labels::LabelEncoder;
pub use model::{
    Activation, EmotionModel, LayerArtifact, LinearArtifact, LinearModel, MlpArtifact, MlpModel,
    ModelArtifact,
};
pub use scaler::{NormalizationParameters, NormalizedVector, Normalizer};

use crate::error::{Error, Result};
use crate::types::{ClassProbability, Prediction};

/// A fitted model paired with the encoder that names its classes.
#[derive(Debug)]
pub struct Classifier {
    model: Box<dyn EmotionModel>,
    encoder: LabelEncoder,
}

impl Classifier {
    pub fn new(model: Box<dyn EmotionModel>, encoder: LabelEncoder) -> Self {
        Self { model, encoder }
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn classify(&self, input: &NormalizedVector) -> Result<Prediction> {
        if input.len() != self.model.input_dim() {
            return Err(Error::DimensionMismatch {
                expected: self.model.input_dim(),
                actual: input.len(),
            });
        }
        let scores = self.model.decision(input.view());
        let class_index = model::argmax(&scores);
        let emotion = self.encoder.decode(class_index)?;
        debug!(class_index, %emotion, "decoded model output");

        let probabilities = self
            .model
            .probabilities(&scores)
            .iter()
            .zip(self.encoder.classes())
            .map(|(probability, emotion)| ClassProbability {
                emotion: *emotion,
                probability: *probability,
            })
            .collect();
        Ok(Prediction {
            emotion,
            class_index,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, ArrayView1};

    use super::{Classifier, EmotionModel, LabelEncoder, NormalizedVector};
    use crate::error::Error;
    use crate::types::Emotion;

    #[derive(Debug)]
    struct FixedModel {
        scores: Vec<f64>,
    }

    impl EmotionModel for FixedModel {
        fn input_dim(&self) -> usize {
            2
        }

        fn class_count(&self) -> usize {
            self.scores.len()
        }

        fn decision(&self, _input: ArrayView1<'_, f64>) -> Array1<f64> {
            Array1::from(self.scores.clone())
        }
    }

    #[test]
    fn picks_highest_score_and_reports_probabilities() {
        let encoder = LabelEncoder::new(vec![Emotion::Calm, Emotion::Sad, Emotion::Happy]).unwrap();
        let classifier = Classifier::new(
            Box::new(FixedModel {
                scores: vec![0.0, 3.0, 1.0],
            }),
            encoder,
        );
        let prediction = classifier
            .classify(&NormalizedVector::from_values(vec![0.0, 0.0]))
            .unwrap();
        assert_eq!(prediction.emotion, Emotion::Sad);
        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.probabilities.len(), 3);
        let total: f64 = prediction.probabilities.iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn index_past_encoder_is_unknown_class() {
        let encoder = LabelEncoder::new(vec![Emotion::Calm]).unwrap();
        let classifier = Classifier::new(
            Box::new(FixedModel {
                scores: vec![0.0, 1.0],
            }),
            encoder,
        );
        let err = classifier
            .classify(&NormalizedVector::from_values(vec![0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownClass { index: 1, known: 1 }));
    }

    #[test]
    fn rejects_input_of_wrong_width() {
        let classifier = Classifier::new(
            Box::new(FixedModel { scores: vec![1.0] }),
            LabelEncoder::sorted(),
        );
        let err = classifier
            .classify(&NormalizedVector::from_values(vec![0.0; 3]))
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }
}
