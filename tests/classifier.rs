mod common;

use anyhow::Result;
use emovox::classifier::{
    Classifier, EmotionModel, LabelEncoder, ModelArtifact, NormalizationParameters, Normalizer,
};
use emovox::features::FeatureVector;
use emovox::{Emotion, Error};
use ndarray::{Array1, ArrayView1};

use common::{mlp_model, FEATURE_DIM};

fn identity_normalizer(width: usize) -> Normalizer {
    Normalizer::new(NormalizationParameters {
        layout_version: 1,
        mean: vec![0.0; width],
        scale: vec![1.0; width],
    })
    .expect("valid parameters")
}

#[test]
fn normalization_is_the_affine_map() -> Result<()> {
    let mean: Vec<f64> = (0..FEATURE_DIM).map(|i| i as f64 * 0.5).collect();
    let scale: Vec<f64> = (0..FEATURE_DIM).map(|i| 1.0 + i as f64 / 10.0).collect();
    let raw: Vec<f64> = (0..FEATURE_DIM).map(|i| (i as f64).sin() * 4.0).collect();
    let normalizer = Normalizer::new(NormalizationParameters {
        layout_version: 1,
        mean: mean.clone(),
        scale: scale.clone(),
    })
    .map_err(anyhow::Error::msg)?;

    let normalized = normalizer.normalize(&FeatureVector::from_values(raw.clone()))?;
    for (i, value) in normalized.view().iter().enumerate() {
        assert_eq!(*value, (raw[i] - mean[i]) / scale[i]);
    }
    Ok(())
}

#[test]
fn normalizer_rejects_192_dimensions() {
    let err = identity_normalizer(FEATURE_DIM)
        .normalize(&FeatureVector::from_values(vec![0.0; 192]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 193,
            actual: 192
        }
    ));
}

#[test]
fn classifier_always_returns_a_known_label() -> Result<()> {
    let model = serde_json::from_value::<ModelArtifact>(mlp_model(8))?
        .build()
        .map_err(anyhow::Error::msg)?;
    let classifier = Classifier::new(model, LabelEncoder::sorted());
    let normalizer = identity_normalizer(FEATURE_DIM);

    for seed in 0..25 {
        let raw: Vec<f64> = (0..FEATURE_DIM)
            .map(|i| (((i * 37 + seed * 101) % 89) as f64 - 44.0) / 7.0)
            .collect();
        let normalized = normalizer.normalize(&FeatureVector::from_values(raw))?;
        let prediction = classifier.classify(&normalized)?;
        assert!(Emotion::ALL.contains(&prediction.emotion));
        assert_eq!(
            LabelEncoder::sorted().decode(prediction.class_index)?,
            prediction.emotion
        );
    }
    Ok(())
}

#[derive(Debug)]
struct OutOfRangeModel;

impl EmotionModel for OutOfRangeModel {
    fn input_dim(&self) -> usize {
        FEATURE_DIM
    }

    fn class_count(&self) -> usize {
        9
    }

    fn decision(&self, _input: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut scores = Array1::zeros(9);
        scores[8] = 1.0;
        scores
    }
}

#[test]
fn index_beyond_encoder_is_unknown_class() -> Result<()> {
    let classifier = Classifier::new(Box::new(OutOfRangeModel), LabelEncoder::sorted());
    let normalized =
        identity_normalizer(FEATURE_DIM).normalize(&FeatureVector::from_values(vec![0.0; 193]))?;
    let err = classifier.classify(&normalized).unwrap_err();
    assert!(matches!(err, Error::UnknownClass { index: 8, known: 8 }));
    Ok(())
}

#[test]
fn linear_artifact_scores_by_class_rows() -> Result<()> {
    let mut weights = vec![vec![0.0; FEATURE_DIM]; 8];
    weights[3][0] = 1.0;
    let artifact = serde_json::json!({
        "kind": "linear",
        "weights": weights,
        "bias": vec![0.0; 8],
    });
    let model = serde_json::from_value::<ModelArtifact>(artifact)?
        .build()
        .map_err(anyhow::Error::msg)?;
    let classifier = Classifier::new(model, LabelEncoder::sorted());
    let mut raw = vec![0.0; FEATURE_DIM];
    raw[0] = 2.0;
    let prediction = classifier
        .classify(&identity_normalizer(FEATURE_DIM).normalize(&FeatureVector::from_values(raw))?)?;
    assert_eq!(prediction.emotion, Emotion::Fearful);
    Ok(())
}
