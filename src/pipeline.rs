//! Classification context shared by every request.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::audio::decoder;
use crate::classifier::{
    Classifier, EmotionModel, LabelEncoder, ModelArtifact, NormalizationParameters, Normalizer,
};
use crate::config::AnalysisSettings;
use crate::error::{Error, Result};
use crate::features::{FeatureExtractor, FeatureVector, FEATURE_DIM, FEATURE_LAYOUT};
use crate::types::{Prediction, Waveform};

pub const MODEL_FILE: &str = "model.json";
pub const LABELS_FILE: &str = "labels.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const ANALYSIS_FILE: &str = "analysis.json";

/// Loaded artifacts plus the extractor configured to match them.
///
/// Immutable once built; share it behind an `Arc` to classify from several
/// threads at once.
#[derive(Debug)]
pub struct EmotionContext {
    extractor: FeatureExtractor,
    normalizer: Normalizer,
    classifier: Classifier,
}

impl EmotionContext {
    /// Read `model.json`, `labels.json`, `scaler.json` and the optional
    /// `analysis.json` from `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let settings = load_settings(dir)?;

        let scaler_path = dir.join(SCALER_FILE);
        let params: NormalizationParameters = read_artifact(&scaler_path)?;

        let model_path = dir.join(MODEL_FILE);
        let model = read_artifact::<ModelArtifact>(&model_path)?
            .build()
            .map_err(|reason| Error::artifact(&model_path, reason))?;

        let labels_path = dir.join(LABELS_FILE);
        let encoder: LabelEncoder = read_artifact(&labels_path)?;

        let context = Self::assemble(settings, params, model, encoder).map_err(|err| match err {
            Error::Artifact { path, reason } if path.is_relative() => {
                Error::artifact(dir.join(path), reason)
            }
            other => other,
        })?;
        info!(
            artifacts = %dir.display(),
            classes = context.classifier.encoder().len(),
            sample_rate = settings.sample_rate,
            "loaded classification context"
        );
        Ok(context)
    }

    /// Build a context from artifacts already in memory.
    pub fn new(
        settings: AnalysisSettings,
        params: NormalizationParameters,
        model: Box<dyn EmotionModel>,
        encoder: LabelEncoder,
    ) -> Result<Self> {
        Self::assemble(settings, params, model, encoder)
    }

    fn assemble(
        settings: AnalysisSettings,
        params: NormalizationParameters,
        model: Box<dyn EmotionModel>,
        encoder: LabelEncoder,
    ) -> Result<Self> {
        let extractor =
            FeatureExtractor::new(settings).map_err(|err| Error::artifact(ANALYSIS_FILE, err))?;

        if params.layout_version != FEATURE_LAYOUT.version {
            return Err(Error::artifact(
                SCALER_FILE,
                format!(
                    "fitted against feature layout v{}, extractor produces v{}",
                    params.layout_version, FEATURE_LAYOUT.version
                ),
            ));
        }
        if params.dimensions() != FEATURE_DIM {
            return Err(Error::artifact(
                SCALER_FILE,
                format!(
                    "has {} dimensions, feature layout has {}",
                    params.dimensions(),
                    FEATURE_DIM
                ),
            ));
        }
        let normalizer =
            Normalizer::new(params).map_err(|reason| Error::artifact(SCALER_FILE, reason))?;

        if model.input_dim() != FEATURE_DIM {
            return Err(Error::artifact(
                MODEL_FILE,
                format!(
                    "expects {} inputs, feature layout has {}",
                    model.input_dim(),
                    FEATURE_DIM
                ),
            ));
        }
        if model.class_count() > encoder.len() {
            return Err(Error::artifact(
                LABELS_FILE,
                format!(
                    "names {} classes but the model scores {}",
                    encoder.len(),
                    model.class_count()
                ),
            ));
        }

        Ok(Self {
            extractor,
            normalizer,
            classifier: Classifier::new(model, encoder),
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        self.extractor.settings()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn classify_file<P: AsRef<Path>>(&self, path: P) -> Result<Prediction> {
        let waveform = decoder::load_waveform(path, self.settings().sample_rate)?;
        self.classify_waveform(&waveform)
    }

    pub fn classify_bytes(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<Prediction> {
        let waveform =
            decoder::load_waveform_from_bytes(bytes, extension, self.settings().sample_rate)?;
        self.classify_waveform(&waveform)
    }

    pub fn classify_waveform(&self, waveform: &Waveform) -> Result<Prediction> {
        let features = self.extractor.extract(waveform)?;
        let normalized = self.normalizer.normalize(&features)?;
        let prediction = self.classifier.classify(&normalized)?;
        info!(
            emotion = %prediction.emotion,
            seconds = waveform.duration().as_secs_f64(),
            "classified clip"
        );
        Ok(prediction)
    }

    /// Feature vector for a file, before normalization.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<FeatureVector> {
        let waveform = decoder::load_waveform(path, self.settings().sample_rate)?;
        self.extractor.extract(&waveform)
    }
}

/// Analysis settings from `analysis.json` in `dir`, or the defaults when absent.
pub fn load_settings(dir: &Path) -> Result<AnalysisSettings> {
    let path = dir.join(ANALYSIS_FILE);
    if path.is_file() {
        read_artifact(&path)
    } else {
        Ok(AnalysisSettings::default())
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|err| Error::artifact(path, err))?;
    debug!(path = %path.display(), bytes = raw.len(), "read artifact");
    serde_json::from_str(&raw).map_err(|err| Error::artifact(path, err))
}
