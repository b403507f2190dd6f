//! Core types shared across the emotion classification pipeline

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mono audio ready for analysis.
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Audio samples, normalized to [-1.0, 1.0]
    samples: Arc<[f32]>,
    /// Sample rate in Hz (e.g., 44100)
    sample_rate: u32,
}

impl Waveform {
    /// Builds a waveform, rejecting empty buffers and a zero sample rate.
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Result<Self> {
        let samples = samples.into();
        if samples.is_empty() {
            return Err(Error::load("waveform", "audio contains no samples"));
        }
        if sample_rate == 0 {
            return Err(Error::load("waveform", "sample rate must be positive"));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// The closed set of emotions the classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Calm,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgust,
    Surprised,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Neutral,
        Emotion::Calm,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgust,
        Emotion::Surprised,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Calm => "calm",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgust => "disgust",
            Emotion::Surprised => "surprised",
        }
    }
}

impl Display for Emotion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the eight known labels.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown emotion label '{0}'")]
pub struct UnknownLabel(pub String);

impl FromStr for Emotion {
    type Err = UnknownLabel;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|emotion| emotion.as_str() == raw)
            .ok_or_else(|| UnknownLabel(raw.to_string()))
    }
}

/// Outcome of one classification request.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub emotion: Emotion,
    pub class_index: usize,
    /// Softmax of the model's decision scores, one entry per encoder class.
    pub probabilities: Vec<ClassProbability>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassProbability {
    pub emotion: Emotion,
    pub probability: f64,
}
