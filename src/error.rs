use std::path::PathBuf;

/// Convenient alias for results returned by the classification pipeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by a single classification request.
///
/// None of these are fatal to the process: a failed request leaves the
/// shared context untouched and the next request can proceed.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to load audio from {source_name}: {reason}")]
    Load { source_name: String, reason: String },

    #[error("feature extraction failed: {0}")]
    FeatureExtraction(String),

    #[error("feature vector has {actual} dimensions but normalization expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("model predicted class index {index} but the label encoder knows {known} classes")]
    UnknownClass { index: usize, known: usize },

    #[error("invalid artifact {path:?}: {reason}")]
    Artifact { path: PathBuf, reason: String },

    #[error("audio capture failed: {0}")]
    Capture(String),
}

impl Error {
    pub(crate) fn load(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn extraction(reason: impl Into<String>) -> Self {
        Self::FeatureExtraction(reason.into())
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Artifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn capture(reason: impl ToString) -> Self {
        Self::Capture(reason.to_string())
    }
}
