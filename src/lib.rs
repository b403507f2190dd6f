//! Speech emotion classification: decode a clip, summarize it as a fixed
//! 193-value acoustic descriptor, and map that descriptor to one of eight
//! emotion labels with a pre-trained model.

pub mod audio;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod types;

pub use error::{Error, Result};
pub use pipeline::EmotionContext;
pub use types::{ClassProbability, Emotion, Prediction, Waveform};
