use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::audio::capture::{DEFAULT_CAPTURE_RATE, DEFAULT_RECORD_SECONDS};
use crate::config::ENV_ARTIFACTS;

#[derive(Parser, Debug)]
#[command(
    name = "emovox",
    version,
    about = "Classify the emotion expressed in a short speech clip"
)]
pub struct Cli {
    /// Default log filter; RUST_LOG takes precedence when set.
    #[arg(long = "log-level", global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify an audio file.
    Classify(ClassifyArgs),
    /// Record from the microphone, then classify the recording.
    Record(RecordArgs),
    /// Print the raw feature vector of an audio file as JSON.
    Features(FeaturesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    /// Directory holding model.json, labels.json and scaler.json.
    #[arg(long, env = ENV_ARTIFACTS)]
    pub artifacts: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Input audio file (WAV, FLAC, MP3, OGG, ...).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    #[command(flatten)]
    pub artifacts: ArtifactArgs,
    /// Print the full prediction as JSON instead of the bare label.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// Recording length in seconds (5-20).
    #[arg(long, default_value_t = DEFAULT_RECORD_SECONDS)]
    pub duration: u64,
    /// Optional input device name.
    #[arg(long)]
    pub device: Option<String>,
    /// Where to keep the recording; a temporary file otherwise.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Sample rate the recording is written at.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_RATE)]
    pub sample_rate: u32,
    #[command(flatten)]
    pub artifacts: ArtifactArgs,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FeaturesArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    #[command(flatten)]
    pub artifacts: ArtifactArgs,
}
