use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use emovox::audio::{capture, decoder};
use emovox::cli::{ArtifactArgs, ClassifyArgs, Cli, Command, FeaturesArgs, RecordArgs};
use emovox::config::{AnalysisSettings, AppConfig};
use emovox::features::{FeatureExtractor, FEATURE_LAYOUT};
use emovox::{pipeline, EmotionContext, Prediction};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;
    match cli.command {
        Command::Classify(args) => handle_classify(&args),
        Command::Record(args) => handle_record(&args),
        Command::Features(args) => handle_features(&args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_context(args: &ArtifactArgs) -> Result<EmotionContext> {
    let config = AppConfig::from_override(args.artifacts.clone())?;
    EmotionContext::load(&config.artifacts_root).with_context(|| {
        format!(
            "failed to load classifier artifacts from {:?}",
            config.artifacts_root
        )
    })
}

fn handle_classify(args: &ClassifyArgs) -> Result<()> {
    let context = load_context(&args.artifacts)?;
    let prediction = context
        .classify_file(&args.input)
        .with_context(|| format!("failed to classify {:?}", args.input))?;
    report(&prediction, args.json)
}

fn handle_record(args: &RecordArgs) -> Result<()> {
    // Load artifacts first so a bad setup fails before the user starts talking.
    let context = load_context(&args.artifacts)?;
    let config = capture::CaptureConfig::new(args.duration)?
        .with_device(args.device.clone())
        .with_sample_rate(args.sample_rate)?;
    let path = capture::record_to_file(&config, args.output.as_deref())
        .context("failed to record from the input device")?;
    info!(path = %path.display(), "classifying recording");
    let prediction = context
        .classify_file(&path)
        .with_context(|| format!("failed to classify recording {:?}", path))?;
    report(&prediction, args.json)
}

fn handle_features(args: &FeaturesArgs) -> Result<()> {
    let settings = resolve_settings(&args.artifacts)?;
    let extractor = FeatureExtractor::new(settings)?;
    let waveform = decoder::load_waveform(&args.input, settings.sample_rate)
        .with_context(|| format!("failed to load {:?}", args.input))?;
    let features = extractor
        .extract(&waveform)
        .with_context(|| format!("failed to extract features from {:?}", args.input))?;
    let output = serde_json::json!({
        "layout_version": FEATURE_LAYOUT.version,
        "values": features.as_slice(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Analysis settings from the artifacts directory `classify` would use.
///
/// An explicit directory must resolve; without one, failing discovery falls
/// back to the default settings.
fn resolve_settings(args: &ArtifactArgs) -> Result<AnalysisSettings> {
    match AppConfig::from_override(args.artifacts.clone()) {
        Ok(config) => Ok(pipeline::load_settings(&config.artifacts_root)?),
        Err(err) if args.artifacts.is_none() => {
            debug!(reason = %err, "no artifacts directory found, using default analysis settings");
            Ok(AnalysisSettings::default())
        }
        Err(err) => Err(err),
    }
}

fn report(prediction: &Prediction, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(prediction)?);
    } else {
        println!("{}", prediction.emotion);
    }
    Ok(())
}
