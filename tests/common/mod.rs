#![allow(dead_code)]

use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde_json::json;

pub const SAMPLE_RATE: u32 = 44_100;
pub const FEATURE_DIM: usize = 193;

pub fn sine_wave(frequency: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let total = (sample_rate as f32 * seconds) as usize;
    (0..total)
        .map(|n| 0.5 * (2.0 * PI * frequency * n as f32 / sample_rate as f32).sin())
        .collect()
}

/// Mono 16-bit WAV, the same format the recorder writes.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    write_interleaved(path, samples, 1, sample_rate)
}

pub fn write_interleaved(
    path: &Path,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Small MLP with deterministic weights over the full feature width.
pub fn mlp_model(classes: usize) -> serde_json::Value {
    let hidden = 16;
    let first: Vec<Vec<f64>> = (0..FEATURE_DIM)
        .map(|i| {
            (0..hidden)
                .map(|j| (((i * 31 + j * 17) % 23) as f64 - 11.0) / 50.0)
                .collect()
        })
        .collect();
    let second: Vec<Vec<f64>> = (0..hidden)
        .map(|j| {
            (0..classes)
                .map(|c| (((j * 7 + c * 13) % 19) as f64 - 9.0) / 20.0)
                .collect()
        })
        .collect();
    json!({
        "kind": "mlp",
        "activation": "relu",
        "layers": [
            {"weights": first, "bias": vec![0.01; hidden]},
            {"weights": second, "bias": vec![0.0; classes]},
        ]
    })
}

pub fn sorted_labels() -> serde_json::Value {
    json!({"classes": ["angry", "calm", "disgust", "fearful", "happy", "neutral", "sad", "surprised"]})
}

pub fn unit_scaler(width: usize) -> serde_json::Value {
    json!({"layout_version": 1, "mean": vec![0.0; width], "scale": vec![1.0; width]})
}

/// Write a complete, consistent artifact set into `dir`.
pub fn write_artifacts(dir: &Path) -> Result<()> {
    write_json(&dir.join("model.json"), &mlp_model(8))?;
    write_json(&dir.join("labels.json"), &sorted_labels())?;
    write_json(&dir.join("scaler.json"), &unit_scaler(FEATURE_DIM))?;
    Ok(())
}

pub fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}
