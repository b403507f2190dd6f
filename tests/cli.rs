mod common;

use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;

use common::{sine_wave, write_artifacts, write_json, write_wav};

#[test]
fn classify_prints_a_label() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_artifacts(dir.path())?;
    let clip = dir.path().join("clip.wav");
    write_wav(&clip, &sine_wave(180.0, 1.0, 44_100), 44_100)?;

    Command::cargo_bin("emovox")?
        .env_remove("EMOVOX_ARTIFACTS")
        .arg("classify")
        .arg(&clip)
        .arg("--artifacts")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            "^(neutral|calm|happy|sad|angry|fearful|disgust|surprised)\n$",
        )?);
    Ok(())
}

#[test]
fn classify_reports_undecodable_input() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_artifacts(dir.path())?;
    let bogus = dir.path().join("bogus.wav");
    fs::write(&bogus, "plain text")?;

    Command::cargo_bin("emovox")?
        .arg("classify")
        .arg(&bogus)
        .arg("--artifacts")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load audio"));
    Ok(())
}

#[test]
fn features_prints_layout_and_values() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let clip = dir.path().join("clip.wav");
    write_wav(&clip, &sine_wave(440.0, 0.5, 44_100), 44_100)?;

    let output = Command::cargo_bin("emovox")?
        .arg("features")
        .arg(&clip)
        .output()?;
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(parsed["layout_version"], 1);
    assert_eq!(parsed["values"].as_array().map(Vec::len), Some(193));
    Ok(())
}

fn features_json(cwd: &Path, clip: &Path, artifacts: Option<&Path>) -> Result<serde_json::Value> {
    let mut command = Command::cargo_bin("emovox")?;
    command
        .env_remove("EMOVOX_ARTIFACTS")
        .current_dir(cwd)
        .arg("features")
        .arg(clip);
    if let Some(dir) = artifacts {
        command.arg("--artifacts").arg(dir);
    }
    let output = command.output()?;
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn features_uses_discovered_artifacts_settings() -> Result<()> {
    let project = tempfile::tempdir()?;
    let artifacts = project.path().join("artifacts");
    fs::create_dir(&artifacts)?;
    write_artifacts(&artifacts)?;
    write_json(
        &artifacts.join("analysis.json"),
        &serde_json::json!({"sample_rate": 32000}),
    )?;
    let bare = tempfile::tempdir()?;
    let clip = bare.path().join("clip.wav");
    write_wav(&clip, &sine_wave(440.0, 0.5, 44_100), 44_100)?;

    let discovered = features_json(project.path(), &clip, None)?;
    let explicit = features_json(bare.path(), &clip, Some(&artifacts))?;
    let defaults = features_json(bare.path(), &clip, None)?;
    assert_eq!(discovered, explicit);
    assert_ne!(discovered["values"], defaults["values"]);
    Ok(())
}

#[test]
fn features_rejects_invalid_discovered_settings() -> Result<()> {
    let project = tempfile::tempdir()?;
    let artifacts = project.path().join("artifacts");
    fs::create_dir(&artifacts)?;
    write_json(
        &artifacts.join("analysis.json"),
        &serde_json::json!({"sample_rate": 8000}),
    )?;
    let clip = project.path().join("clip.wav");
    write_wav(&clip, &sine_wave(440.0, 0.5, 44_100), 44_100)?;

    Command::cargo_bin("emovox")?
        .env_remove("EMOVOX_ARTIFACTS")
        .current_dir(project.path())
        .arg("features")
        .arg(&clip)
        .assert()
        .failure()
        .stderr(predicate::str::contains("8000 Hz"));
    Ok(())
}

#[test]
fn record_rejects_zero_sample_rate() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_artifacts(dir.path())?;
    Command::cargo_bin("emovox")?
        .args(["record", "--sample-rate", "0", "--artifacts"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("sample rate must be positive"));
    Ok(())
}

#[test]
fn record_rejects_out_of_range_duration() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_artifacts(dir.path())?;
    Command::cargo_bin("emovox")?
        .args(["record", "--duration", "3", "--artifacts"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 5 and 20 seconds"));
    Ok(())
}
