use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::layout::MEL_BANDS;

/// Directory searched for beside the executable when no override is given.
pub const ARTIFACTS_DIR_NAME: &str = "artifacts";
pub const ENV_ARTIFACTS: &str = "EMOVOX_ARTIFACTS";

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_N_FFT: usize = 2048;
pub const DEFAULT_HOP_LENGTH: usize = 512;

/// Process-level settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub artifacts_root: PathBuf,
}

impl AppConfig {
    pub fn from_override(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let root = match path {
            Some(custom) => canonicalize_dir(&custom)?,
            None => default_artifacts_root()?,
        };
        Ok(Self {
            artifacts_root: root,
        })
    }
}

fn canonicalize_dir(path: &Path) -> anyhow::Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("failed to resolve artifacts directory at {:?}", path))?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(anyhow!("artifacts path {:?} is not a directory", canonical))
    }
}

fn default_artifacts_root() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("unable to resolve current executable path")?;
    let cwd = std::env::current_dir().ok();
    exe.ancestors()
        .chain(cwd.iter().map(PathBuf::as_path))
        .find_map(|dir| {
            let candidate = dir.join(ARTIFACTS_DIR_NAME);
            candidate.is_dir().then_some(candidate)
        })
        .ok_or_else(|| {
            anyhow!(
                "could not locate an '{}' directory; pass --artifacts or set {}",
                ARTIFACTS_DIR_NAME,
                ENV_ARTIFACTS
            )
        })
}

/// Short-time analysis parameters the normalizer and model were fitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Rate every waveform is resampled to at load time, in Hz.
    pub sample_rate: u32,
    pub n_fft: usize,
    pub hop_length: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            n_fft: DEFAULT_N_FFT,
            hop_length: DEFAULT_HOP_LENGTH,
        }
    }
}

impl AnalysisSettings {
    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::extraction("sample rate must be positive"));
        }
        if self.hop_length == 0 {
            return Err(Error::extraction("hop length must be positive"));
        }
        if self.n_fft < 2 * MEL_BANDS {
            return Err(Error::extraction(format!(
                "FFT size {} is too small for {} mel bands",
                self.n_fft, MEL_BANDS
            )));
        }
        let floor = crate::features::contrast_floor_hz();
        if self.nyquist() <= floor {
            return Err(Error::extraction(format!(
                "sample rate {} Hz leaves no room for the top contrast band above {} Hz",
                self.sample_rate, floor
            )));
        }
        Ok(())
    }
}
