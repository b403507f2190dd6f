use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::Array2;

use crate::config::AnalysisSettings;
use crate::error::{Error, Result};
use crate::features::layout::MEL_BANDS;

const MEL_MIN_FREQ: f64 = 0.0;

/// Short-time spectra shared by every sub-analysis, frames along axis 0.
pub(crate) struct SpectrogramBundle {
    pub magnitude: Array2<f64>,
    pub power: Array2<f64>,
    pub mel: Array2<f64>,
    /// Centre frequency in Hz of each bin along axis 1.
    pub frequencies: Vec<f64>,
}

impl SpectrogramBundle {
    pub fn frame_count(&self) -> usize {
        self.magnitude.nrows()
    }
}

pub(crate) fn compute_spectrograms(
    samples: &[f32],
    settings: &AnalysisSettings,
) -> Result<SpectrogramBundle> {
    let audio = centered(samples, settings.n_fft / 2);

    let stft = spectrum::rstft(
        &audio,
        settings.n_fft,
        settings.hop_length,
        WindowType::Hanning,
    );
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(settings.n_fft, settings.sample_rate);
    let filterbank = MelFilterbank::new(
        MEL_MIN_FREQ,
        settings.nyquist(),
        MEL_BANDS,
        &freqs,
        true,
    );
    let mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);

    let magnitude = array_from_vec2(&magnitude, "magnitude")?;
    let power = array_from_vec2(&power, "power")?;
    let mel = array_from_vec2(&mel, "mel")?;
    if magnitude.nrows() == 0 {
        return Err(Error::extraction("short-time transform produced no frames"));
    }
    if mel.ncols() != MEL_BANDS {
        return Err(Error::extraction(format!(
            "mel spectrogram has {} bands, expected {}",
            mel.ncols(),
            MEL_BANDS
        )));
    }
    let frequencies = bin_frequencies(magnitude.ncols(), settings);

    Ok(SpectrogramBundle {
        magnitude,
        power,
        mel,
        frequencies,
    })
}

/// Zero-pad both ends so frame `t` is centred on sample `t * hop_length`.
fn centered(samples: &[f32], pad: usize) -> Vec<f64> {
    let mut audio = Vec::with_capacity(samples.len() + 2 * pad);
    audio.resize(pad, 0.0);
    audio.extend(samples.iter().map(|&s| s as f64));
    audio.resize(audio.len() + pad, 0.0);
    audio
}

pub(crate) fn bin_frequencies(bins: usize, settings: &AnalysisSettings) -> Vec<f64> {
    let resolution = settings.sample_rate as f64 / settings.n_fft as f64;
    (0..bins).map(|k| k as f64 * resolution).collect()
}

fn array_from_vec2(data: &[Vec<f64>], label: &str) -> Result<Array2<f64>> {
    let rows = data.len();
    let cols = data.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(rows * cols);
    for row in data {
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows, cols), flat)
        .map_err(|err| Error::extraction(format!("ragged {label} spectrogram ({err})")))
}
