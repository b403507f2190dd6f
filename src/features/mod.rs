mod cepstral;
mod chroma;
mod contrast;
mod harmonic;
pub mod layout;
mod spectrum;
mod statistics;
mod tonnetz;

use ndarray::Array2;
use tracing::debug;

pub use layout::{FeatureBlock, FeatureLayout, FeatureVector, FEATURE_DIM, FEATURE_LAYOUT};

use crate::config::AnalysisSettings;
use crate::error::{Error, Result};
use crate::types::Waveform;
use layout::CEPSTRAL_COEFFICIENTS;
use statistics::time_average;

/// Lowest frequency the top spectral contrast band needs below Nyquist.
pub(crate) fn contrast_floor_hz() -> f64 {
    contrast::top_band_floor()
}

/// Turns a waveform into the fixed 193-value descriptor the classifier expects.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    settings: AnalysisSettings,
    chroma_filterbank: Array2<f64>,
}

impl FeatureExtractor {
    pub fn new(settings: AnalysisSettings) -> Result<Self> {
        settings.validate()?;
        let bins = settings.n_fft / 2 + 1;
        let chroma_filterbank =
            chroma::chroma_filterbank(settings.sample_rate, settings.n_fft, bins);
        Ok(Self {
            settings,
            chroma_filterbank,
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Fewest samples that still yield one full analysis frame.
    pub fn min_samples(&self) -> usize {
        self.settings.n_fft
    }

    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureVector> {
        if waveform.sample_rate() != self.settings.sample_rate {
            return Err(Error::extraction(format!(
                "waveform is sampled at {} Hz but analysis runs at {} Hz",
                waveform.sample_rate(),
                self.settings.sample_rate
            )));
        }
        if waveform.len() < self.min_samples() {
            return Err(Error::extraction(format!(
                "waveform has {} samples, at least {} are needed for one analysis frame",
                waveform.len(),
                self.min_samples()
            )));
        }

        let spectra = spectrum::compute_spectrograms(waveform.samples(), &self.settings)?;
        if spectra.magnitude.ncols() != self.chroma_filterbank.ncols() {
            return Err(Error::extraction(format!(
                "spectrum has {} bins, expected {}",
                spectra.magnitude.ncols(),
                self.chroma_filterbank.ncols()
            )));
        }
        debug!(
            frames = spectra.frame_count(),
            bins = spectra.magnitude.ncols(),
            "computed spectrograms"
        );

        let cepstral = cepstral::mfcc(&spectra.mel, CEPSTRAL_COEFFICIENTS);
        let chroma = chroma::chroma_from_power(&spectra.power, &self.chroma_filterbank);
        let contrast = contrast::spectral_contrast(&spectra.magnitude, &spectra.frequencies)?;

        let harmonic = harmonic::harmonic_magnitude(&spectra.magnitude);
        let harmonic_chroma =
            chroma::chroma_from_power(&harmonic.mapv(|m| m * m), &self.chroma_filterbank);
        let tonal = tonnetz::tonal_centroid(&harmonic_chroma);

        FeatureVector::from_blocks([
            time_average(&cepstral),
            time_average(&chroma),
            time_average(&spectra.mel),
            time_average(&contrast),
            time_average(&tonal),
        ])
    }
}
