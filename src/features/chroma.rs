use ndarray::Array2;

use super::layout::CHROMA_BINS;
use super::statistics::{normalize_rows, RowNorm};

/// A4 divided down to octave 0, the reference for octave numbering.
const OCTAVE_ZERO_HZ: f64 = 440.0 / 16.0;
const CENTER_OCTAVE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;

/// Pitch-class weights for each FFT bin, shape `(12, bins)`, row 0 = C.
///
/// Every bin spreads its energy over nearby pitch classes with a Gaussian
/// whose width follows the bin spacing in semitones, so low bins (coarse
/// in pitch) smear across several classes while high bins stay sharp.
pub(crate) fn chroma_filterbank(sample_rate: u32, n_fft: usize, bins: usize) -> Array2<f64> {
    let n_chroma = CHROMA_BINS as f64;
    let resolution = sample_rate as f64 / n_fft as f64;

    // fractional pitch-class position of each bin (A = 0), one extra for widths
    let mut positions = Vec::with_capacity(bins + 1);
    for k in 0..=bins {
        positions.push(n_chroma * (k as f64 * resolution / OCTAVE_ZERO_HZ).log2());
    }
    if positions.len() > 1 {
        positions[0] = positions[1] - 1.5 * n_chroma;
    }
    let widths: Vec<f64> = positions
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).max(1.0))
        .collect();

    let mut weights = Array2::zeros((CHROMA_BINS, bins));
    for k in 0..bins {
        let half = n_chroma / 2.0;
        for class in 0..CHROMA_BINS {
            let offset = (positions[k] - class as f64 + half + 10.0 * n_chroma).rem_euclid(n_chroma)
                - half;
            let z = 2.0 * offset / widths[k];
            weights[[class, k]] = (-0.5 * z * z).exp();
        }
        let norm = weights.column(k).iter().map(|w| w * w).sum::<f64>().sqrt();
        let octave = positions[k] / n_chroma;
        let octave_weight = (-0.5 * ((octave - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
        for class in 0..CHROMA_BINS {
            let value = if norm > 0.0 {
                weights[[class, k]] / norm
            } else {
                0.0
            };
            weights[[class, k]] = value * octave_weight;
        }
    }

    // rows are A-based; rotate so row 0 is C
    let mut rotated = Array2::zeros((CHROMA_BINS, bins));
    for class in 0..CHROMA_BINS {
        rotated
            .row_mut(class)
            .assign(&weights.row((class + 3) % CHROMA_BINS));
    }
    rotated
}

/// Per-frame chroma from a power spectrogram, each frame scaled to peak 1.
pub(crate) fn chroma_from_power(power: &Array2<f64>, filterbank: &Array2<f64>) -> Array2<f64> {
    let raw = power.dot(&filterbank.t());
    normalize_rows(&raw, RowNorm::Max)
}
