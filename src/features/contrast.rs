use std::ops::Range;

use ndarray::{Array2, Axis};

use super::cepstral::power_to_db;
use super::layout::CONTRAST_BANDS;
use crate::error::{Error, Result};

/// Lower edge of the first octave band; band `k` spans `200 * 2^(k-1)` Hz upwards.
pub(crate) const CONTRAST_MIN_FREQ: f64 = 200.0;
const QUANTILE: f64 = 0.02;

/// Lower edge of the top band; the analysis Nyquist frequency must lie above it.
pub(crate) fn top_band_floor() -> f64 {
    CONTRAST_MIN_FREQ * 2f64.powi(CONTRAST_BANDS as i32 - 2)
}

/// Peak-minus-valley contrast in dB per octave band and frame, shape `(frames, 7)`.
pub(crate) fn spectral_contrast(magnitude: &Array2<f64>, frequencies: &[f64]) -> Result<Array2<f64>> {
    let bands = band_ranges(frequencies)?;
    let frames = magnitude.len_of(Axis(0));
    let mut peak = Array2::zeros((frames, CONTRAST_BANDS));
    let mut valley = Array2::zeros((frames, CONTRAST_BANDS));

    let mut sorted = Vec::new();
    for (band, (rows, member_count)) in bands.iter().enumerate() {
        let take = ((QUANTILE * *member_count as f64).round_ties_even() as usize)
            .max(1)
            .min(rows.len());
        for (frame, spectrum) in magnitude.axis_iter(Axis(0)).enumerate() {
            sorted.clear();
            sorted.extend(spectrum.slice(ndarray::s![rows.clone()]).iter().copied());
            sorted.sort_by(f64::total_cmp);
            let low: f64 = sorted[..take].iter().sum();
            let high: f64 = sorted[sorted.len() - take..].iter().sum();
            valley[[frame, band]] = low / take as f64;
            peak[[frame, band]] = high / take as f64;
        }
    }

    Ok(power_to_db(&peak) - power_to_db(&valley))
}

/// Bin rows used for each band plus the bin count the quantile is taken over.
///
/// Every band above the first borrows the bin just below its lower edge and
/// every band below the last drops its top bin, so the bin straddling an
/// edge is analysed by the upper band only. The last band runs to Nyquist.
fn band_ranges(frequencies: &[f64]) -> Result<Vec<(Range<usize>, usize)>> {
    let mut edges = [0.0; CONTRAST_BANDS + 1];
    for (index, edge) in edges.iter_mut().enumerate().skip(1) {
        *edge = CONTRAST_MIN_FREQ * 2f64.powi(index as i32 - 1);
    }

    let mut ranges = Vec::with_capacity(CONTRAST_BANDS);
    for band in 0..CONTRAST_BANDS {
        let (low, high) = (edges[band], edges[band + 1]);
        let first = frequencies.iter().position(|&f| f >= low);
        let last = frequencies.iter().rposition(|&f| f <= high);
        let (first, last) = match (first, last) {
            (Some(first), Some(last)) if first <= last => (first, last),
            _ => {
                return Err(Error::extraction(format!(
                    "contrast band {band} ({low} Hz - {high} Hz) contains no frequency bins"
                )))
            }
        };
        let start = if band > 0 { first.saturating_sub(1) } else { first };
        let end_inclusive = if band == CONTRAST_BANDS - 1 {
            frequencies.len() - 1
        } else {
            last
        };
        let member_count = end_inclusive - start + 1;
        let stop = if band < CONTRAST_BANDS - 1 {
            end_inclusive
        } else {
            end_inclusive + 1
        };
        if stop <= start {
            return Err(Error::extraction(format!(
                "contrast band {band} is too narrow at this resolution"
            )));
        }
        ranges.push((start..stop, member_count));
    }
    Ok(ranges)
}
