use std::f64::consts::PI;

use ndarray::{Array2, Axis};

const AMIN: f64 = 1e-10;
const TOP_DB: f64 = 80.0;

/// Convert a power matrix to decibels relative to 1.0.
///
/// Values are floored at `AMIN` before the log and clipped to `TOP_DB`
/// below the loudest cell, so silence maps to a finite floor.
pub(crate) fn power_to_db(power: &Array2<f64>) -> Array2<f64> {
    let db = power.mapv(|p| 10.0 * p.max(AMIN).log10());
    let peak = db.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !peak.is_finite() {
        return db;
    }
    let floor = peak - TOP_DB;
    db.mapv(|v| v.max(floor))
}

/// Cepstral coefficients per frame from a mel power spectrogram.
pub(crate) fn mfcc(mel: &Array2<f64>, coefficients: usize) -> Array2<f64> {
    let log_mel = power_to_db(mel);
    let bands = log_mel.len_of(Axis(1));
    let basis = dct_basis(coefficients, bands);
    log_mel.dot(&basis.t())
}

/// Orthonormal DCT-II basis, one row per output coefficient.
fn dct_basis(coefficients: usize, inputs: usize) -> Array2<f64> {
    let n = inputs as f64;
    Array2::from_shape_fn((coefficients, inputs), |(k, i)| {
        let scale = if k == 0 {
            (1.0 / n).sqrt()
        } else {
            (2.0 / n).sqrt()
        };
        scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()
    })
}
