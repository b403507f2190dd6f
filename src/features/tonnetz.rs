use std::f64::consts::PI;

use ndarray::Array2;

use super::layout::{CHROMA_BINS, TONAL_DIMENSIONS};
use super::statistics::{normalize_rows, RowNorm};

/// Projection of 12 pitch classes onto the tonal centroid space, shape `(6, 12)`.
///
/// Rows come in (sin, cos) pairs for the circle of fifths, the circle of
/// minor thirds and the circle of major thirds.
pub(crate) fn tonal_basis() -> Array2<f64> {
    const INTERVALS: [f64; 3] = [7.0 / 6.0, 3.0 / 2.0, 2.0 / 3.0];
    const RADII: [f64; 3] = [1.0, 1.0, 0.5];

    Array2::from_shape_fn((TONAL_DIMENSIONS, CHROMA_BINS), |(row, class)| {
        let circle = row / 2;
        let mut angle = INTERVALS[circle] * class as f64;
        if row % 2 == 0 {
            angle -= 0.5;
        }
        RADII[circle] * (PI * angle).cos()
    })
}

/// Tonal centroid per frame from a chroma matrix (frames x 12).
pub(crate) fn tonal_centroid(chroma: &Array2<f64>) -> Array2<f64> {
    let weights = normalize_rows(chroma, RowNorm::L1);
    weights.dot(&tonal_basis().t())
}
