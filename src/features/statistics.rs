use ndarray::{Array1, Array2, Axis};

/// Below this a frame is treated as silent and left untouched by normalization.
const TINY: f64 = f64::MIN_POSITIVE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowNorm {
    /// Divide by the largest absolute value.
    Max,
    /// Divide by the sum of absolute values.
    L1,
}

pub(crate) fn normalize_rows(input: &Array2<f64>, norm: RowNorm) -> Array2<f64> {
    let mut output = input.clone();
    for mut row in output.axis_iter_mut(Axis(0)) {
        let length = match norm {
            RowNorm::Max => row.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())),
            RowNorm::L1 => row.iter().map(|v| v.abs()).sum(),
        };
        if length >= TINY {
            row.mapv_inplace(|v| v / length);
        }
    }
    output
}

/// Mean of every column across frames.
pub(crate) fn time_average(frames: &Array2<f64>) -> Array1<f64> {
    frames
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(frames.ncols()))
}
