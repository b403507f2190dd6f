use ndarray::{Array2, ArrayView1, Axis};

/// Median window length, in frames for the harmonic estimate and in bins
/// for the percussive one.
pub(crate) const KERNEL_SIZE: usize = 31;
const MASK_POWER: i32 = 2;

/// Harmonic part of a magnitude spectrogram (frames x bins).
///
/// Sustained partials are smooth along time while transients are smooth
/// along frequency; median filtering each way gives the two estimates, and
/// a Wiener-style soft mask keeps the share of each cell that looks
/// harmonic. Cells where both estimates are zero are dropped.
pub(crate) fn harmonic_magnitude(magnitude: &Array2<f64>) -> Array2<f64> {
    let harmonic = median_filter(magnitude, Axis(0), KERNEL_SIZE);
    let percussive = median_filter(magnitude, Axis(1), KERNEL_SIZE);

    let mut output = magnitude.clone();
    ndarray::Zip::from(&mut output)
        .and(&harmonic)
        .and(&percussive)
        .for_each(|cell, &h, &p| *cell *= soft_mask(h, p));
    output
}

fn soft_mask(keep: f64, other: f64) -> f64 {
    let largest = keep.max(other);
    if largest < f64::MIN_POSITIVE {
        return 0.0;
    }
    let keep = (keep / largest).powi(MASK_POWER);
    let other = (other / largest).powi(MASK_POWER);
    keep / (keep + other)
}

/// Running median along `axis` with mirrored edges (`d c b a | a b c d`).
fn median_filter(input: &Array2<f64>, axis: Axis, size: usize) -> Array2<f64> {
    let mut output = Array2::zeros(input.raw_dim());
    let mut window = Vec::with_capacity(size);
    for (lane_in, mut lane_out) in input.lanes(axis).into_iter().zip(output.lanes_mut(axis)) {
        for (index, value) in lane_out.iter_mut().enumerate() {
            fill_window(&lane_in, index, size, &mut window);
            let mid = window.len() / 2;
            let (_, median, _) = window.select_nth_unstable_by(mid, f64::total_cmp);
            *value = *median;
        }
    }
    output
}

fn fill_window(lane: &ArrayView1<'_, f64>, center: usize, size: usize, window: &mut Vec<f64>) {
    window.clear();
    let len = lane.len() as isize;
    let radius = (size / 2) as isize;
    for offset in -radius..=radius {
        let position = reflect(center as isize + offset, len);
        window.push(lane[position]);
    }
}

fn reflect(index: isize, len: isize) -> usize {
    let period = 2 * len;
    let wrapped = index.rem_euclid(period);
    let folded = if wrapped >= len {
        period - 1 - wrapped
    } else {
        wrapped
    };
    folded as usize
}

#[cfg(test)]
mod tests {
    use super::{harmonic_magnitude, median_filter, reflect, soft_mask};
    use ndarray::{array, Array2, Axis};

    #[test]
    fn reflection_mirrors_edges() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(-5, 2), 1);
    }

    #[test]
    fn median_removes_isolated_spike() {
        let input = array![[0.0], [0.0], [9.0], [0.0], [0.0]];
        let filtered = median_filter(&input, Axis(0), 3);
        assert!(filtered.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn mask_splits_energy() {
        assert_eq!(soft_mask(0.0, 0.0), 0.0);
        assert!((soft_mask(1.0, 1.0) - 0.5).abs() < 1e-12);
        assert!((soft_mask(3.0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn steady_tone_survives_and_click_is_suppressed() {
        // bin 4 holds a steady partial, frame 20 a broadband click
        let mut spectrum = Array2::zeros((41, 64));
        spectrum.column_mut(4).fill(1.0);
        spectrum.row_mut(20).fill(1.0);
        let harmonic = harmonic_magnitude(&spectrum);
        assert!(harmonic[[10, 4]] > 0.9);
        assert!(harmonic[[20, 40]] < 0.1);
    }
}
