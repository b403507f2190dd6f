use dasp::interpolate::sinc::Sinc;
use dasp::interpolate::Interpolator;
use dasp::{ring_buffer, signal, Signal};

const SINC_TAPS: usize = 64;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("sample rates must be positive (got {source_rate} Hz -> {target_rate} Hz)")]
pub struct InvalidRate {
    pub source_rate: u32,
    pub target_rate: u32,
}

/// Windowed-sinc resample of `samples` from `source_rate` to `target_rate`.
///
/// The interpolator reads from the middle of its ring, so it is primed with
/// the first `SINC_TAPS / 2` source frames before conversion starts; output
/// frame 0 then lines up with source frame 0. The kernel cutoff stays at the
/// source Nyquist when downsampling.
pub fn sinc_resample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, InvalidRate> {
    if source_rate == 0 || target_rate == 0 {
        return Err(InvalidRate {
            source_rate,
            target_rate,
        });
    }
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = ((samples.len() as f64) * ratio).ceil().max(1.0) as usize;

    let mut frames = samples
        .iter()
        .map(|&s| [s as f64])
        .chain(std::iter::repeat([0.0]).take(SINC_TAPS));
    let mut sinc = Sinc::new(ring_buffer::Fixed::from(vec![[0.0_f64]; SINC_TAPS]));
    for frame in frames.by_ref().take(SINC_TAPS / 2) {
        sinc.next_source_frame(frame);
    }

    let converted =
        signal::from_iter(frames).from_hz_to_hz(sinc, source_rate as f64, target_rate as f64);
    Ok(converted
        .take(output_len)
        .map(|[sample]| sample as f32)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::sinc_resample;

    #[test]
    fn output_length_follows_rate_ratio() {
        let input = vec![0.25; 4_800];
        let resampled = sinc_resample(&input, 48_000, 44_100).unwrap();
        let expected_len = ((input.len() as f64) * 44_100.0 / 48_000.0).ceil() as usize;
        assert_eq!(resampled.len(), expected_len);
        assert!(resampled.iter().all(|s| s.is_finite()));
    }

    /// Mean squared error between `output` shifted by `lag` and the ideal tone.
    fn tone_error(output: &[f32], lag: isize, frequency: f64, rate: f64) -> f64 {
        let range = 200..output.len() - 200;
        let count = range.len() as f64;
        range
            .map(|n| {
                let t = (n as isize + lag) as f64 / rate;
                let ideal = (2.0 * std::f64::consts::PI * frequency * t).sin();
                (output[n] as f64 - ideal).powi(2)
            })
            .sum::<f64>()
            / count
    }

    #[test]
    fn downsampled_tone_is_not_delayed() {
        let input: Vec<f32> = (0..4_800)
            .map(|n| (2.0 * std::f64::consts::PI * 1_000.0 * n as f64 / 48_000.0).sin() as f32)
            .collect();
        let output = sinc_resample(&input, 48_000, 44_100).unwrap();
        assert_eq!(output.len(), 4_410);

        let aligned = tone_error(&output, 0, 1_000.0, 44_100.0);
        for lag in [-3, -2, -1, 1, 2, 3] {
            assert!(
                aligned < tone_error(&output, lag, 1_000.0, 44_100.0),
                "lag {lag} fits better than no lag"
            );
        }
        assert!(aligned < 1e-3, "mean squared error {aligned}");
        // the final source samples still reach the output
        assert!(output[output.len() - 10..].iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn upsampled_tone_is_not_delayed() {
        let input: Vec<f32> = (0..2_205)
            .map(|n| (2.0 * std::f64::consts::PI * 500.0 * n as f64 / 22_050.0).sin() as f32)
            .collect();
        let output = sinc_resample(&input, 22_050, 44_100).unwrap();
        assert_eq!(output.len(), 4_410);
        let aligned = tone_error(&output, 0, 500.0, 44_100.0);
        assert!(aligned < tone_error(&output, 2, 500.0, 44_100.0));
        assert!(aligned < tone_error(&output, -2, 500.0, 44_100.0));
    }

    #[test]
    fn identical_rates_pass_through() {
        let input = vec![0.1, -0.2, 0.3];
        assert_eq!(sinc_resample(&input, 44_100, 44_100).unwrap(), input);
    }

    #[test]
    fn rejects_zero_rate() {
        assert!(sinc_resample(&[0.0; 8], 0, 44_100).is_err());
    }
}
