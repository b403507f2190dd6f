use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Waveform;

/// Write a waveform as a mono 16-bit PCM WAV file.
pub fn encode_wav<P: AsRef<Path>>(waveform: &Waveform, path: P) -> Result<()> {
    let path = path.as_ref();
    let fail = |err: hound::Error| Error::capture(format!("{}: {err}", path.display()));

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(fail)?;
    for &sample in waveform.samples() {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * i16::MAX as f32) as i16)
            .map_err(fail)?;
    }
    writer.finalize().map_err(fail)?;

    Ok(())
}
