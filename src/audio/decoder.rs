use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use crate::audio::capture::mix_to_mono;
use crate::audio::resample;
use crate::error::{Error, Result};
use crate::types::Waveform;

/// Load an audio file as mono samples resampled to `target_rate`.
pub fn load_waveform<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<Waveform> {
    let path = path.as_ref();
    let decoded = decode_file(path)?;
    conform(decoded, target_rate, &path.display().to_string())
}

/// Same as [`load_waveform`] for an in-memory clip, e.g. an uploaded file.
pub fn load_waveform_from_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
    target_rate: u32,
) -> Result<Waveform> {
    let decoded = decode_bytes(bytes, extension)?;
    conform(decoded, target_rate, "in-memory clip")
}

/// Decode an audio file to mono f32 samples at its native sample rate.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Waveform> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|err| Error::load(&name, err))?;

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }
    decode_source(Box::new(file), hint, &name)
}

/// Decode an in-memory audio clip to mono f32 samples at its native sample rate.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<Waveform> {
    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }
    decode_source(Box::new(Cursor::new(bytes)), hint, "in-memory clip")
}

fn decode_source(source: Box<dyn MediaSource>, hint: Hint, name: &str) -> Result<Waveform> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| Error::load(name, format!("unrecognized audio format ({err})")))?;

    let mut format = probe_result.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::load(name, "no audio tracks found"))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::load(name, "sample rate not specified"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| Error::load(name, format!("unsupported codec ({err})")))?;

    let mut samples = Vec::new();
    let mut channels = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(Error::load(name, format!("failed to read packet ({err})"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!(source = name, reason, "skipping undecodable packet");
                continue;
            }
            Err(err) => {
                return Err(Error::load(name, format!("failed to decode packet ({err})")))
            }
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();
        if channels == 0 {
            continue;
        }
        let mut interleaved = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        interleaved.copy_interleaved_ref(decoded);
        samples.extend(interleaved.samples().chunks(channels).map(mix_to_mono));
    }

    if samples.is_empty() {
        return Err(Error::load(name, "file contains no audio samples"));
    }
    debug!(
        source = name,
        frames = samples.len(),
        channels,
        sample_rate,
        "decoded audio"
    );
    Waveform::new(samples, sample_rate)
}

fn conform(decoded: Waveform, target_rate: u32, name: &str) -> Result<Waveform> {
    let source_rate = decoded.sample_rate();
    let waveform = if source_rate == target_rate {
        decoded
    } else {
        let resampled = resample::sinc_resample(decoded.samples(), source_rate, target_rate)
            .map_err(|err| Error::load(name, err))?;
        Waveform::new(resampled, target_rate)?
    };
    info!(
        source = name,
        source_rate,
        sample_rate = waveform.sample_rate(),
        seconds = waveform.duration().as_secs_f64(),
        "loaded waveform"
    );
    Ok(waveform)
}
