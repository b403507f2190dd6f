use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig};
use tracing::{info, warn};

use crate::audio::{encoder, resample};
use crate::error::{Error, Result};
use crate::types::Waveform;

pub const MIN_RECORD_SECONDS: u64 = 5;
pub const MAX_RECORD_SECONDS: u64 = 20;
pub const DEFAULT_RECORD_SECONDS: u64 = 10;
pub const DEFAULT_CAPTURE_RATE: u32 = 44_100;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Extra time allowed for the device to deliver the requested frames.
const STALL_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub device_name: Option<String>,
    pub sample_rate: u32,
    pub latency_ms: RangeInclusive<u32>,
    pub duration: Duration,
}

impl CaptureConfig {
    /// Configure a recording of `seconds`, which must lie in 5..=20.
    pub fn new(seconds: u64) -> Result<Self> {
        let bounds = MIN_RECORD_SECONDS..=MAX_RECORD_SECONDS;
        if !bounds.contains(&seconds) {
            return Err(Error::capture(format!(
                "recording duration must be between {} and {} seconds (got {})",
                MIN_RECORD_SECONDS, MAX_RECORD_SECONDS, seconds
            )));
        }
        Ok(Self {
            device_name: None,
            sample_rate: DEFAULT_CAPTURE_RATE,
            latency_ms: default_latency_range(),
            duration: Duration::from_secs(seconds),
        })
    }

    pub fn with_device(mut self, device_name: Option<String>) -> Self {
        self.device_name = device_name;
        self
    }

    /// Rate the recording is resampled to; must be positive.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::capture("recording sample rate must be positive"));
        }
        self.sample_rate = sample_rate;
        Ok(self)
    }
}

fn default_latency_range() -> RangeInclusive<u32> {
    100..=200
}

struct StreamSetup {
    stream: Stream,
    receiver: Receiver<Vec<f32>>,
    finished: Arc<AtomicBool>,
    sample_rate: u32,
}

/// Record from the microphone and persist the clip as a mono 16-bit WAV.
///
/// With `output` unset the clip lands in a temporary file that is kept on
/// disk; the returned path is what the loader should read.
pub fn record_to_file(config: &CaptureConfig, output: Option<&Path>) -> Result<PathBuf> {
    let waveform = record_audio(config)?;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => persisted_temp_path()?,
    };
    encoder::encode_wav(&waveform, &path)?;
    info!(path = %path.display(), "recording written");
    Ok(path)
}

/// Record `config.duration` of mono audio at `config.sample_rate`.
pub fn record_audio(config: &CaptureConfig) -> Result<Waveform> {
    let device = select_device(config)?;
    let setup = build_stream(&device, config)?;
    let frames_needed = frames_for_duration(config.duration, setup.sample_rate);
    info!(
        seconds = config.duration.as_secs_f64(),
        device_rate = setup.sample_rate,
        "recording started"
    );
    let raw = collect_samples(
        setup.stream,
        setup.receiver,
        setup.finished.clone(),
        frames_needed,
        config.duration + STALL_GRACE,
    )?;
    setup.finished.store(true, Ordering::SeqCst);
    if raw.len() < frames_needed {
        warn!(
            captured = raw.len(),
            requested = frames_needed,
            "input stream delivered fewer frames than requested"
        );
    }
    let mono = if setup.sample_rate == config.sample_rate {
        raw
    } else {
        resample::sinc_resample(&raw, setup.sample_rate, config.sample_rate)
            .map_err(Error::capture)?
    };
    Waveform::new(mono, config.sample_rate)
        .map_err(|_| Error::capture("input device produced no audio"))
}

fn persisted_temp_path() -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix("emovox-recording-")
        .suffix(".wav")
        .tempfile()
        .map_err(Error::capture)?;
    let (_, path) = file.keep().map_err(Error::capture)?;
    Ok(path)
}

fn select_device(config: &CaptureConfig) -> Result<Device> {
    let host = cpal::default_host();
    if let Some(name) = config.device_name.as_deref() {
        let devices = host
            .input_devices()
            .map_err(|err| Error::capture(format!("listing input devices failed ({err})")))?;
        for device in devices {
            if device.name().map(|n| n == name).unwrap_or(false) {
                return Ok(device);
            }
        }
        return Err(Error::capture(format!("input device '{}' not found", name)));
    }
    host.default_input_device()
        .ok_or_else(|| Error::capture("no default input device available"))
}

fn build_stream(device: &Device, config: &CaptureConfig) -> Result<StreamSetup> {
    let supported = device
        .default_input_config()
        .map_err(|err| Error::capture(format!("failed to query default input config ({err})")))?;
    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: BufferSize::Default,
    };
    let capacity = channel_capacity(stream_config.sample_rate.0, &config.latency_ms);
    let (sender, receiver) = mpsc::sync_channel::<Vec<f32>>(capacity);
    let finished = Arc::new(AtomicBool::new(false));
    let stream = build_input_stream(
        device,
        &stream_config,
        supported.sample_format(),
        Arc::new(sender),
        finished.clone(),
    )?;
    Ok(StreamSetup {
        stream,
        receiver,
        finished,
        sample_rate: stream_config.sample_rate.0,
    })
}

fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    format: SampleFormat,
    sender: Arc<SyncSender<Vec<f32>>>,
    finished: Arc<AtomicBool>,
) -> Result<Stream> {
    let err_fn = |err: cpal::StreamError| warn!(error = %err, "audio input stream error");
    let channels = config.channels as usize;
    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _| emit_from_slice(data, channels, &sender, &finished),
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _| {
                let converted: Vec<f32> =
                    data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                emit_from_slice(&converted, channels, &sender, &finished)
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _| {
                let converted: Vec<f32> = data
                    .iter()
                    .map(|&s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0)
                    .collect();
                emit_from_slice(&converted, channels, &sender, &finished)
            },
            err_fn,
            None,
        ),
        other => {
            return Err(Error::capture(format!(
                "unsupported input sample format {:?}",
                other
            )))
        }
    };
    stream.map_err(|err| Error::capture(format!("failed to build input stream ({err})")))
}

fn emit_from_slice(
    data: &[f32],
    channels: usize,
    sender: &Arc<SyncSender<Vec<f32>>>,
    finished: &Arc<AtomicBool>,
) {
    if finished.load(Ordering::Relaxed) || channels == 0 {
        return;
    }
    let mono: Vec<f32> = data.chunks(channels).map(mix_to_mono).collect();
    let _ = sender.try_send(mono);
}

fn collect_samples(
    stream: Stream,
    receiver: Receiver<Vec<f32>>,
    finished: Arc<AtomicBool>,
    frames_needed: usize,
    deadline: Duration,
) -> Result<Vec<f32>> {
    stream
        .play()
        .map_err(|err| Error::capture(format!("failed to start capture stream ({err})")))?;
    let started = Instant::now();
    let mut collected = Vec::with_capacity(frames_needed);
    while collected.len() < frames_needed && started.elapsed() < deadline {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(chunk) => append_chunk(&mut collected, chunk, frames_needed),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    finished.store(true, Ordering::SeqCst);
    stream.pause().ok();
    Ok(collected)
}

fn append_chunk(buffer: &mut Vec<f32>, mut chunk: Vec<f32>, frames_needed: usize) {
    let remaining = frames_needed.saturating_sub(buffer.len());
    chunk.truncate(remaining);
    buffer.extend_from_slice(&chunk);
}

fn frames_for_duration(duration: Duration, sample_rate: u32) -> usize {
    let frames = duration.as_secs_f64() * sample_rate as f64;
    frames.ceil() as usize
}

fn channel_capacity(sample_rate: u32, latency_ms: &RangeInclusive<u32>) -> usize {
    let max_latency = (*latency_ms.end()).max(*latency_ms.start());
    let frames = (sample_rate as u64 * max_latency as u64) / 1000;
    let approx_chunks = (frames / 1024).max(2);
    approx_chunks as usize
}

/// Average one interleaved frame down to a single sample.
pub fn mix_to_mono(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().sum::<f32>() / frame.len() as f32
}
