//! Backend adapter for the host's default audio output.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Producer, RingBuffer};
use tracing::{error, info};

use crate::{
    backend::SoftwareBackend,
    engine::scheduler::RealtimeScheduler,
    error::BackendError,
    synth::{BankMessage, OscillatorBank},
    MAX_BLOCK_SIZE,
};

/// Control messages that may be queued between two audio callbacks.
pub const CONTROL_QUEUE_CAPACITY: usize = 1024;

pub type RealtimeBackend = SoftwareBackend<RealtimeScheduler, Producer<BankMessage>>;

/// Keeps the output stream running. Dropping it silences the device.
pub struct OutputStream {
    _stream: cpal::Stream,
    pub sample_rate: f32,
    pub channels: usize,
}

fn device_error(context: &str, err: impl std::fmt::Display) -> BackendError {
    BackendError::Device(format!("{context}: {err}"))
}

/// Open the default output device and return a backend wired to it.
///
/// The audio callback owns an [`OscillatorBank`] with `voice_capacity`
/// voices, drains control messages at the start of every callback and writes
/// the mono mix to every channel.
pub fn open_default_output(
    voice_capacity: usize,
) -> Result<(RealtimeBackend, OutputStream), BackendError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| BackendError::Device("no default output device available".into()))?;
    let config = device
        .default_output_config()
        .map_err(|err| device_error("failed to fetch default output config", err))?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    info!(sample_rate, channels, voice_capacity, "opening output device");

    let (msg_tx, mut msg_rx) = RingBuffer::<BankMessage>::new(CONTROL_QUEUE_CAPACITY);
    let mut bank = OscillatorBank::new(sample_rate, voice_capacity);
    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                bank.drain(&mut msg_rx);

                let total_frames = data.len() / channels;
                let mut frames_written = 0;
                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                    let block = &mut render_buf[..frames_to_render];
                    bank.render_block(block);

                    // Duplicate mono to all channels
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            move |err| error!("output stream error: {err}"),
            None,
        )
        .map_err(|err| device_error("failed to build output stream", err))?;

    stream
        .play()
        .map_err(|err| device_error("failed to start output stream", err))?;

    let backend = SoftwareBackend::new(RealtimeScheduler::new(), msg_tx, sample_rate);
    Ok((
        backend,
        OutputStream {
            _stream: stream,
            sample_rate,
            channels,
        },
    ))
}
