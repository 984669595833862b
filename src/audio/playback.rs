//! Track playback through the default output device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::decode::Track;
use crate::clock::PlaybackClock;
use crate::error::{Error, Result};

/// Plays a decoded track and reports how much of it has been heard
pub struct AudioPlayback {
    /// Source frames consumed by the audio callback
    position_frames: Arc<AtomicU64>,

    total_frames: u64,
    sample_rate: u32,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

impl AudioPlayback {
    /// Open the default output device and start playing `track`
    pub fn start(track: &Track) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::AudioDevice("no audio output device found".to_string()))?;

        let config = pick_stream_config(&device, track.sample_rate)?;

        info!(
            "Audio: {} @ {}Hz, {} channel(s)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            config.channels
        );
        if config.sample_rate.0 != track.sample_rate {
            warn!(
                "Device runs at {}Hz, track is {}Hz; stepping through the track at the rate ratio",
                config.sample_rate.0, track.sample_rate
            );
        }

        let samples: Arc<[f32]> = track.samples.clone().into();
        let total_frames = samples.len() as u64;
        let channels = config.channels.max(1) as usize;
        let step = track.sample_rate as f64 / config.sample_rate.0 as f64;

        let position_frames = Arc::new(AtomicU64::new(0));
        let position_callback = Arc::clone(&position_frames);
        let mut cursor = 0.0f64;

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let index = cursor as usize;
                    frame.fill(samples.get(index).copied().unwrap_or(0.0));
                    if index < samples.len() {
                        cursor += step;
                    }
                }
                let played = (cursor as u64).min(samples.len() as u64);
                position_callback.store(played, Ordering::Release);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )?;

        stream.play()?;

        Ok(Self {
            position_frames,
            total_frames,
            sample_rate: track.sample_rate,
            _stream: stream,
        })
    }
}

impl PlaybackClock for AudioPlayback {
    fn position_secs(&self) -> f64 {
        self.position_frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn is_finished(&self) -> bool {
        self.position_frames.load(Ordering::Acquire) >= self.total_frames
    }
}

impl Drop for AudioPlayback {
    fn drop(&mut self) {
        debug!("Stopping audio stream");
    }
}

/// An f32 output config at the track's rate if the device offers one,
/// otherwise the device default
fn pick_stream_config(device: &cpal::Device, sample_rate: u32) -> Result<cpal::StreamConfig> {
    let supported = device
        .supported_output_configs()
        .map_err(|e| Error::AudioDevice(format!("failed to query output configs: {}", e)))?;

    let matching = supported
        .filter(|range| range.sample_format() == cpal::SampleFormat::F32)
        .find(|range| {
            range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
        });

    if let Some(range) = matching {
        return Ok(range.with_sample_rate(cpal::SampleRate(sample_rate)).config());
    }

    let default = device
        .default_output_config()
        .map_err(|e| Error::AudioDevice(format!("failed to get audio config: {}", e)))?;
    Ok(default.config())
}
