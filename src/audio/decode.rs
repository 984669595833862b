//! WAV decoding into a mono sample buffer.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::info;

use crate::error::{Error, Result};

/// Decoded track at its native sample rate, downmixed to mono
#[derive(Debug, Clone)]
pub struct Track {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Track {
    /// Decode a WAV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            (SampleFormat::Int, bits @ 1..=32) => {
                let scale = 1.0 / (1u64 << (bits - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()?
            }
            (SampleFormat::Float, bits) => {
                return Err(Error::UnsupportedFormat {
                    bits,
                    format: "float",
                })
            }
            (SampleFormat::Int, bits) => {
                return Err(Error::UnsupportedFormat { bits, format: "int" })
            }
        };

        let samples = downmix(&interleaved, channels);
        if samples.is_empty() {
            return Err(Error::EmptyAudio);
        }

        let track = Self {
            samples,
            sample_rate: spec.sample_rate,
        };
        info!(
            "Loaded {}: {:.2}s @ {}Hz, {} channel(s)",
            path.display(),
            track.duration_secs(),
            track.sample_rate,
            channels
        );
        Ok(track)
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Write the first `max_secs` of the mono track as 32-bit float WAV
    pub fn write_wav(&self, path: impl AsRef<Path>, max_secs: f64) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        let limit = (max_secs.max(0.0) * self.sample_rate as f64).ceil() as usize;
        for &sample in self.samples.iter().take(limit) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Average interleaved channels into one
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
