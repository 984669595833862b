//! Crate-wide error type.

use thiserror::Error;

/// Errors raised while loading, analyzing, or presenting a track.
///
/// Nothing in the per-tick path returns these; they surface during startup
/// or from the audio/GPU collaborators.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode WAV file: {0}")]
    Decode(#[from] hound::Error),

    #[error("unsupported sample format: {bits}-bit {format}")]
    UnsupportedFormat { bits: u16, format: &'static str },

    #[error("audio file contains no samples")]
    EmptyAudio,

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),

    #[error("palette needs at least 2 anchor colors, got {0}")]
    InvalidPalette(usize),

    #[error("invalid strength curve: {0}")]
    InvalidCurve(&'static str),

    #[error("beat times must be finite and strictly increasing (index {index}: {time})")]
    NonMonotonicBeats { index: usize, time: f64 },

    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("render setup failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
