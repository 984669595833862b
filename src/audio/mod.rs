//! Audio decoding, offline beat analysis, and playback.
//!
//! Analysis runs once at startup and yields everything the sync engine
//! needs: beat times, the onset-strength curve, the tempo, and the track
//! duration. Playback streams the decoded track through cpal and exposes
//! its position as a [`PlaybackClock`](crate::clock::PlaybackClock).

mod decode;
mod onset;
mod playback;
mod tempo;
mod tracker;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::params::AnalysisConfig;
use crate::sync::{BeatEvent, StrengthCurve};

// Re-export public types
pub use decode::Track;
pub use onset::onset_strength;
pub use playback::AudioPlayback;
pub use tempo::estimate_tempo;
pub use tracker::track_beats;

/// Result of analyzing a whole track
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Beat times in seconds, strictly increasing
    pub beat_times: Vec<f64>,
    pub curve: StrengthCurve,
    /// Estimated tempo (BPM), 0 when none was found
    pub tempo_bpm: f32,
    pub duration_secs: f64,
}

impl Analysis {
    pub fn from_track(track: &Track, config: &AnalysisConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;

        let envelope = onset_strength(&track.samples, track.sample_rate, config);
        let frame_rate = config.frame_rate(track.sample_rate);

        let (tempo_bpm, beat_frames) = match estimate_tempo(&envelope, frame_rate, config) {
            Some(bpm) => {
                let period = 60.0 * frame_rate / bpm as f64;
                (bpm, track_beats(&envelope, period, config.tightness))
            }
            None => {
                warn!("No periodic onsets found, track will play without beat pulses");
                (0.0, Vec::new())
            }
        };

        let curve = StrengthCurve::new(envelope, track.sample_rate, config.hop_length)?;
        let beat_times: Vec<f64> = beat_frames.iter().map(|&f| curve.frame_time(f)).collect();

        info!(
            "Analysis: {:.1} BPM, {} beats over {:.2}s ({} frames)",
            tempo_bpm,
            beat_times.len(),
            track.duration_secs(),
            curve.len()
        );

        Ok(Self {
            beat_times,
            curve,
            tempo_bpm,
            duration_secs: track.duration_secs(),
        })
    }

    /// Beat events with strengths and next-beat links
    pub fn beat_events(&self) -> Result<Vec<BeatEvent>> {
        BeatEvent::sequence(&self.beat_times, &self.curve)
    }
}
