//! Offline audio analysis configuration.

use std::ops::RangeInclusive;

/// Onset-strength and beat-tracking configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Samples between consecutive analysis frames
    /// One onset-strength value is produced per hop.
    pub hop_length: usize,

    /// STFT window size (must be power of 2)
    pub fft_size: usize,

    /// Number of mel bands the onset envelope is averaged over
    pub mel_bands: usize,

    /// Upper edge of the mel filterbank (Hz), clamped to Nyquist
    pub mel_fmax_hz: f32,

    /// Dynamic range kept in the log spectrogram (dB below the peak)
    pub top_db: f32,

    /// Center of the tempo prior (BPM)
    pub tempo_prior_bpm: f32,

    /// Width of the tempo prior (octaves)
    pub tempo_prior_octaves: f32,

    /// Tempi considered by the estimator (BPM)
    pub tempo_range_bpm: RangeInclusive<f32>,

    /// How strongly the beat tracker sticks to the estimated period
    pub tightness: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hop_length: 512,
            fft_size: 2048,
            mel_bands: 128,
            mel_fmax_hz: 11025.0,
            top_db: 80.0,
            tempo_prior_bpm: 120.0,
            tempo_prior_octaves: 1.0,
            tempo_range_bpm: 30.0..=300.0,
            tightness: 100.0,
        }
    }
}

impl AnalysisConfig {
    /// Analysis frames per second at the given sample rate
    pub fn frame_rate(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.hop_length as f64
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if self.hop_length == 0 {
            return Err("hop length must be > 0".to_string());
        }
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.mel_bands == 0 {
            return Err("mel band count must be > 0".to_string());
        }
        let (lo, hi) = (
            *self.tempo_range_bpm.start(),
            *self.tempo_range_bpm.end(),
        );
        if !(lo > 0.0 && hi > lo) {
            return Err(format!("invalid tempo range {lo}..={hi} BPM"));
        }
        if self.tempo_prior_octaves <= 0.0 {
            return Err("tempo prior width must be > 0".to_string());
        }
        Ok(())
    }
}
