//! Onset-strength envelope from a mel spectrogram.
//!
//! Frame `k` is centered on sample `k * hop_length`, so its time is
//! `k * hop_length / sample_rate`.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

use crate::params::AnalysisConfig;

/// Power floor before taking logs
const POWER_FLOOR: f32 = 1e-10;

/// Compute one onset-strength value per analysis frame
///
/// Positive first-order difference of the log-mel spectrogram, averaged
/// over mel bands. The first frame is always 0.
pub fn onset_strength(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Vec<f32> {
    let spectrogram = log_mel_spectrogram(samples, sample_rate, config);
    let Some(first) = spectrogram.first() else {
        return Vec::new();
    };

    let mut envelope = Vec::with_capacity(spectrogram.len());
    envelope.push(0.0);
    let mut prev = first;
    for frame in &spectrogram[1..] {
        let rise: f32 = frame
            .iter()
            .zip(prev.iter())
            .map(|(&cur, &old)| (cur - old).max(0.0))
            .sum();
        envelope.push(rise / frame.len() as f32);
        prev = frame;
    }
    envelope
}

/// Mel power spectrogram in dB, one row per frame, floored `top_db` below the peak
fn log_mel_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Vec<Vec<f32>> {
    let n_fft = config.fft_size;
    let hop = config.hop_length;
    let n_frames = 1 + samples.len() / hop;
    let filters = mel_filterbank(sample_rate, n_fft, config.mel_bands, config.mel_fmax_hz);

    // Zero-pad half a window on each side to center frames
    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let window: Vec<f32> = (0..n_fft).map(|i| hann_window(i, n_fft)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
    let mut power = vec![0.0f32; n_fft / 2 + 1];

    let mut rows = Vec::with_capacity(n_frames);
    let mut peak_db = f32::NEG_INFINITY;

    for frame in 0..n_frames {
        let start = frame * hop;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let sample = padded.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * window[i], 0.0);
        }
        fft.process(&mut buffer);

        for (bin, p) in power.iter_mut().enumerate() {
            *p = buffer[bin].norm_sqr();
        }

        let row: Vec<f32> = filters
            .iter()
            .map(|filter| {
                let energy: f32 = filter.iter().map(|&(bin, w)| power[bin] * w).sum();
                10.0 * energy.max(POWER_FLOOR).log10()
            })
            .collect();

        peak_db = row.iter().copied().fold(peak_db, f32::max);
        rows.push(row);
    }

    let floor_db = peak_db - config.top_db;
    for row in &mut rows {
        for value in row.iter_mut() {
            *value = value.max(floor_db);
        }
    }
    rows
}

/// Sparse triangular mel filters: `(fft_bin, weight)` per band
fn mel_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmax_hz: f32,
) -> Vec<Vec<(usize, f32)>> {
    let nyquist = sample_rate as f32 / 2.0;
    let fmax = fmax_hz.min(nyquist);
    let mel_max = hz_to_mel(fmax);

    // n_mels + 2 edge frequencies, evenly spaced in mel
    let edges: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
        .collect();
    let bin_hz = sample_rate as f32 / n_fft as f32;

    (0..n_mels)
        .map(|m| {
            let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
            (0..=n_fft / 2)
                .filter_map(|bin| {
                    let f = bin as f32 * bin_hz;
                    let weight = if f <= lo || f >= hi {
                        0.0
                    } else if f <= center {
                        (f - lo) / (center - lo)
                    } else {
                        (hi - f) / (hi - center)
                    };
                    (weight > 0.0).then_some((bin, weight))
                })
                .collect()
        })
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Hann window function for STFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}
