//! Global tempo estimate from onset-envelope autocorrelation.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::params::AnalysisConfig;

/// Estimate the track tempo in BPM
///
/// Autocorrelation of the onset envelope, weighted by a log-normal prior
/// around `tempo_prior_bpm`, with parabolic refinement of the winning lag.
/// Returns `None` when the envelope carries no periodicity.
pub fn estimate_tempo(envelope: &[f32], frame_rate: f64, config: &AnalysisConfig) -> Option<f32> {
    let ac = autocorrelate(envelope);
    if ac.len() < 3 || ac[0] <= 0.0 {
        return None;
    }

    let bpm_lo = *config.tempo_range_bpm.start() as f64;
    let bpm_hi = *config.tempo_range_bpm.end() as f64;
    let min_lag = ((60.0 * frame_rate / bpm_hi).floor() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / bpm_lo).ceil() as usize).min(ac.len() - 2);
    if min_lag > max_lag {
        return None;
    }

    let prior_center = (config.tempo_prior_bpm as f64).log2();
    let prior_width = config.tempo_prior_octaves as f64;

    let (best_lag, best_score) = (min_lag..=max_lag)
        .map(|lag| {
            let bpm = 60.0 * frame_rate / lag as f64;
            let z = (bpm.log2() - prior_center) / prior_width;
            let prior = (-0.5 * z * z).exp();
            (lag, ac[lag] as f64 * prior)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    if best_score <= 0.0 {
        return None;
    }

    let lag = refine_peak(&ac, best_lag);
    Some((60.0 * frame_rate / lag) as f32)
}

/// Sub-sample peak position by parabolic interpolation
fn refine_peak(ac: &[f32], lag: usize) -> f64 {
    if lag == 0 || lag + 1 >= ac.len() {
        return lag as f64;
    }
    let (a, b, c) = (ac[lag - 1] as f64, ac[lag] as f64, ac[lag + 1] as f64);
    let denom = a - 2.0 * b + c;
    if denom >= 0.0 {
        return lag as f64;
    }
    let offset = (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
    lag as f64 + offset
}

/// Linear autocorrelation via FFT, lags `0..len`
pub fn autocorrelate(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let size = (2 * n).next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(size);
    let inverse = planner.plan_fft_inverse(size);

    let mut buffer: Vec<Complex<f32>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(size)
        .collect();

    forward.process(&mut buffer);
    for value in buffer.iter_mut() {
        *value = Complex::new(value.norm_sqr(), 0.0);
    }
    inverse.process(&mut buffer);

    buffer[..n].iter().map(|c| c.re / size as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse_train(len: usize, period: usize) -> Vec<f32> {
        (0..len)
            .map(|i| if i % period == 5 { 1.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_autocorrelate_matches_direct_sum() {
        let signal = [1.0, 2.0, 0.0, -1.0, 3.0];
        let ac = autocorrelate(&signal);
        for lag in 0..signal.len() {
            let direct: f32 = (0..signal.len() - lag)
                .map(|i| signal[i] * signal[i + lag])
                .sum();
            assert!((ac[lag] - direct).abs() < 1e-3, "lag {lag}");
        }
    }

    #[test]
    fn test_pulse_train_tempo() {
        let config = AnalysisConfig::default();
        let frame_rate = 40.0;
        // Period 20 frames at 40 fps = 0.5s = 120 BPM
        let envelope = pulse_train(800, 20);
        let bpm = estimate_tempo(&envelope, frame_rate, &config).unwrap();
        assert!((bpm - 120.0).abs() < 1.0, "got {bpm}");
    }

    #[test]
    fn test_prior_prefers_tempo_near_center() {
        let config = AnalysisConfig::default();
        // Period 24 frames at 40 fps = 100 BPM; 50 BPM harmonic must lose
        let envelope = pulse_train(960, 24);
        let bpm = estimate_tempo(&envelope, 40.0, &config).unwrap();
        assert!((bpm - 100.0).abs() < 1.0, "got {bpm}");
    }

    #[test]
    fn test_flat_envelope_has_no_tempo() {
        let config = AnalysisConfig::default();
        assert!(estimate_tempo(&[0.0; 500], 43.0, &config).is_none());
        assert!(estimate_tempo(&[], 43.0, &config).is_none());
    }
}
