//! Onset-strength curve and time-indexed sampling.

use crate::error::{Error, Result};

/// Normalization is skipped below this global maximum
const MIN_GLOBAL_MAX: f32 = 1e-9;

/// Per-frame onset strengths with the timing needed to index them
#[derive(Debug, Clone)]
pub struct StrengthCurve {
    values: Vec<f32>,
    sample_rate: u32,
    hop_length: usize,
    global_max: f32,
}

impl StrengthCurve {
    pub fn new(values: Vec<f32>, sample_rate: u32, hop_length: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidCurve("no frames"));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidCurve("sample rate is zero"));
        }
        if hop_length == 0 {
            return Err(Error::InvalidCurve("hop length is zero"));
        }
        let global_max = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0f32, f32::max);

        Ok(Self {
            values,
            sample_rate,
            hop_length,
            global_max,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest strength over the whole track, fixed at construction
    pub fn global_max(&self) -> f32 {
        self.global_max
    }

    /// Analysis frame covering `time_s`, clamped into the curve
    pub fn frame_at(&self, time_s: f64) -> usize {
        let frame = (time_s * self.sample_rate as f64 / self.hop_length as f64).floor();
        if frame.is_nan() || frame <= 0.0 {
            return 0;
        }
        (frame as usize).min(self.values.len() - 1)
    }

    /// Start time of an analysis frame (seconds)
    pub fn frame_time(&self, frame: usize) -> f64 {
        frame as f64 * self.hop_length as f64 / self.sample_rate as f64
    }

    /// Scale a raw strength into `[0, 1]` against the global maximum
    ///
    /// Returns 0 for a silent track or a non-finite sample.
    pub fn normalize(&self, raw: f32) -> f32 {
        if self.global_max <= MIN_GLOBAL_MAX || !raw.is_finite() {
            return 0.0;
        }
        (raw / self.global_max).clamp(0.0, 1.0)
    }
}

/// Looks up strengths on a shared curve by playback time
#[derive(Debug, Clone, Copy)]
pub struct StrengthSampler<'a> {
    curve: &'a StrengthCurve,
}

impl<'a> StrengthSampler<'a> {
    pub fn new(curve: &'a StrengthCurve) -> Self {
        Self { curve }
    }

    /// Raw onset strength at `time_s`
    pub fn sample_at(&self, time_s: f64) -> f32 {
        self.curve.values[self.curve.frame_at(time_s)]
    }

    /// Onset strength at `time_s` scaled into `[0, 1]`
    pub fn normalized_at(&self, time_s: f64) -> f32 {
        self.curve.normalize(self.sample_at(time_s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> StrengthCurve {
        // 100 frames/s: sample_rate 1000, hop 10
        StrengthCurve::new(vec![0.0, 2.0, 4.0, 8.0], 1000, 10).unwrap()
    }

    #[test]
    fn test_time_to_frame_floors() {
        let c = curve();
        assert_eq!(c.frame_at(0.0), 0);
        assert_eq!(c.frame_at(0.0099), 0);
        assert_eq!(c.frame_at(0.01), 1);
        assert_eq!(c.frame_at(0.025), 2);
    }

    #[test]
    fn test_time_past_curve_clamps_to_last_frame() {
        let c = curve();
        let sampler = StrengthSampler::new(&c);
        assert_eq!(c.frame_at(100.0), 3);
        assert_eq!(sampler.sample_at(100.0), 8.0);
    }

    #[test]
    fn test_negative_time_clamps_to_first_frame() {
        let c = curve();
        assert_eq!(c.frame_at(-1.0), 0);
    }

    #[test]
    fn test_normalized_uses_global_max() {
        let c = curve();
        let sampler = StrengthSampler::new(&c);
        assert_eq!(c.global_max(), 8.0);
        assert!((sampler.normalized_at(0.015) - 0.25).abs() < 1e-6);
        assert!((sampler.normalized_at(0.035) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_silent_curve_normalizes_to_zero() {
        let c = StrengthCurve::new(vec![0.0; 16], 22050, 512).unwrap();
        let sampler = StrengthSampler::new(&c);
        let n = sampler.normalized_at(0.1);
        assert_eq!(n, 0.0);
        assert!(n.is_finite());
    }

    #[test]
    fn test_rejects_degenerate_curves() {
        assert!(StrengthCurve::new(Vec::new(), 22050, 512).is_err());
        assert!(StrengthCurve::new(vec![1.0], 0, 512).is_err());
        assert!(StrengthCurve::new(vec![1.0], 22050, 0).is_err());
    }
}
