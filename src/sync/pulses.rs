//! Pulse lifecycle: spawn on beats, animate by age, retire after the deadline.

use crate::params::PulseParams;

use super::beats::BeatEvent;
use super::palette::{Palette, Rgb};

/// Slack on deadline comparisons so a tick landing on the deadline in
/// decimal seconds is not lost to binary rounding
const DEADLINE_TOLERANCE_S: f64 = 1e-9;

/// A pulse currently animating in response to one beat
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActivePulse {
    /// Beat time the pulse belongs to (seconds)
    pub spawn_time: f64,
    pub color: Rgb,
    /// Radius multiplier derived from strength at spawn
    pub scale_factor: f32,
    /// Playback time after which the pulse is removed (seconds)
    pub fade_deadline: f64,
}

/// Instantaneous drawable state of a pulse
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderablePulse {
    /// Canvas position (pixels)
    pub center: [f32; 2],
    /// Radius (pixels)
    pub radius: f32,
    pub color: Rgb,
    /// Opacity (0-255)
    pub alpha: u8,
}

/// Owns the set of live pulses
#[derive(Debug, Clone)]
pub struct PulseManager {
    params: PulseParams,
    center: [f32; 2],
    active: Vec<ActivePulse>,
}

impl PulseManager {
    pub fn new(params: PulseParams, center: [f32; 2]) -> Self {
        Self {
            params,
            center,
            active: Vec::new(),
        }
    }

    /// Start a pulse for `event` with strength already normalized to `[0, 1]`
    pub fn spawn(&mut self, event: &BeatEvent, normalized_strength: f32, palette: &Palette) {
        let strength = if normalized_strength.is_finite() {
            normalized_strength.clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.active.push(ActivePulse {
            spawn_time: event.time,
            color: palette.color_for(strength),
            scale_factor: 1.0 + strength * self.params.strength_scale_gain,
            fade_deadline: event.next_time + self.params.fade_tail_s,
        });
    }

    /// Drawable pulses at `time_s`, then retire every pulse past its deadline
    ///
    /// A pulse exactly at its deadline is drawn one last time.
    pub fn update(&mut self, time_s: f64) -> Vec<RenderablePulse> {
        let rendered = self
            .active
            .iter()
            .filter(|pulse| is_live(pulse, time_s))
            .map(|pulse| self.render(pulse, time_s))
            .collect();

        self.active.retain(|pulse| is_live(pulse, time_s));
        rendered
    }

    fn render(&self, pulse: &ActivePulse, time_s: f64) -> RenderablePulse {
        let elapsed = (time_s - pulse.spawn_time).max(0.0);
        let growth = 1.0 + self.params.growth_per_s * elapsed as f32;
        RenderablePulse {
            center: self.center,
            radius: self.params.base_radius_px * pulse.scale_factor * growth,
            color: pulse.color,
            alpha: self.alpha_at(elapsed),
        }
    }

    /// Opacity after `elapsed` seconds: linear fall over the fade window, then the floor
    fn alpha_at(&self, elapsed: f64) -> u8 {
        let fade = 255.0 * (1.0 - elapsed / self.params.fade_window_s);
        let floor = self.params.alpha_floor as f64;
        fade.floor().clamp(floor, 255.0) as u8
    }

    pub fn active(&self) -> &[ActivePulse] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

fn is_live(pulse: &ActivePulse, time_s: f64) -> bool {
    time_s <= pulse.fade_deadline + DEADLINE_TOLERANCE_S
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(time: f64, next_time: f64) -> BeatEvent {
        BeatEvent {
            time,
            strength: 1.0,
            next_time,
        }
    }

    fn manager() -> PulseManager {
        PulseManager::new(PulseParams::default(), [300.0, 200.0])
    }

    #[test]
    fn test_spawn_derives_scale_color_deadline() {
        let palette = Palette::default();
        let mut pulses = manager();
        pulses.spawn(&beat(0.0, 1.0), 1.0, &palette);

        let pulse = pulses.active()[0];
        assert!((pulse.scale_factor - 2.5).abs() < 1e-6);
        assert_eq!(pulse.color, palette.color_for(1.0));
        assert!((pulse.fade_deadline - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_retired_after_deadline_without_resurrection() {
        let palette = Palette::default();
        let mut pulses = manager();
        pulses.spawn(&beat(0.0, 1.0), 0.5, &palette);

        assert_eq!(pulses.update(1.5).len(), 1);
        assert!(pulses.update(1.61).is_empty());
        assert!(pulses.update(1.0).is_empty());
        assert!(pulses.is_empty());
    }

    #[test]
    fn test_rendered_once_at_exact_deadline() {
        let palette = Palette::default();
        let mut pulses = manager();
        pulses.spawn(&beat(0.5, 1.0), 0.5, &palette);
        let deadline = pulses.active()[0].fade_deadline;

        assert_eq!(pulses.update(deadline).len(), 1);
        assert!(pulses.update(deadline + 1e-6).is_empty());
    }

    #[test]
    fn test_decimal_deadline_tick_still_renders() {
        let palette = Palette::default();
        let mut pulses = manager();
        // 1.2 + 0.6 rounds below 1.8 in binary
        pulses.spawn(&beat(0.5, 1.2), 0.5, &palette);

        assert_eq!(pulses.update(1.8).len(), 1);
        assert!(pulses.update(1.8000001).is_empty());
    }

    #[test]
    fn test_radius_grows_strictly() {
        let palette = Palette::default();
        let mut pulses = manager();
        pulses.spawn(&beat(0.0, 2.0), 0.3, &palette);

        let mut prev = 0.0f32;
        for step in 0..=25 {
            let t = step as f64 * 0.1;
            let out = pulses.update(t);
            assert_eq!(out.len(), 1);
            assert!(out[0].radius > prev, "radius did not grow at t={t}");
            prev = out[0].radius;
        }
    }

    #[test]
    fn test_alpha_fades_to_floor_then_holds() {
        let palette = Palette::default();
        let params = PulseParams::default();
        let mut pulses = manager();
        pulses.spawn(&beat(0.0, 2.0), 0.3, &palette);

        assert_eq!(pulses.update(0.0)[0].alpha, 255);

        let mut prev = u8::MAX;
        for step in 1..=250 {
            let t = step as f64 * 0.01;
            let alpha = pulses.update(t)[0].alpha;
            assert!(alpha <= prev, "alpha rose at t={t}");
            if t > params.fade_window_s {
                assert_eq!(alpha, params.alpha_floor);
            }
            prev = alpha;
        }
    }

    #[test]
    fn test_radius_formula() {
        let palette = Palette::default();
        let mut pulses = manager();
        pulses.spawn(&beat(1.0, 2.0), 0.0, &palette);
        let out = pulses.update(2.0);
        // 50 * 1.0 * (1 + 0.2 * 1.0)
        assert!((out[0].radius - 60.0).abs() < 1e-4);
        assert_eq!(out[0].center, [300.0, 200.0]);
    }

    #[test]
    fn test_out_of_range_strength_is_clamped() {
        let palette = Palette::default();
        let mut pulses = manager();
        pulses.spawn(&beat(0.0, 1.0), 7.0, &palette);
        pulses.spawn(&beat(0.1, 1.0), f32::NAN, &palette);

        assert!((pulses.active()[0].scale_factor - 2.5).abs() < 1e-6);
        assert!((pulses.active()[1].scale_factor - 1.0).abs() < 1e-6);
    }
}
