//! Per-tick orchestration of the beat-synchronization state.

use tracing::debug;

use crate::params::{PulseParams, RenderConfig};

use super::beats::{BeatCursor, BeatEvent};
use super::history::HistoryBuffer;
use super::palette::{Palette, Rgb};
use super::pulses::{PulseManager, RenderablePulse};
use super::strength::{StrengthCurve, StrengthSampler};

/// Everything the compositor needs to draw one frame
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Playback time this frame was derived from (seconds)
    pub time: f64,
    pub pulses: Vec<RenderablePulse>,
    /// Raw strengths, oldest first
    pub history: Vec<f32>,
    /// Trace color for the current strength
    pub color: Rgb,
    /// Current strength in `[0, 1]`
    pub strength: f32,
    /// Current raw onset strength
    pub raw_strength: f32,
    /// Raw strength of the most recently fired beat
    pub last_beat_strength: f32,
    /// Normalization reference for the trace
    pub global_max: f32,
    /// Track tempo, passed through from analysis
    pub tempo_bpm: f32,
}

/// Owns all mutable sync state; derives each frame from playback time alone
pub struct SyncEngine {
    curve: StrengthCurve,
    palette: Palette,
    cursor: BeatCursor,
    pulses: PulseManager,
    history: HistoryBuffer,
    tempo_bpm: f32,
    last_time: f64,
    last_beat_strength: f32,
}

impl SyncEngine {
    pub fn new(
        curve: StrengthCurve,
        events: Vec<BeatEvent>,
        palette: Palette,
        pulse_params: PulseParams,
        render_config: &RenderConfig,
        tempo_bpm: f32,
    ) -> Self {
        Self {
            curve,
            palette,
            cursor: BeatCursor::new(events),
            pulses: PulseManager::new(pulse_params, render_config.center()),
            history: HistoryBuffer::new(render_config.history_capacity()),
            tempo_bpm,
            last_time: 0.0,
            last_beat_strength: 0.0,
        }
    }

    /// Advance to `time_s` and produce the frame for it
    ///
    /// `time_s` must be read from the clock once per tick. Times earlier than
    /// the previous tick are held at the previous tick.
    pub fn tick(&mut self, time_s: f64) -> FrameOutput {
        let time_s = if time_s.is_finite() && time_s >= self.last_time {
            time_s
        } else {
            debug!(
                "Clock went backwards ({:.4}s < {:.4}s), holding",
                time_s, self.last_time
            );
            self.last_time
        };
        self.last_time = time_s;

        let sampler = StrengthSampler::new(&self.curve);

        for event in self.cursor.advance_to(time_s) {
            let strength = sampler.normalized_at(event.time);
            self.pulses.spawn(&event, strength, &self.palette);
            self.last_beat_strength = event.strength;
        }

        let pulses = self.pulses.update(time_s);

        let raw_strength = sampler.sample_at(time_s);
        let strength = self.curve.normalize(raw_strength);
        self.history.push(raw_strength);

        FrameOutput {
            time: time_s,
            pulses,
            history: self.history.snapshot(),
            color: self.palette.color_for(strength),
            strength,
            raw_strength,
            last_beat_strength: self.last_beat_strength,
            global_max: self.curve.global_max(),
            tempo_bpm: self.tempo_bpm,
        }
    }

    pub fn active_pulses(&self) -> usize {
        self.pulses.len()
    }

    pub fn beats_remaining(&self) -> usize {
        self.cursor.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 100 frames/s curve whose maximum is 10.0
    fn scenario_curve() -> StrengthCurve {
        let mut values = vec![2.0f32; 400];
        values[49..=51].fill(10.0); // around 0.5s
        values[119..=121].fill(5.0); // around 1.2s
        StrengthCurve::new(values, 100, 1).unwrap()
    }

    fn engine_with(times: &[f64]) -> SyncEngine {
        let curve = scenario_curve();
        let events = BeatEvent::sequence(times, &curve).unwrap();
        SyncEngine::new(
            curve,
            events,
            Palette::default(),
            PulseParams::default(),
            &RenderConfig::default(),
            120.0,
        )
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut engine = engine_with(&[0.5, 1.2, 2.0]);

        let frame = engine.tick(0.0);
        assert!(frame.pulses.is_empty());

        let frame = engine.tick(0.6);
        assert_eq!(frame.pulses.len(), 1);
        let first = frame.pulses[0];
        // Full-strength beat: 2.5x scale, last palette color
        assert_eq!(first.color, Palette::default().color_for(1.0));

        let frame = engine.tick(1.0);
        assert_eq!(frame.pulses.len(), 1);

        let frame = engine.tick(1.3);
        assert_eq!(frame.pulses.len(), 2);
        assert!(frame.pulses.iter().any(|p| p.color == first.color));
        assert_eq!(engine.active_pulses(), 2);

        // First pulse deadline 0.5 + 0.7 + 0.6 = 1.8; third beat fires at 2.0
        let frame = engine.tick(2.1);
        assert_eq!(frame.pulses.len(), 2);
        assert!(frame.pulses.iter().all(|p| p.color != first.color));
        assert_eq!(engine.beats_remaining(), 0);
    }

    #[test]
    fn test_pulse_drawn_on_its_deadline_tick() {
        let mut engine = engine_with(&[0.5, 1.2, 2.0]);
        let first = engine.tick(0.6).pulses[0];

        // Deadline 1.2 + 0.6
        let frame = engine.tick(1.8);
        assert_eq!(frame.pulses.len(), 2);
        assert!(frame.pulses.iter().any(|p| p.color == first.color));

        let frame = engine.tick(1.8000001);
        assert_eq!(frame.pulses.len(), 1);
        assert!(frame.pulses.iter().all(|p| p.color != first.color));
    }

    #[test]
    fn test_history_tracks_raw_samples() {
        let mut engine = engine_with(&[]);
        engine.tick(0.0);
        let frame = engine.tick(0.5);
        assert_eq!(frame.history, vec![2.0, 10.0]);
        assert_eq!(frame.raw_strength, 10.0);
        assert!((frame.strength - 1.0).abs() < 1e-6);
        assert_eq!(frame.color, Palette::default().color_for(1.0));
    }

    #[test]
    fn test_empty_beats_still_render_trace() {
        let mut engine = engine_with(&[]);
        for i in 0..10 {
            let frame = engine.tick(i as f64 * 0.1);
            assert!(frame.pulses.is_empty());
            assert_eq!(frame.history.len(), i + 1);
        }
    }

    #[test]
    fn test_backward_time_is_held() {
        let mut engine = engine_with(&[0.5]);
        engine.tick(1.0);
        let frame = engine.tick(0.2);
        assert_eq!(frame.time, 1.0);
        assert_eq!(frame.pulses.len(), 1);
    }

    #[test]
    fn test_last_beat_strength_readout() {
        let mut engine = engine_with(&[0.5, 1.2]);
        assert_eq!(engine.tick(0.0).last_beat_strength, 0.0);
        assert_eq!(engine.tick(0.6).last_beat_strength, 10.0);
        assert_eq!(engine.tick(1.25).last_beat_strength, 5.0);
    }
}
