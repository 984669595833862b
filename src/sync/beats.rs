//! Beat events and the monotonic cursor that fires them.

use crate::error::{Error, Result};

use super::strength::{StrengthCurve, StrengthSampler};

/// Fallback gap after the final beat (seconds)
const LAST_BEAT_GAP_S: f64 = 1.0;

/// One detected beat
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatEvent {
    /// Beat time (seconds)
    pub time: f64,
    /// Raw onset strength at `time`
    pub strength: f32,
    /// Time of the following beat, or `time + 1.0` for the last beat
    pub next_time: f64,
}

impl BeatEvent {
    /// Build the event sequence from ordered beat times
    ///
    /// Times must be finite and strictly increasing.
    pub fn sequence(times: &[f64], curve: &StrengthCurve) -> Result<Vec<Self>> {
        let sampler = StrengthSampler::new(curve);
        let mut events = Vec::with_capacity(times.len());

        for (index, &time) in times.iter().enumerate() {
            if !time.is_finite() || (index > 0 && time <= times[index - 1]) {
                return Err(Error::NonMonotonicBeats { index, time });
            }
            let next_time = times
                .get(index + 1)
                .copied()
                .unwrap_or(time + LAST_BEAT_GAP_S);
            events.push(BeatEvent {
                time,
                strength: sampler.sample_at(time),
                next_time,
            });
        }

        Ok(events)
    }
}

/// Forward-only pointer into the beat sequence
///
/// Each event is emitted exactly once, the first time playback reaches it.
#[derive(Debug, Clone)]
pub struct BeatCursor {
    events: Vec<BeatEvent>,
    next_index: usize,
}

impl BeatCursor {
    pub fn new(events: Vec<BeatEvent>) -> Self {
        Self {
            events,
            next_index: 0,
        }
    }

    /// Emit every not-yet-fired event with `event.time <= time_s`, in order
    pub fn advance_to(&mut self, time_s: f64) -> Vec<BeatEvent> {
        let start = self.next_index;
        while self.next_index < self.events.len() && time_s >= self.events[self.next_index].time
        {
            self.next_index += 1;
        }
        self.events[start..self.next_index].to_vec()
    }

    /// Beats not fired yet
    pub fn remaining(&self) -> usize {
        self.events.len() - self.next_index
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_index == self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_curve() -> StrengthCurve {
        StrengthCurve::new(vec![1.0; 1000], 100, 1).unwrap()
    }

    fn times(events: &[BeatEvent]) -> Vec<f64> {
        events.iter().map(|e| e.time).collect()
    }

    #[test]
    fn test_cursor_fires_once_and_catches_up() {
        let events = BeatEvent::sequence(&[1.0, 2.0, 3.0], &flat_curve()).unwrap();
        let mut cursor = BeatCursor::new(events);

        assert!(cursor.advance_to(0.5).is_empty());
        assert_eq!(times(&cursor.advance_to(1.5)), vec![1.0]);
        assert_eq!(times(&cursor.advance_to(5.0)), vec![2.0, 3.0]);
        assert!(cursor.advance_to(10.0).is_empty());
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_cursor_fires_on_exact_beat_time() {
        let events = BeatEvent::sequence(&[1.0], &flat_curve()).unwrap();
        let mut cursor = BeatCursor::new(events);
        assert_eq!(cursor.advance_to(1.0).len(), 1);
        assert!(cursor.advance_to(1.0).is_empty());
    }

    #[test]
    fn test_cursor_does_not_regress() {
        let events = BeatEvent::sequence(&[1.0, 2.0], &flat_curve()).unwrap();
        let mut cursor = BeatCursor::new(events);
        cursor.advance_to(1.5);
        assert!(cursor.advance_to(0.0).is_empty());
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_empty_sequence_never_fires() {
        let mut cursor = BeatCursor::new(Vec::new());
        assert!(cursor.is_exhausted());
        assert!(cursor.advance_to(1e6).is_empty());
    }

    #[test]
    fn test_next_time_links_and_sentinel() {
        let events = BeatEvent::sequence(&[0.5, 1.2, 2.0], &flat_curve()).unwrap();
        assert_eq!(events[0].next_time, 1.2);
        assert_eq!(events[1].next_time, 2.0);
        assert_eq!(events[2].next_time, 3.0);
    }

    #[test]
    fn test_strength_sampled_at_beat_time() {
        // 10 frames/s
        let curve = StrengthCurve::new(vec![0.0, 1.0, 2.0, 3.0], 10, 1).unwrap();
        let events = BeatEvent::sequence(&[0.15, 0.25], &curve).unwrap();
        assert_eq!(events[0].strength, 1.0);
        assert_eq!(events[1].strength, 2.0);
    }

    #[test]
    fn test_rejects_unordered_times() {
        let curve = flat_curve();
        assert!(BeatEvent::sequence(&[1.0, 1.0], &curve).is_err());
        assert!(BeatEvent::sequence(&[2.0, 1.0], &curve).is_err());
        assert!(BeatEvent::sequence(&[f64::NAN], &curve).is_err());
    }
}
