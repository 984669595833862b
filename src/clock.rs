//! Playback time sources.

/// Monotonic playback position, sampled once per tick
pub trait PlaybackClock {
    /// Seconds of the track played so far
    fn position_secs(&self) -> f64;

    /// True once the whole track has been played
    fn is_finished(&self) -> bool;
}

/// Deterministic clock for offline recording: one step per rendered frame
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame: usize,
    fps: u32,
    duration_secs: f64,
}

impl FrameClock {
    pub fn new(fps: u32, duration_secs: f64) -> Self {
        Self {
            frame: 0,
            fps: fps.max(1),
            duration_secs,
        }
    }

    /// Move to the next frame
    pub fn advance(&mut self) {
        self.frame += 1;
    }

    pub fn frame(&self) -> usize {
        self.frame
    }
}

impl PlaybackClock for FrameClock {
    fn position_secs(&self) -> f64 {
        self.frame as f64 / self.fps as f64
    }

    fn is_finished(&self) -> bool {
        self.position_secs() >= self.duration_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock_steps_by_frame_period() {
        let mut clock = FrameClock::new(50, 1.0);
        assert_eq!(clock.position_secs(), 0.0);
        for _ in 0..25 {
            clock.advance();
        }
        assert!((clock.position_secs() - 0.5).abs() < 1e-12);
        assert!(!clock.is_finished());
        for _ in 0..25 {
            clock.advance();
        }
        assert!(clock.is_finished());
        assert_eq!(clock.frame(), 50);
    }
}
