//! Rendering and recording configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Canvas width (pixels); also sizes the strength history
    pub window_width: u32,

    /// Canvas height (pixels)
    pub window_height: u32,

    /// Tick cadence (Hz)
    pub target_fps: u32,

    /// Horizontal inset of the strength trace (pixels)
    pub trace_margin_px: f32,

    /// Distance from the bottom edge to the trace baseline (pixels)
    pub trace_baseline_px: f32,

    /// Height of a full-strength trace sample (pixels)
    pub trace_height_px: f32,

    /// Trace stroke width (pixels)
    pub trace_width_px: f32,

    /// Clear color (sRGB, 0-255)
    pub background: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 600,
            window_height: 400,
            target_fps: 60,
            trace_margin_px: 20.0,
            trace_baseline_px: 50.0,
            trace_height_px: 100.0,
            trace_width_px: 2.0,
            background: [20, 20, 20],
        }
    }
}

impl RenderConfig {
    /// Number of strength samples kept for the scrolling trace
    pub fn history_capacity(&self) -> usize {
        (self.window_width as usize).saturating_sub(20)
    }

    /// Canvas center, where pulses are drawn
    pub fn center(&self) -> [f32; 2] {
        [
            (self.window_width / 2) as f32,
            (self.window_height / 2) as f32,
        ]
    }

    /// Duration of one tick (seconds)
    pub fn tick_interval_s(&self) -> f64 {
        1.0 / self.target_fps.max(1) as f64
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32, fps: u32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: fps.max(1),
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_capacity_follows_width() {
        let config = RenderConfig::default();
        assert_eq!(config.history_capacity(), 580);

        let narrow = RenderConfig {
            window_width: 10,
            ..Default::default()
        };
        assert_eq!(narrow.history_capacity(), 0);
    }

    #[test]
    fn test_recording_total_frames() {
        let config = RecordingConfig::new(2.5, 60);
        assert_eq!(config.total_frames(), 150);
        assert_eq!(config.frames_dir(), "recording/frames");
    }
}
