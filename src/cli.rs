//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::error::Result;
use crate::params::{PulseParams, RecordingConfig, RenderConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Beatlight")]
#[command(about = "Beat-synchronized pulse visualizer for WAV tracks", long_about = None)]
pub struct Args {
    /// WAV file to analyze and play
    #[arg(value_name = "AUDIO")]
    pub audio_path: PathBuf,

    /// Record frames and audio instead of playing live (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Print the beat analysis and exit without opening a window
    #[arg(long)]
    pub analyze: bool,

    /// Tick rate (frames per second)
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: u32,

    /// Canvas width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "600")]
    pub width: u32,

    /// Canvas height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "400")]
    pub height: u32,

    /// Radius of a zero-strength pulse (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "50")]
    pub base_radius: f32,
}

impl Args {
    /// Render configuration with command-line overrides applied
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            target_fps: self.fps.max(1),
            ..Default::default()
        }
    }

    /// Pulse parameters with command-line overrides applied
    pub fn pulse_params(&self) -> PulseParams {
        PulseParams {
            base_radius_px: self.base_radius.max(0.0),
            ..Default::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        let config = RecordingConfig::new(duration.max(0.0), self.fps);

        // Create output directories
        std::fs::create_dir_all(config.frames_dir())?;
        std::fs::create_dir_all(&config.output_dir)?;

        Ok(Some(config))
    }
}
