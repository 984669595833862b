//! Beatlight - Beat-synchronized pulse visualizer
//!
//! Analyzes a WAV track up front, then plays it while a pulse blooms on
//! every beat and a scrolling trace follows the onset strength.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use beatlight::audio::{Analysis, AudioPlayback, Track};
use beatlight::cli::Args;
use beatlight::clock::{FrameClock, PlaybackClock};
use beatlight::params::{AnalysisConfig, RecordingConfig, RenderConfig};
use beatlight::rendering::{geometry, RenderSystem};
use beatlight::sync::{FrameOutput, Palette, SyncEngine};

/// Ticks between window title refreshes
const TITLE_REFRESH_TICKS: usize = 10;

/// Where playback time comes from
enum Clock {
    /// Live audio through the output device
    Live(AudioPlayback),
    /// Offline capture, one frame period per tick
    Recording {
        clock: FrameClock,
        config: RecordingConfig,
    },
}

impl Clock {
    fn as_playback(&self) -> &dyn PlaybackClock {
        match self {
            Clock::Live(playback) => playback,
            Clock::Recording { clock, .. } => clock,
        }
    }
}

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Sync state
    track: Track,
    engine: SyncEngine,
    clock: Option<Clock>,

    // Configuration
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,

    // Tick pacing
    next_tick: Instant,
    ticks: usize,

    /// First fatal error, returned from `main`
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(
        track: Track,
        engine: SyncEngine,
        render_config: RenderConfig,
        recording_config: Option<RecordingConfig>,
    ) -> Self {
        Self {
            window: None,
            render_system: None,
            track,
            engine,
            clock: None,
            render_config,
            recording_config,
            next_tick: Instant::now(),
            ticks: 0,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Beatlight")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("failed to create window")?,
        );

        // Initialize rendering system
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.render_config,
            self.recording_config.clone(),
        ))?;

        // Start the clock last so the first tick lines up with the first sample heard
        let clock = match self.recording_config.clone() {
            Some(config) => {
                let audio_path = config.audio_path();
                self.track
                    .write_wav(&audio_path, config.duration_secs as f64)
                    .with_context(|| format!("failed to write {}", audio_path))?;
                info!(
                    "Recording {:.1}s at {} fps ({} frames) to {}",
                    config.duration_secs,
                    config.fps,
                    config.total_frames(),
                    config.output_dir
                );
                Clock::Recording {
                    clock: FrameClock::new(config.fps, config.duration_secs as f64),
                    config,
                }
            }
            None => Clock::Live(AudioPlayback::start(&self.track)?),
        };

        info!("Beatlight is running, press ESC to quit");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.clock = Some(clock);
        self.next_tick = Instant::now();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };

        // Recording renders as fast as frames can be captured
        if matches!(self.clock, Some(Clock::Recording { .. })) {
            event_loop.set_control_flow(ControlFlow::Poll);
            window.request_redraw();
            return;
        }

        let now = Instant::now();
        if now >= self.next_tick {
            window.request_redraw();
            let interval = Duration::from_secs_f64(self.render_config.tick_interval_s());
            self.next_tick += interval;
            // Skip missed ticks instead of bursting to catch up
            if self.next_tick < now {
                self.next_tick = now + interval;
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    /// Run one tick and draw its frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(clock) = self.clock.as_ref() else {
            return;
        };

        // One clock snapshot per tick
        let playback = clock.as_playback();
        let time_s = playback.position_secs();
        let finished = playback.is_finished();
        let frame_num = match clock {
            Clock::Recording { clock, .. } => clock.frame(),
            Clock::Live(_) => self.ticks,
        };

        if finished {
            if let Some(Clock::Recording { config, .. }) = &self.clock {
                info!(
                    "Recording complete: {} frames in {}",
                    frame_num,
                    config.frames_dir()
                );
                event_loop.exit();
                return;
            }
        }

        let frame = self.engine.tick(time_s);
        let vertices = geometry::build_scene(&frame, &self.render_config);

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };
        let result = render_system.render(&vertices, frame_num);
        match &result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost or outdated, reconfiguring");
                render_system.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow::anyhow!("GPU out of memory"));
                return;
            }
            Err(e) => warn!("Dropped frame: {:?}", e),
        }

        if let Some(Clock::Recording { clock, .. }) = self.clock.as_mut() {
            advance_after_render(clock, &result);
        }

        if self.ticks % TITLE_REFRESH_TICKS == 0 {
            if let Some(window) = &self.window {
                window.set_title(&title_for(&frame));
            }
        }
        self.ticks += 1;
    }
}

/// Step the recording clock only when the frame was presented and captured;
/// a failed frame is rendered again at the same time
fn advance_after_render(
    clock: &mut FrameClock,
    result: &std::result::Result<(), wgpu::SurfaceError>,
) {
    if result.is_ok() {
        clock.advance();
    }
}

/// Readouts shown in the window title
fn title_for(frame: &FrameOutput) -> String {
    format!(
        "Beatlight | Time: {:.2}s | BPM: {:.0} | Strength: {:.2} | Beat: {:.2}",
        frame.time, frame.tempo_bpm, frame.raw_strength, frame.last_beat_strength
    )
}

fn print_analysis(analysis: &Analysis) {
    println!("Tempo:    {:.1} BPM", analysis.tempo_bpm);
    println!("Duration: {:.2}s", analysis.duration_secs);
    println!("Beats:    {}", analysis.beat_times.len());
    println!("Peak onset strength: {:.3}", analysis.curve.global_max());
    for (i, time) in analysis.beat_times.iter().take(16).enumerate() {
        println!("  beat {:>3}: {:>8.3}s", i + 1, time);
    }
    if analysis.beat_times.len() > 16 {
        println!("  ...");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if !args.audio_path.is_file() {
        bail!("audio file not found: {}", args.audio_path.display());
    }

    let track = Track::load(&args.audio_path)
        .with_context(|| format!("failed to load {}", args.audio_path.display()))?;
    let analysis = Analysis::from_track(&track, &AnalysisConfig::default())
        .context("beat analysis failed")?;

    if args.analyze {
        print_analysis(&analysis);
        return Ok(());
    }

    let render_config = args.render_config();
    let recording_config = args.create_recording_config()?;

    let events = analysis.beat_events()?;
    let engine = SyncEngine::new(
        analysis.curve,
        events,
        Palette::default(),
        args.pulse_params(),
        &render_config,
        analysis.tempo_bpm,
    );

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(track, engine, render_config, recording_config);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatlight::sync::Rgb;

    fn frame() -> FrameOutput {
        FrameOutput {
            time: 12.5,
            pulses: Vec::new(),
            history: Vec::new(),
            color: Rgb::new(255, 160, 130),
            strength: 0.25,
            raw_strength: 2.5,
            last_beat_strength: 7.0,
            global_max: 10.0,
            tempo_bpm: 117.45,
        }
    }

    #[test]
    fn test_title_shows_current_strength() {
        let title = title_for(&frame());
        assert!(title.contains("Time: 12.50s"), "{title}");
        assert!(title.contains("BPM: 117"), "{title}");
        assert!(title.contains("Strength: 2.50"), "{title}");
        assert!(title.contains("Beat: 7.00"), "{title}");
    }

    #[test]
    fn test_failed_frame_is_retried_at_same_time() {
        let mut clock = FrameClock::new(60, 10.0);

        advance_after_render(&mut clock, &Err(wgpu::SurfaceError::Outdated));
        advance_after_render(&mut clock, &Err(wgpu::SurfaceError::Lost));
        advance_after_render(&mut clock, &Err(wgpu::SurfaceError::Timeout));
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.position_secs(), 0.0);

        advance_after_render(&mut clock, &Ok(()));
        assert_eq!(clock.frame(), 1);
    }
}
