//! Playback-clock-driven beat synchronization.
//!
//! Everything here is a pure function of playback time plus a little owned
//! state (beat cursor, live pulses, strength history). No I/O, no locking:
//! the render thread owns a [`SyncEngine`] and calls [`SyncEngine::tick`]
//! once per frame.

mod beats;
mod engine;
mod history;
mod palette;
mod pulses;
mod strength;

// Re-export public types
pub use beats::{BeatCursor, BeatEvent};
pub use engine::{FrameOutput, SyncEngine};
pub use history::HistoryBuffer;
pub use palette::{Palette, Rgb};
pub use pulses::{ActivePulse, PulseManager, RenderablePulse};
pub use strength::{StrengthCurve, StrengthSampler};
