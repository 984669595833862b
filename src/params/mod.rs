//! Parameter definitions with physical units and documented semantics.
//!
//! All tunable constants are extracted here with:
//! - Units (seconds, pixels, Hz, BPM)
//! - Documented ranges and meanings
//! - Defaults matching the reference look

mod audio;
mod pulse;
mod render;

// Re-export all types
pub use audio::AnalysisConfig;
pub use pulse::{PulseParams, DEFAULT_PALETTE};
pub use render::{RecordingConfig, RenderConfig};
