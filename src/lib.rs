//! Beatlight library - Beat-synchronized audio visualization

pub mod audio;
pub mod cli;
pub mod clock;
pub mod error;
pub mod params;
pub mod rendering;
pub mod sync;

pub use error::{Error, Result};
