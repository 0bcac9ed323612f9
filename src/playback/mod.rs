//! Playback state machine and per-note scroll tracking.

mod engine;
mod scroll;

pub use engine::PlaybackEngine;
pub use scroll::ActiveNote;
