//! notefall - a terminal MIDI player with a falling-note piano display.
//!
//! This library provides the playback engine and the terminal UI around it.

pub mod app;
pub mod audio;
pub mod config;
pub mod midi;
pub mod playback;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{MidiSynth, SynthError, Synthesizer};
pub use config::{ConfigError, Settings};
pub use midi::{Event, EventKind, LoadError, VisualNote};
pub use playback::PlaybackEngine;
