//! Audio output boundary.

mod synth;

pub use synth::{MidiSynth, SynthError, Synthesizer};
