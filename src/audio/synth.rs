//! MIDI synthesis through rustysynth and rodio.
//!
//! The engine only sees the [`Synthesizer`] trait: dispatch an event,
//! or flush everything that is sounding. The production implementation
//! renders through rustysynth into a continuously running rodio stream.

use crate::midi::{Event, EventKind};
use rodio::{OutputStream, OutputStreamHandle, Source};
use rustysynth::{SoundFont, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Audio buffer size for low-latency playback.
/// Smaller = lower latency but higher CPU usage.
const BUFFER_SIZE: usize = 256;

/// Errors at the audio output boundary.
///
/// Construction failures are fatal to the caller; per-event failures are
/// reported by the engine and playback continues visually.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SoundFont error: {0}")]
    SoundFont(String),
    #[error("audio output error: {0}")]
    Output(String),
    #[error("synthesizer unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget MIDI output.
///
/// `send` dispatches one event; `flush` silences everything, and is
/// issued on stop/reset and before an engine is discarded.
pub trait Synthesizer {
    fn send(&mut self, event: &Event) -> Result<(), SynthError>;
    fn flush(&mut self) -> Result<(), SynthError>;
}

/// Audio source that pulls samples out of the synthesizer.
/// Implements rodio's Source trait for playback.
struct SynthSource {
    synth: Arc<Mutex<rustysynth::Synthesizer>>,
    left_buf: Vec<f32>,
    right_buf: Vec<f32>,
    /// Current position in the buffer.
    buf_pos: usize,
    /// Current channel (0 = left, 1 = right).
    channel: usize,
}

impl SynthSource {
    fn new(synth: Arc<Mutex<rustysynth::Synthesizer>>) -> Self {
        Self {
            synth,
            left_buf: vec![0.0; BUFFER_SIZE],
            right_buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
            channel: 0,
        }
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        // Render a new buffer when the current one is exhausted. The
        // synthesizer outputs silence when nothing is sounding.
        if self.buf_pos >= BUFFER_SIZE {
            if let Ok(mut synth) = self.synth.lock() {
                synth.render(&mut self.left_buf, &mut self.right_buf);
            } else {
                self.left_buf.fill(0.0);
                self.right_buf.fill(0.0);
            }
            self.buf_pos = 0;
        }

        // Interleave stereo samples: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2 // Stereo
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

/// The production [`Synthesizer`]: rustysynth rendering into a rodio
/// output stream that runs for the lifetime of the app.
pub struct MidiSynth {
    synth: Arc<Mutex<rustysynth::Synthesizer>>,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
}

impl MidiSynth {
    /// Opens the default audio output and loads a SoundFont.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError`] if the SoundFont cannot be read or parsed,
    /// or if no audio output is available.
    pub fn new<P: AsRef<Path>>(soundfont_path: P) -> Result<Self, SynthError> {
        let mut file = BufReader::new(File::open(soundfont_path.as_ref())?);
        let soundfont = Arc::new(
            SoundFont::new(&mut file).map_err(|e| SynthError::SoundFont(format!("{e:?}")))?,
        );

        let settings = SynthesizerSettings::new(SAMPLE_RATE as i32);
        let synth = rustysynth::Synthesizer::new(&soundfont, &settings)
            .map_err(|e| SynthError::SoundFont(format!("{e:?}")))?;
        let synth = Arc::new(Mutex::new(synth));

        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| SynthError::Output(e.to_string()))?;

        let source = SynthSource::new(Arc::clone(&synth));
        stream_handle
            .play_raw(source)
            .map_err(|e| SynthError::Output(e.to_string()))?;

        tracing::info!(
            soundfont = %soundfont_path.as_ref().display(),
            "audio output ready"
        );

        Ok(Self {
            synth,
            _stream: stream,
            _stream_handle: stream_handle,
        })
    }
}

impl Synthesizer for MidiSynth {
    fn send(&mut self, event: &Event) -> Result<(), SynthError> {
        let mut synth = self
            .synth
            .lock()
            .map_err(|_| SynthError::Unavailable("audio thread poisoned the lock".to_string()))?;

        match event.kind {
            EventKind::NoteOn { note, velocity } if velocity > 0 => {
                synth.note_on(event.channel as i32, note as i32, velocity as i32);
            }
            EventKind::NoteOn { note, .. } | EventKind::NoteOff { note } => {
                synth.note_off(event.channel as i32, note as i32);
            }
            EventKind::ControlChange { controller, value } => {
                // Control change is MIDI command 0xB0.
                synth.process_midi_message(
                    event.channel as i32,
                    0xB0,
                    controller as i32,
                    value as i32,
                );
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SynthError> {
        let mut synth = self
            .synth
            .lock()
            .map_err(|_| SynthError::Unavailable("audio thread poisoned the lock".to_string()))?;
        synth.note_off_all(true);
        Ok(())
    }
}
