//! The playback state machine.
//!
//! Owns the loaded event list and the derived visual note track, and
//! advances both against the wall clock once per rendering frame. Audio
//! dispatch and visual activation run on two independent cursors that
//! only rewind together, when the message stream is exhausted.

use crate::audio::Synthesizer;
use crate::config::Settings;
use crate::midi::{generate_note_track, load_events, Event, LoadError, VisualNote, PIANO_LOW};
use crate::playback::ActiveNote;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Progress through an ordered event sequence: the next pending index
/// plus the wall-clock time accumulated toward it.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    index: usize,
    accumulated: f64,
}

impl Cursor {
    fn rewind(&mut self) {
        self.index = 0;
        self.accumulated = 0.0;
    }
}

/// Plays one loaded MIDI file.
///
/// The event and note lists are built once at construction and are
/// read-only afterwards; loading a different file means discarding the
/// engine (after stopping it) and constructing a new one.
///
/// All mutation happens synchronously inside the public methods from a
/// single caller per frame; `tick` never blocks and never fails.
pub struct PlaybackEngine {
    /// Dispatchable events, starting with the synthetic lead-in delay.
    events: Vec<Event>,
    /// Visual notes ordered by onset.
    notes: Vec<VisualNote>,
    /// Seconds a note scrolls before its audio onset.
    scroll_secs: f64,
    message_cursor: Cursor,
    note_cursor: Cursor,
    /// Pressed state per MIDI note. Missing entries mean released; the
    /// lookup supplies that default rather than inserting it.
    pressed: HashMap<u8, (u8, bool)>,
    /// Notes currently on screen, in activation order.
    active: Vec<ActiveNote>,
    playing: bool,
    last_frame: Option<Instant>,
    /// Set once per cycle when the note track runs out while messages
    /// remain, so cursor divergence is visible in the logs.
    drift_logged: bool,
}

impl PlaybackEngine {
    /// Builds an engine from a loaded event list.
    ///
    /// The visual note track is generated from the events after the
    /// synthetic lead-in, with the clock seeded so onsets line up with
    /// dispatch times.
    pub fn new(events: Vec<Event>, settings: &Settings) -> Self {
        let lead_in = events.first().map(|e| e.delta).unwrap_or(0.0);
        let notes = generate_note_track(events.get(1..).unwrap_or_default(), lead_in);

        Self {
            events,
            notes,
            scroll_secs: settings.scroll_secs,
            message_cursor: Cursor::default(),
            note_cursor: Cursor::default(),
            pressed: HashMap::new(),
            active: Vec::new(),
            playing: false,
            last_frame: None,
            drift_logged: false,
        }
    }

    /// Loads a MIDI file and builds an engine for it.
    ///
    /// All-or-nothing: on error no engine is produced and the caller
    /// keeps its current one.
    pub fn load<P: AsRef<Path>>(path: P, settings: &Settings) -> Result<Self, LoadError> {
        let events = load_events(path, settings.scroll_secs)?;
        Ok(Self::new(events, settings))
    }

    /// Begins (or resumes) playback. No-op if already playing.
    pub fn start(&mut self) {
        self.playing = true;
    }

    /// Pauses playback and silences the synthesizer.
    ///
    /// Clearing the frame anchor makes the next `tick` after a resume
    /// re-anchor instead of dispatching the whole pause as one delta.
    pub fn stop(&mut self, synth: &mut dyn Synthesizer) {
        self.playing = false;
        self.last_frame = None;
        if let Err(e) = synth.flush() {
            tracing::warn!("synthesizer flush failed: {e}");
        }
    }

    /// Toggles between playing and stopped.
    pub fn toggle(&mut self, synth: &mut dyn Synthesizer) {
        if self.playing {
            self.stop(synth);
        } else {
            self.start();
        }
    }

    /// Rewinds to the beginning: forces Stopped, zeroes both cursors,
    /// clears pressed and on-screen state, and flushes the synthesizer.
    pub fn reset(&mut self, synth: &mut dyn Synthesizer) {
        self.stop(synth);
        self.message_cursor.rewind();
        self.note_cursor.rewind();
        self.pressed.clear();
        self.active.clear();
        self.drift_logged = false;
    }

    /// Advances playback to `now`. The only mutating call while playing;
    /// a no-op while stopped.
    ///
    /// The first tick after starting anchors the timing and dispatches
    /// nothing. Every later tick ages the on-screen notes, activates all
    /// visual notes that have come due, dispatches all due messages in
    /// file order, and auto-resets once the message stream is exhausted.
    pub fn tick(&mut self, now: Instant, synth: &mut dyn Synthesizer) {
        if !self.playing {
            return;
        }
        let Some(last) = self.last_frame else {
            self.last_frame = Some(now);
            return;
        };
        let delta = now.duration_since(last).as_secs_f64();
        self.last_frame = Some(now);

        // Age on-screen notes and lazily drop the ones that scrolled out.
        let scroll_secs = self.scroll_secs;
        for active in &mut self.active {
            active.advance(delta);
        }
        self.active.retain(|n| n.in_view(scroll_secs));

        // Activate visual notes. One large delta may span several short
        // inter-onset gaps; they all activate this frame, in order.
        self.note_cursor.accumulated += delta;
        while let Some(&note) = self.notes.get(self.note_cursor.index) {
            if note.gap > self.note_cursor.accumulated {
                break;
            }
            self.note_cursor.accumulated -= note.gap;
            self.active.push(ActiveNote::new(note));
            self.note_cursor.index += 1;
        }

        // Dispatch due messages. A failed send is logged and skipped;
        // the cursor still advances so playback continues.
        self.message_cursor.accumulated += delta;
        while let Some(event) = self.events.get(self.message_cursor.index) {
            if event.delta > self.message_cursor.accumulated {
                break;
            }
            self.message_cursor.accumulated -= event.delta;
            if let Err(e) = synth.send(event) {
                tracing::warn!("synthesizer dispatch failed: {e}");
            }
            if let Some(note) = event.note() {
                self.pressed.insert(note, (event.channel, event.is_onset()));
            }
            self.message_cursor.index += 1;
        }

        if self.note_cursor.index >= self.notes.len()
            && self.message_cursor.index < self.events.len()
            && !self.drift_logged
        {
            self.drift_logged = true;
            tracing::debug!(
                remaining = self.events.len() - self.message_cursor.index,
                "visual note track exhausted before the message stream"
            );
        }

        // Both cursors restart together, even if one lagged the other.
        if self.message_cursor.index >= self.events.len() {
            self.reset(synth);
        }
    }

    /// Whether the engine is currently playing.
    pub fn playing(&self) -> bool {
        self.playing
    }

    /// Returns the channel a piano key (0-87) is currently pressed on,
    /// or `None` when it is up. Keys never seen default to released.
    pub fn pressed_channel(&self, key: u8) -> Option<u8> {
        match self.pressed.get(&(key + PIANO_LOW)) {
            Some(&(channel, true)) => Some(channel),
            _ => None,
        }
    }

    /// Notes currently on screen, in activation order.
    pub fn active_notes(&self) -> &[ActiveNote] {
        &self.active
    }

    /// The configured scroll duration in seconds.
    pub fn scroll_secs(&self) -> f64 {
        self.scroll_secs
    }
}
