//! MIDI data structures for playback.
//!
//! This module provides the event types produced by the loader and the
//! visual note track derived from them, plus helpers for mapping MIDI
//! note numbers onto the 88-key piano.

mod loader;
mod notes;

pub use loader::{load_events, LoadError};
#[allow(unused_imports)]
pub use loader::events_from_smf;
pub use notes::{generate_note_track, VisualNote};

/// Lowest MIDI note on an 88-key piano (A0).
pub const PIANO_LOW: u8 = 21;

/// Highest MIDI note on an 88-key piano (C8).
pub const PIANO_HIGH: u8 = 108;

/// Number of keys on the piano display.
pub const PIANO_KEYS: u8 = 88;

/// A single playable MIDI event with timing relative to the previous
/// kept event.
///
/// Events are immutable once loaded; the playback engine owns the list
/// and only reads from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// MIDI channel (0-15).
    pub channel: u8,
    /// Seconds since the previous kept event.
    pub delta: f64,
    /// The message payload.
    pub kind: EventKind,
}

/// Message payload for an [`Event`].
///
/// Only the kinds the player dispatches are modeled; everything else is
/// dropped at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Note onset. A velocity of 0 is treated as a release everywhere.
    NoteOn { note: u8, velocity: u8 },
    /// Note release.
    NoteOff { note: u8 },
    /// Controller change (sustain pedal, volume, ...).
    ControlChange { controller: u8, value: u8 },
}

impl Event {
    /// Returns the MIDI note number for note events, `None` for
    /// controller changes.
    pub fn note(&self) -> Option<u8> {
        match self.kind {
            EventKind::NoteOn { note, .. } | EventKind::NoteOff { note } => Some(note),
            EventKind::ControlChange { .. } => None,
        }
    }

    /// Returns true for a Note On with non-zero velocity.
    pub fn is_onset(&self) -> bool {
        matches!(self.kind, EventKind::NoteOn { velocity, .. } if velocity > 0)
    }

    /// Returns true for a Note Off or a Note On with velocity 0.
    pub fn is_release(&self) -> bool {
        match self.kind {
            EventKind::NoteOff { .. } => true,
            EventKind::NoteOn { velocity, .. } => velocity == 0,
            EventKind::ControlChange { .. } => false,
        }
    }
}

/// Converts a MIDI note number to a piano key index (0-87).
///
/// Returns `None` for notes outside the 88-key range.
pub fn key_index(note: u8) -> Option<u8> {
    if (PIANO_LOW..=PIANO_HIGH).contains(&note) {
        Some(note - PIANO_LOW)
    } else {
        None
    }
}

/// Returns true if the given piano key index (0-87) is a black key.
pub fn is_black_key(key: u8) -> bool {
    // Key 0 is A0, so shift into the C-based octave first.
    matches!((key + 9) % 12, 1 | 3 | 6 | 8 | 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_index_range() {
        assert_eq!(key_index(21), Some(0));
        assert_eq!(key_index(60), Some(39));
        assert_eq!(key_index(108), Some(87));
        assert_eq!(key_index(20), None);
        assert_eq!(key_index(109), None);
    }

    #[test]
    fn test_black_keys() {
        // A0 and B0 are white, A#0 is black.
        assert!(!is_black_key(0));
        assert!(is_black_key(1));
        assert!(!is_black_key(2));
        // Middle C (key 39) is white, C#4 (key 40) is black.
        assert!(!is_black_key(39));
        assert!(is_black_key(40));
    }

    #[test]
    fn test_event_classification() {
        let on = Event {
            channel: 0,
            delta: 0.0,
            kind: EventKind::NoteOn {
                note: 60,
                velocity: 100,
            },
        };
        let silent_on = Event {
            channel: 0,
            delta: 0.0,
            kind: EventKind::NoteOn {
                note: 60,
                velocity: 0,
            },
        };
        let off = Event {
            channel: 0,
            delta: 0.0,
            kind: EventKind::NoteOff { note: 60 },
        };
        let cc = Event {
            channel: 0,
            delta: 0.0,
            kind: EventKind::ControlChange {
                controller: 64,
                value: 127,
            },
        };

        assert!(on.is_onset() && !on.is_release());
        assert!(!silent_on.is_onset() && silent_on.is_release());
        assert!(!off.is_onset() && off.is_release());
        assert!(!cc.is_onset() && !cc.is_release());
        assert_eq!(cc.note(), None);
        assert_eq!(on.note(), Some(60));
    }
}
