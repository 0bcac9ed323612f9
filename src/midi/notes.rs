//! Visual note track generation.
//!
//! Pairs note onsets with their releases across an unordered interleaving
//! of channels and produces the scrolling notes the display animates.
//! Generation runs once at load time; afterwards the track is read-only.

use super::{key_index, Event};

/// A note block on the scrolling display.
///
/// All timing fields are in seconds. `held` is finalized by the
/// generator, either at the matching release or at the end-of-track
/// flush, and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualNote {
    /// Piano key index (0-87).
    pub key: u8,
    /// MIDI channel of the onset, used for coloring.
    pub channel: u8,
    /// Time since the previous appended onset.
    pub gap: f64,
    /// Time from track start (including the lead-in) to this onset.
    pub onset: f64,
    /// How long the note stayed on.
    pub held: f64,
}

/// Builds the visual note track from the loaded events.
///
/// `events` is the loaded sequence excluding the synthetic lead-in;
/// `lead_in` seeds the running clock so onsets line up with the audio
/// dispatch times of the full sequence.
///
/// The track is an arena: an open note is referenced by its index and
/// its `held` is finalized in place when the release arrives. A
/// retrigger before the release closes the old instance at the new
/// onset's time. Anything still open after the scan is closed at the
/// final cumulative time, so every `held` is non-negative and finalized
/// before playback starts.
pub fn generate_note_track(events: &[Event], lead_in: f64) -> Vec<VisualNote> {
    let mut notes: Vec<VisualNote> = Vec::new();
    // Index of the currently open VisualNote per MIDI note, None when
    // the note is up.
    let mut open: [Option<usize>; 128] = [None; 128];
    let mut now = lead_in;
    let mut previous_onset = 0.0;

    for event in events {
        now += event.delta;
        let Some(note) = event.note() else { continue };
        let slot = note as usize;

        if event.is_onset() {
            if let Some(index) = open[slot] {
                // Retrigger before release: close the old instance here.
                notes[index].held = now - notes[index].onset;
            }
            if let Some(key) = key_index(note) {
                notes.push(VisualNote {
                    key,
                    channel: event.channel,
                    gap: now - previous_onset,
                    onset: now,
                    held: 0.0,
                });
                open[slot] = Some(notes.len() - 1);
                previous_onset = now;
            }
        } else if event.is_release() {
            if let Some(index) = open[slot].take() {
                notes[index].held = now - notes[index].onset;
            }
        }
    }

    // Close notes the file never released.
    for slot in open.into_iter().flatten() {
        notes[slot].held = now - notes[slot].onset;
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::EventKind;

    fn on(delta: f64, note: u8) -> Event {
        Event {
            channel: 0,
            delta,
            kind: EventKind::NoteOn {
                note,
                velocity: 100,
            },
        }
    }

    fn off(delta: f64, note: u8) -> Event {
        Event {
            channel: 0,
            delta,
            kind: EventKind::NoteOff { note },
        }
    }

    #[test]
    fn test_matched_pair_held_duration() {
        let notes = generate_note_track(&[on(0.0, 60), off(0.5, 60)], 2.0);

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].key, 39);
        assert!((notes[0].gap - 2.0).abs() < 1e-9);
        assert!((notes[0].onset - 2.0).abs() < 1e-9);
        assert!((notes[0].held - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_zero_is_a_release() {
        let release = Event {
            channel: 0,
            delta: 0.25,
            kind: EventKind::NoteOn {
                note: 60,
                velocity: 0,
            },
        };
        let notes = generate_note_track(&[on(0.0, 60), release], 0.0);

        assert_eq!(notes.len(), 1);
        assert!((notes[0].held - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_onset_closed_at_track_end() {
        let notes = generate_note_track(&[on(0.0, 60), on(1.0, 64), off(1.0, 64)], 0.0);

        assert_eq!(notes.len(), 2);
        // Note 60 never releases; it is flushed at the final time of 2.0.
        assert!((notes[0].held - 2.0).abs() < 1e-9);
        assert!((notes[1].held - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_retrigger_closes_previous_instance() {
        let notes = generate_note_track(&[on(0.0, 60), on(0.4, 60), off(0.3, 60)], 0.0);

        assert_eq!(notes.len(), 2);
        // First instance closed by the retrigger at 0.4.
        assert!((notes[0].held - 0.4).abs() < 1e-9);
        assert!((notes[1].held - 0.3).abs() < 1e-9);
        // A release after the retrigger must not touch the closed note.
        assert!((notes[0].onset - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_gaps_sum_to_last_onset() {
        let events = [on(0.0, 60), off(0.2, 60), on(0.3, 64), on(0.7, 67)];
        let notes = generate_note_track(&events, 2.0);

        let gap_sum: f64 = notes.iter().map(|n| n.gap).sum();
        let last_onset = notes.last().unwrap().onset;
        assert!((gap_sum - last_onset).abs() < 1e-9);
        assert!((last_onset - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_channels_pair_by_note_across_interleaving() {
        let mut events = vec![on(0.0, 60), on(0.1, 64)];
        events[1].channel = 1;
        let mut release = off(0.1, 60);
        release.channel = 1; // Release channel does not matter for pairing.
        events.push(release);
        events.push(off(0.1, 64));

        let notes = generate_note_track(&events, 0.0);
        assert_eq!(notes.len(), 2);
        assert!((notes[0].held - 0.2).abs() < 1e-9);
        assert!((notes[1].held - 0.2).abs() < 1e-9);
        assert_eq!(notes[1].channel, 1);
    }

    #[test]
    fn test_all_held_durations_non_negative() {
        let events = [on(0.0, 60), off(0.0, 60), on(0.0, 60)];
        let notes = generate_note_track(&events, 0.0);
        assert!(notes.iter().all(|n| n.held >= 0.0));
    }
}
