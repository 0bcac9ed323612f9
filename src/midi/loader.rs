//! Standard MIDI File loading.
//!
//! Parses a .mid file into the flat event list the playback engine
//! consumes. All tracks of the file are merged into a single stream
//! ordered by absolute tick, tempo meta events are applied while
//! converting ticks to seconds, and everything except note events in the
//! piano range and controller changes is dropped.
//!
//! # Limitations
//!
//! - SMPTE timecode timing is not supported
//! - Format 2 (sequential) files are not supported
//! - Notes outside the 88-key piano range (21-108) are dropped

use super::{Event, EventKind, PIANO_HIGH, PIANO_LOW};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Microseconds per beat at the MIDI default of 120 BPM.
const DEFAULT_TEMPO: f64 = 500_000.0;

/// Errors that can occur while loading a MIDI file.
///
/// Loading is all-or-nothing: on any of these the caller keeps whatever
/// it was playing before.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// MIDI parsing failed.
    #[error("MIDI parse error: {0}")]
    Parse(String),
    /// Unsupported MIDI format or timing.
    #[error("unsupported format: {0}")]
    Unsupported(String),
}

/// Loads a MIDI file into an ordered event list.
///
/// The returned list starts with a synthetic delay event
/// (`delta = lead_in`, a Note Off on key 0 with no audible effect) so
/// the first real note has time to scroll into view before it sounds.
/// Every later `delta` is the time in seconds since the previous kept
/// event.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read or parsed, or uses
/// an unsupported timing/format.
pub fn load_events<P: AsRef<Path>>(path: P, lead_in: f64) -> Result<Vec<Event>, LoadError> {
    let data = fs::read(path.as_ref())?;
    let smf = Smf::parse(&data).map_err(|e| LoadError::Parse(e.to_string()))?;
    events_from_smf(&smf, lead_in)
}

/// Converts a parsed SMF into the player's event list.
///
/// Split out from [`load_events`] so tests can feed in-memory files.
pub fn events_from_smf(smf: &Smf, lead_in: f64) -> Result<Vec<Event>, LoadError> {
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int() as f64,
        Timing::Timecode(_, _) => {
            return Err(LoadError::Unsupported(
                "SMPTE timecode timing not supported".to_string(),
            ))
        }
    };

    if smf.header.format == Format::Sequential {
        return Err(LoadError::Unsupported(
            "format 2 (sequential) MIDI files not supported".to_string(),
        ));
    }

    // Merge all tracks into one stream ordered by absolute tick. The
    // (track, event) part of the key keeps same-tick events in file
    // order, so a release always precedes a later onset of the same note.
    let mut merged: Vec<(u64, usize, usize, TrackEventKind)> = Vec::new();
    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut tick: u64 = 0;
        for (event_idx, event) in track.iter().enumerate() {
            tick += event.delta.as_int() as u64;
            merged.push((tick, track_idx, event_idx, event.kind));
        }
    }
    merged.sort_unstable_by_key(|&(tick, track_idx, event_idx, _)| (tick, track_idx, event_idx));

    let mut events = Vec::with_capacity(merged.len() / 2 + 1);
    events.push(Event {
        channel: 0,
        delta: lead_in,
        kind: EventKind::NoteOff { note: 0 },
    });

    let mut tempo = DEFAULT_TEMPO;
    let mut prev_tick: u64 = 0;
    let mut current_secs: f64 = 0.0;
    let mut last_kept_secs: f64 = 0.0;

    for (tick, _, _, kind) in merged {
        // Tempo in effect applies up to this event's position.
        current_secs += (tick - prev_tick) as f64 * tempo / (ticks_per_beat * 1_000_000.0);
        prev_tick = tick;

        match kind {
            TrackEventKind::Meta(MetaMessage::Tempo(usec_per_beat)) => {
                tempo = usec_per_beat.as_int() as f64;
            }
            TrackEventKind::Midi { channel, message } => {
                let kept = match message {
                    MidiMessage::NoteOn { key, vel }
                        if (PIANO_LOW..=PIANO_HIGH).contains(&key.as_int()) =>
                    {
                        Some(EventKind::NoteOn {
                            note: key.as_int(),
                            velocity: vel.as_int(),
                        })
                    }
                    MidiMessage::NoteOff { key, .. }
                        if (PIANO_LOW..=PIANO_HIGH).contains(&key.as_int()) =>
                    {
                        Some(EventKind::NoteOff { note: key.as_int() })
                    }
                    MidiMessage::Controller { controller, value } => {
                        Some(EventKind::ControlChange {
                            controller: controller.as_int(),
                            value: value.as_int(),
                        })
                    }
                    _ => None,
                };

                if let Some(kind) = kept {
                    events.push(Event {
                        channel: channel.as_int(),
                        delta: current_secs - last_kept_secs,
                        kind,
                    });
                    last_kept_secs = current_secs;
                }
            }
            _ => {} // Other meta events and SysEx are dropped.
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Header, TrackEvent};

    fn midi_event(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message,
            },
        }
    }

    fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
        midi_event(
            delta,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        )
    }

    fn note_off(delta: u32, key: u8) -> TrackEvent<'static> {
        midi_event(
            delta,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        )
    }

    fn smf_with_track(track: Vec<TrackEvent<'static>>) -> Smf<'static> {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks.push(track);
        smf
    }

    #[test]
    fn test_lead_in_prepended() {
        let smf = smf_with_track(vec![note_on(0, 60, 100), note_off(480, 60)]);
        let events = events_from_smf(&smf, 2.0).unwrap();

        assert_eq!(events[0].delta, 2.0);
        assert_eq!(events[0].kind, EventKind::NoteOff { note: 0 });
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_filtering_excludes_out_of_range_and_meta() {
        let smf = smf_with_track(vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::TrackName(b"ignored")),
            },
            note_on(0, 20, 100),  // below the piano
            note_on(0, 109, 100), // above the piano
            note_on(0, 21, 100),
            note_on(0, 108, 100),
            midi_event(
                0,
                MidiMessage::Controller {
                    controller: u7::new(64),
                    value: u7::new(127),
                },
            ),
            midi_event(
                0,
                MidiMessage::ProgramChange {
                    program: u7::new(5),
                },
            ),
        ]);
        let events = events_from_smf(&smf, 2.0).unwrap();

        // Lead-in + two in-range onsets + one controller change.
        assert_eq!(events.len(), 4);
        assert_eq!(events[1].kind, EventKind::NoteOn { note: 21, velocity: 100 });
        assert_eq!(events[2].kind, EventKind::NoteOn { note: 108, velocity: 100 });
        assert_eq!(
            events[3].kind,
            EventKind::ControlChange {
                controller: 64,
                value: 127
            }
        );
    }

    #[test]
    fn test_delta_is_seconds_since_previous_kept_event() {
        // 480 ticks at the default tempo (500000 us/beat, 480 tpb) = 0.5 s.
        // The dropped note in the middle must not reset the delta base.
        let smf = smf_with_track(vec![
            note_on(0, 60, 100),
            note_on(480, 10, 100), // dropped, out of range
            note_off(480, 60),
        ]);
        let events = events_from_smf(&smf, 2.0).unwrap();

        assert_eq!(events.len(), 3);
        assert!((events[1].delta - 0.0).abs() < 1e-9);
        assert!((events[2].delta - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tempo_change_rescales_later_deltas() {
        let smf = smf_with_track(vec![
            note_on(0, 60, 100),
            // Double speed: 250000 us/beat, so 480 ticks = 0.25 s.
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(250_000))),
            },
            note_off(480, 60),
        ]);
        let events = events_from_smf(&smf, 2.0).unwrap();

        assert!((events[2].delta - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_tracks_merge_in_tick_order() {
        let mut smf = Smf::new(Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks.push(vec![note_on(480, 60, 100)]);
        smf.tracks.push(vec![note_on(0, 72, 100), note_off(960, 72)]);
        let events = events_from_smf(&smf, 2.0).unwrap();

        let notes: Vec<_> = events[1..].iter().map(|e| e.note().unwrap()).collect();
        assert_eq!(notes, vec![72, 60, 72]);
    }

    #[test]
    fn test_timecode_timing_rejected() {
        let smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Timecode(midly::Fps::Fps24, 40),
        ));
        assert!(matches!(
            events_from_smf(&smf, 2.0),
            Err(LoadError::Unsupported(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_events("does/not/exist.mid", 2.0),
            Err(LoadError::Io(_))
        ));
    }
}
