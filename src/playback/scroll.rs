//! Scroll-position tracking for on-screen notes.

use crate::midi::VisualNote;

/// A visual note that is currently on screen, paired with how long it
/// has been scrolling.
///
/// Only `elapsed` ever mutates; the note itself is a read-only copy out
/// of the generated track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveNote {
    /// The note being animated.
    pub note: VisualNote,
    /// Seconds since this note was activated.
    elapsed: f64,
}

impl ActiveNote {
    /// Activates a note with its scroll clock at zero.
    pub fn new(note: VisualNote) -> Self {
        Self { note, elapsed: 0.0 }
    }

    /// Seconds since activation.
    #[allow(dead_code)]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advances the scroll clock by one frame delta.
    pub fn advance(&mut self, delta: f64) {
        self.elapsed += delta;
    }

    /// How far the note is through its scroll. Exceeds 1.0 while the
    /// held portion is still on screen.
    pub fn percentage(&self, scroll_secs: f64) -> f64 {
        self.elapsed / scroll_secs
    }

    /// The note's hold duration as a fraction of the scroll duration,
    /// which the renderer maps to the block's length.
    pub fn held_ratio(&self, scroll_secs: f64) -> f64 {
        self.note.held / scroll_secs
    }

    /// Whether any part of the note is still on screen.
    pub fn in_view(&self, scroll_secs: f64) -> bool {
        self.elapsed <= scroll_secs + self.note.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(held: f64) -> VisualNote {
        VisualNote {
            key: 39,
            channel: 0,
            gap: 0.0,
            onset: 0.0,
            held,
        }
    }

    #[test]
    fn test_percentage_can_exceed_one() {
        let mut active = ActiveNote::new(note(1.0));
        active.advance(2.5);
        assert!((active.percentage(2.0) - 1.25).abs() < 1e-9);
        assert!(active.in_view(2.0));
    }

    #[test]
    fn test_expires_after_scroll_plus_held() {
        let mut active = ActiveNote::new(note(0.5));
        active.advance(2.5);
        assert!(active.in_view(2.0));
        active.advance(0.1);
        assert!(!active.in_view(2.0));
    }

    #[test]
    fn test_held_ratio() {
        let active = ActiveNote::new(note(1.0));
        assert!((active.held_ratio(2.0) - 0.5).abs() < 1e-9);
    }
}
