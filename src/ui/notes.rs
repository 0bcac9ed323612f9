//! The scrolling note lane.
//!
//! Maps each active note's scroll percentage and hold ratio onto a
//! vertical bar in the key's column. A note's head leaves the keyboard
//! at its audio onset and travels up; the tail follows once the hold
//! time has elapsed, so chords and long notes keep their shape.

use super::{channel_color, key_span};
use crate::playback::PlaybackEngine;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

/// Renders the note lane above the keyboard.
pub fn render_note_lane(frame: &mut Frame, area: Rect, engine: Option<&PlaybackEngine>) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(engine) = engine else { return };
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let scroll_secs = engine.scroll_secs();
    let lane_height = inner.height as f64;

    for active in engine.active_notes() {
        let percentage = active.percentage(scroll_secs);
        let held_ratio = active.held_ratio(scroll_secs);

        // Cell distances from the keyboard edge at the lane's bottom.
        let head = (percentage * lane_height).floor() as u32;
        let tail = ((percentage - held_ratio) * lane_height).max(0.0).floor() as u32;

        let head = head.min(inner.height as u32);
        if tail >= inner.height as u32 {
            continue; // fully scrolled past the top
        }
        let bar_height = (head - tail).max(1) as u16;

        let Some((x, w)) = key_span(active.note.key, inner.width) else {
            continue;
        };
        let rect = Rect::new(
            inner.x + x,
            inner.y + inner.height - tail as u16 - bar_height,
            w,
            bar_height,
        );
        frame.render_widget(
            Block::default().style(Style::default().bg(channel_color(active.note.channel))),
            rect,
        );
    }
}
