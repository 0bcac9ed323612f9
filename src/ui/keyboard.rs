//! Piano keyboard strip.
//!
//! Draws all 88 keys along the bottom of the screen and fills pressed
//! keys with their channel color, driven by the engine's pressed-state
//! snapshot.

use super::{channel_color, key_span};
use crate::midi::{is_black_key, PIANO_KEYS};
use crate::playback::PlaybackEngine;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Block;
use ratatui::Frame;

/// Renders the piano strip.
///
/// White keys run the full height; black keys overlay the upper part of
/// the boundary between their neighbors, as on a real keyboard.
pub fn render_keyboard(frame: &mut Frame, area: Rect, engine: Option<&PlaybackEngine>) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let pressed = |key: u8| engine.and_then(|e| e.pressed_channel(key));

    // White keys first so black keys paint over them.
    for key in 0..PIANO_KEYS {
        if is_black_key(key) {
            continue;
        }
        let Some((x, w)) = key_span(key, area.width) else {
            continue;
        };
        // Leave the last column as a separator when there is room.
        let w = if w > 1 { w - 1 } else { w };
        let color = pressed(key).map(channel_color).unwrap_or(Color::White);
        fill(frame, Rect::new(area.x + x, area.y, w, area.height), color);
    }

    let black_height = (area.height * 3 / 5).max(1);
    for key in 0..PIANO_KEYS {
        if !is_black_key(key) {
            continue;
        }
        let Some((x, w)) = key_span(key, area.width) else {
            continue;
        };
        let color = pressed(key).map(channel_color).unwrap_or(Color::Black);
        fill(frame, Rect::new(area.x + x, area.y, w, black_height), color);
    }
}

fn fill(frame: &mut Frame, rect: Rect, color: Color) {
    frame.render_widget(Block::default().style(Style::default().bg(color)), rect);
}
