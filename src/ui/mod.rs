//! Terminal user interface components.
//!
//! The screen is a scrolling note lane above an 88-key piano strip,
//! with a one-line transport/status bar at the bottom. All drawing
//! reads the engine's frame snapshot; nothing here mutates playback.

mod keyboard;
mod notes;

use crate::app::App;
use crate::midi::is_black_key;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

pub use keyboard::render_keyboard;
pub use notes::render_note_lane;

/// White keys on an 88-key piano; sets the horizontal scale.
const WHITE_KEY_COUNT: u16 = 52;

/// Per-channel note colors, reused across the lane and the keyboard.
const CHANNEL_COLORS: [Color; 16] = [
    Color::Cyan,
    Color::Magenta,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Red,
    Color::LightCyan,
    Color::LightMagenta,
    Color::LightGreen,
    Color::LightYellow,
    Color::LightBlue,
    Color::LightRed,
    Color::Cyan,
    Color::Magenta,
    Color::Green,
    Color::Yellow,
];

/// Returns the display color for a MIDI channel.
pub(crate) fn channel_color(channel: u8) -> Color {
    CHANNEL_COLORS[(channel & 0x0F) as usize]
}

/// Horizontal span of a piano key within a lane of the given width.
///
/// White keys get one unit each; a black key is a single column
/// straddling the boundary between its neighbors. Returns `None` when
/// the key falls off the right edge of a narrow terminal.
pub(crate) fn key_span(key: u8, width: u16) -> Option<(u16, u16)> {
    let unit = (width / WHITE_KEY_COUNT).max(1);
    let whites_before = (0..key).filter(|&k| !is_black_key(k)).count() as u16;

    let (x, w) = if is_black_key(key) {
        ((whites_before * unit).saturating_sub(1), 1)
    } else {
        (whites_before * unit, unit)
    };

    if x >= width {
        return None;
    }
    Some((x, w.min(width - x)))
}

/// Renders the complete UI: note lane, keyboard, status bar, and the
/// file prompt overlay when it is open.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Scrolling note lane
            Constraint::Length(6), // Piano keyboard
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_note_lane(frame, chunks[0], app.engine());
    render_keyboard(frame, chunks[1], app.engine());
    render_status(frame, chunks[2], app);

    if app.prompt.is_some() {
        render_prompt(frame, app);
    }
}

/// Renders the transport/status line.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(Color::Yellow);
    let desc_style = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled(
        format!(" {} ", app.song_name.as_deref().unwrap_or("no song")),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];

    let playing = app.engine().is_some_and(|e| e.playing());
    spans.push(if playing {
        Span::styled("Playing ", Style::default().fg(Color::Green))
    } else {
        Span::styled("Stopped ", Style::default().fg(Color::DarkGray))
    });

    if let Some((message, _)) = &app.status_message {
        spans.push(Span::styled(
            format!("| {} ", message),
            Style::default().fg(Color::White),
        ));
    }

    for (key, desc) in [
        ("Space", "Play"),
        ("r", "Reset"),
        ("i", "Open"),
        ("1-9", "Songs"),
        ("q", "Quit"),
    ] {
        spans.push(Span::styled("[", desc_style));
        spans.push(Span::styled(key, key_style));
        spans.push(Span::styled(format!("]{} ", desc), desc_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Renders the file-name input overlay.
fn render_prompt(frame: &mut Frame, app: &App) {
    let Some(buffer) = &app.prompt else { return };

    let area = centered_rect(50, 20, frame.area());
    let area = Rect {
        height: 3.min(area.height),
        ..area
    };
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Open MIDI File ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let input = Line::from(vec![
        Span::styled(buffer.clone(), Style::default().fg(Color::White)),
        Span::styled("_", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(input), inner);
}

/// Helper function to center a rectangle within another rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_span_covers_the_piano() {
        // At two columns per white key everything fits in 104 columns.
        for key in 0..88 {
            let (x, w) = key_span(key, 104).unwrap();
            assert!(x + w <= 104, "key {key} overflows");
            assert!(w >= 1);
        }
    }

    #[test]
    fn test_black_keys_are_single_column() {
        // A#0 is key 1, between the first two white keys.
        let (x, w) = key_span(1, 104).unwrap();
        assert_eq!(w, 1);
        assert_eq!(x, 1);
    }

    #[test]
    fn test_narrow_terminal_drops_high_keys() {
        assert!(key_span(87, 20).is_none());
        assert!(key_span(0, 20).is_some());
    }
}
