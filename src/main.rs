//! notefall - a terminal MIDI player with a falling-note piano display.
//!
//! Plays a MIDI file through a SoundFont synthesizer while scrolling
//! the notes across an 88-key piano drawn in the terminal.
//!
//! # Usage
//!
//! ```bash
//! notefall song.mid --soundfont piano.sf2
//! notefall                 # loads the first preset from songs/
//! ```
//!
//! Space toggles playback, `r` rewinds, `i` opens another file,
//! `1`-`9` load preset songs, `q` quits.

mod app;
mod audio;
mod config;
mod midi;
mod playback;
mod ui;

use app::App;
use audio::MidiSynth;
use config::Settings;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line options for the application.
struct CliOptions {
    /// MIDI file to play on startup.
    song: Option<PathBuf>,
    /// Path to a custom SoundFont file.
    soundfont: Option<PathBuf>,
    /// Seconds a note scrolls before it sounds.
    scroll_secs: Option<f64>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - a positional MIDI file path
    /// - `--soundfont <path>` or `-sf <path>`: SoundFont file to use
    /// - `--scroll <seconds>`: lead-in/scroll duration
    /// - `--help` or `-h`: print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut song: Option<PathBuf> = None;
        let mut soundfont: Option<PathBuf> = None;
        let mut scroll_secs: Option<f64> = None;
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--soundfont" | "-sf" => {
                    i += 1;
                    if i >= args.len() {
                        eprintln!("Error: --soundfont requires a path argument");
                        std::process::exit(1);
                    }
                    soundfont = Some(PathBuf::from(&args[i]));
                }
                "--scroll" => {
                    i += 1;
                    let value = args.get(i).and_then(|s| s.parse::<f64>().ok());
                    match value {
                        Some(v) => scroll_secs = Some(v),
                        None => {
                            eprintln!("Error: --scroll requires a number of seconds");
                            std::process::exit(1);
                        }
                    }
                }
                "--help" | "-h" => {
                    eprintln!("notefall - terminal falling-note MIDI player");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [SONG.mid] [OPTIONS]",
                        args.first().map(String::as_str).unwrap_or("notefall")
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -sf, --soundfont PATH  SoundFont file (.sf2) for synthesis");
                    eprintln!("      --scroll SECONDS   Scroll/lead-in time (default 2.0)");
                    eprintln!("  -h, --help             Print this help message");
                    eprintln!();
                    eprintln!("Without a soundfont option, the first .sf2 file in the");
                    eprintln!("current directory is used.");
                    std::process::exit(0);
                }
                other => {
                    if other.ends_with(".sf2") {
                        soundfont = Some(PathBuf::from(other));
                    } else if song.is_none() {
                        song = Some(PathBuf::from(other));
                    } else {
                        eprintln!("Unknown option: {}", other);
                        eprintln!("Use --help for usage information");
                        std::process::exit(1);
                    }
                }
            }
            i += 1;
        }

        Ok(Self {
            song,
            soundfont,
            scroll_secs,
        })
    }
}

/// Finds a SoundFont when none was given: the first .sf2 in the
/// current directory, in name order.
fn find_soundfont() -> Option<PathBuf> {
    let mut fonts: Vec<PathBuf> = std::fs::read_dir(".")
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("sf2"))
        })
        .collect();
    fonts.sort();
    fonts.into_iter().next()
}

/// Main entry point.
fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse()?;

    // Initialize logging (optional, for debugging)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = match cli.scroll_secs {
        Some(secs) => Settings::new(secs).context("Invalid --scroll value")?,
        None => Settings::default(),
    };

    let soundfont = cli
        .soundfont
        .or_else(find_soundfont)
        .context("No SoundFont found: pass --soundfont or put a .sf2 file here")?;
    let synth = MidiSynth::new(&soundfont)
        .with_context(|| format!("Failed to open SoundFont {}", soundfont.display()))?;

    let mut app = App::new(Box::new(synth), settings);

    // Load the requested song, or fall back to the first preset.
    match cli.song {
        Some(path) => app.load_song(path),
        None => {
            if let Some(preset) = app.first_preset() {
                app.load_song(preset);
            } else {
                app.set_status("No song loaded: press i to open a MIDI file");
            }
        }
    }

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Silence anything still sounding before the terminal goes back.
    app.stop_playback();
    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop: one engine tick and one draw per frame.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.update();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with a short timeout to keep ticking at ~60 fps.
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Prompt input takes priority while it is open.
                if app.prompt.is_some() {
                    match key.code {
                        KeyCode::Enter => app.prompt_confirm(),
                        KeyCode::Esc => app.prompt_cancel(),
                        KeyCode::Backspace => app.prompt_backspace(),
                        KeyCode::Char(c) => app.prompt_input(c),
                        _ => {}
                    }
                    continue;
                }

                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break;
                    }
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char(' ') => app.toggle_playback(),
                    KeyCode::Char('r') => app.reset_playback(),
                    KeyCode::Char('i') => app.prompt_open(),
                    KeyCode::Char(c @ '1'..='9') => {
                        app.load_preset(c as usize - '1' as usize);
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
