//! Application state: the synthesizer, the current engine, and the
//! small amount of UI state around them (status line, file prompt,
//! preset songs).

use crate::audio::Synthesizer;
use crate::config::Settings;
use crate::playback::PlaybackEngine;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a status message stays on screen.
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

/// Directory scanned for preset songs.
const SONGS_DIR: &str = "songs";

/// Top-level application state.
pub struct App {
    /// Audio output, shared across every loaded song.
    synth: Box<dyn Synthesizer>,
    settings: Settings,
    /// The current song's engine; `None` until a song loads.
    engine: Option<PlaybackEngine>,
    /// Display name of the loaded song.
    pub song_name: Option<String>,
    /// Status message and when it was set.
    pub status_message: Option<(String, Instant)>,
    /// Input buffer for the open-file prompt; `Some` while it is open.
    pub prompt: Option<String>,
    /// Preset songs found in the songs directory, bound to keys 1-9.
    presets: Vec<PathBuf>,
}

impl App {
    /// Creates the app around an opened synthesizer.
    pub fn new(synth: Box<dyn Synthesizer>, settings: Settings) -> Self {
        Self {
            synth,
            settings,
            engine: None,
            song_name: None,
            status_message: None,
            prompt: None,
            presets: scan_presets(),
        }
    }

    /// The current engine's read-only snapshot, if a song is loaded.
    pub fn engine(&self) -> Option<&PlaybackEngine> {
        self.engine.as_ref()
    }

    /// Advances playback one frame and expires old status messages.
    pub fn update(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.tick(Instant::now(), self.synth.as_mut());
        }
        if let Some((_, at)) = self.status_message {
            if at.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Loads a MIDI file, replacing the current song on success.
    ///
    /// A missing `.mid` extension is filled in. On failure the current
    /// engine is left untouched and the error is shown in the status
    /// line; on success the old engine is stopped (flushing the
    /// synthesizer) before it is discarded.
    pub fn load_song(&mut self, path: impl AsRef<Path>) {
        let mut path = path.as_ref().to_path_buf();
        if path.extension().is_none() {
            path.set_extension("mid");
        }

        match PlaybackEngine::load(&path, &self.settings) {
            Ok(engine) => {
                if let Some(mut old) = self.engine.take() {
                    old.stop(self.synth.as_mut());
                }
                self.engine = Some(engine);
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("song")
                    .to_string();
                tracing::info!(song = %name, "loaded MIDI file");
                self.set_status(format!("Loaded {}", path.display()));
                self.song_name = Some(name);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load MIDI file");
                self.set_status(format!("Failed to load {}: {}", path.display(), e));
            }
        }
    }

    /// Loads the n-th preset song (0-based), if it exists.
    pub fn load_preset(&mut self, index: usize) {
        if let Some(path) = self.presets.get(index).cloned() {
            self.load_song(path);
        } else {
            self.set_status(format!("No preset song {}", index + 1));
        }
    }

    /// First preset, used as the startup fallback.
    pub fn first_preset(&self) -> Option<PathBuf> {
        self.presets.first().cloned()
    }

    /// Toggles play/pause of the current song.
    pub fn toggle_playback(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.toggle(self.synth.as_mut());
        }
    }

    /// Rewinds the current song to the beginning.
    pub fn reset_playback(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.reset(self.synth.as_mut());
        }
    }

    /// Stops playback, for shutdown and while the prompt is open.
    pub fn stop_playback(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop(self.synth.as_mut());
        }
    }

    /// Sets the status line message.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    // ==================== File prompt ====================

    /// Opens the file-name prompt, pausing playback while it is up.
    pub fn prompt_open(&mut self) {
        self.stop_playback();
        self.prompt = Some(String::new());
    }

    /// Appends a character to the prompt buffer.
    pub fn prompt_input(&mut self, c: char) {
        if let Some(buffer) = self.prompt.as_mut() {
            if !c.is_control() {
                buffer.push(c);
            }
        }
    }

    /// Deletes the last character of the prompt buffer.
    pub fn prompt_backspace(&mut self) {
        if let Some(buffer) = self.prompt.as_mut() {
            buffer.pop();
        }
    }

    /// Closes the prompt without loading anything.
    pub fn prompt_cancel(&mut self) {
        self.prompt = None;
    }

    /// Closes the prompt and tries to load the entered file.
    pub fn prompt_confirm(&mut self) {
        if let Some(buffer) = self.prompt.take() {
            if !buffer.is_empty() {
                self.load_song(buffer);
            }
        }
    }
}

/// Finds preset songs: `.mid` files in the songs directory, sorted by
/// name. Missing directory just means no presets.
fn scan_presets() -> Vec<PathBuf> {
    let mut songs: Vec<PathBuf> = std::fs::read_dir(SONGS_DIR)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("mid"))
        })
        .collect();
    songs.sort();
    songs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SynthError;
    use crate::midi::Event;

    #[derive(Default)]
    struct NullSynth;

    impl Synthesizer for NullSynth {
        fn send(&mut self, _event: &Event) -> Result<(), SynthError> {
            Ok(())
        }
        fn flush(&mut self) -> Result<(), SynthError> {
            Ok(())
        }
    }

    fn app() -> App {
        App::new(Box::new(NullSynth), Settings::default())
    }

    #[test]
    fn test_load_failure_keeps_previous_state() {
        let mut app = app();
        app.load_song("definitely/missing/file");

        assert!(app.engine().is_none());
        assert!(app.song_name.is_none());
        let (message, _) = app.status_message.as_ref().unwrap();
        assert!(message.starts_with("Failed to load"));
        // The missing extension was filled in before the attempt.
        assert!(message.contains("file.mid"));
    }

    #[test]
    fn test_prompt_editing() {
        let mut app = app();
        app.prompt_open();
        app.prompt_input('a');
        app.prompt_input('b');
        app.prompt_backspace();
        assert_eq!(app.prompt.as_deref(), Some("a"));

        app.prompt_cancel();
        assert!(app.prompt.is_none());
    }

    #[test]
    fn test_empty_prompt_confirm_loads_nothing() {
        let mut app = app();
        app.prompt_open();
        app.prompt_confirm();
        assert!(app.prompt.is_none());
        assert!(app.status_message.is_none());
    }
}
