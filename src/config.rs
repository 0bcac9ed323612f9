//! Player configuration.

use thiserror::Error;

/// Seconds a note scrolls before it sounds, when not overridden.
pub const DEFAULT_SCROLL_SECS: f64 = 2.0;

/// Errors raised by invalid configuration values.
///
/// Fatal at construction time; no engine is ever built from an invalid
/// `Settings`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The scroll/lead-in duration must be a positive number of seconds.
    #[error("scroll duration must be positive, got {0}")]
    NonPositiveScrollSecs(f64),
}

/// Validated playback settings.
///
/// `scroll_secs` doubles as the lead-in: it is both the time a note is
/// shown scrolling before it sounds and the synthetic delay prepended to
/// the message stream.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub scroll_secs: f64,
}

impl Settings {
    /// Creates settings, rejecting non-positive scroll durations.
    pub fn new(scroll_secs: f64) -> Result<Self, ConfigError> {
        if !scroll_secs.is_finite() || scroll_secs <= 0.0 {
            return Err(ConfigError::NonPositiveScrollSecs(scroll_secs));
        }
        Ok(Self { scroll_secs })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scroll_secs: DEFAULT_SCROLL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_durations() {
        assert!(Settings::new(0.0).is_err());
        assert!(Settings::new(-1.0).is_err());
        assert!(Settings::new(f64::NAN).is_err());
        assert!(Settings::new(2.0).is_ok());
    }
}
