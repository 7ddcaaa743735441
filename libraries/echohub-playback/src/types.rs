//! Core types for the playback controller

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};

/// Artwork shown when a track carries no image
pub const DEFAULT_ARTWORK: &str = "/images/player1.png";

/// Descriptor of one playable podcast episode
///
/// Published by the track source (the podcast pages) whenever the user picks
/// something to listen to. The controller keeps its own copy and never
/// changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    /// Podcast identifier (used for the "open podcast" link)
    pub id: String,

    /// URL handed to the rendering primitive
    pub audio_url: String,

    /// Episode title
    pub title: String,

    /// Author display name
    pub author: String,

    /// Thumbnail URL (optional)
    #[serde(default)]
    pub image_url: Option<String>,
}

impl TrackDescriptor {
    /// Create a descriptor without artwork
    pub fn new(
        id: impl Into<String>,
        audio_url: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            audio_url: audio_url.into(),
            title: title.into(),
            author: author.into(),
            image_url: None,
        }
    }

    /// Attach a thumbnail URL
    #[must_use]
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Whether the descriptor points at something the renderer can load
    ///
    /// An empty audio URL is what the track source publishes while a podcast
    /// is still being generated; it counts as "no selection".
    pub fn is_playable(&self) -> bool {
        !self.audio_url.trim().is_empty()
    }

    /// Thumbnail URL, or `fallback` when none was provided
    pub fn artwork_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.image_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => fallback,
        }
    }
}

/// Controller status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No track selected
    Idle,

    /// Track handed to the renderer, duration not known yet
    Loading,

    /// Paused mid-track (or start was blocked)
    Paused,

    /// Renderer is producing audio
    Playing,

    /// Reached end of track with repeat off
    Ended,
}

impl PlaybackStatus {
    /// Lowercase name, as exposed to JavaScript and the replay output
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Loading => "loading",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Ended => "ended",
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial volume (0.0-1.0, default: 1.0)
    pub initial_volume: f64,

    /// Step used by the forward/rewind buttons (default: 5 seconds)
    pub seek_step_secs: f64,

    /// Idle window before the volume slider hides (default: 3000 ms)
    pub slider_hide_delay_ms: u64,

    /// Distance kept from the end of the track on forward seeks (default: 1 ms)
    pub end_guard_secs: f64,

    /// Artwork used when a track has no image
    pub default_artwork: String,

    /// Initial shuffle flag (default: off)
    pub shuffle: bool,

    /// Initial repeat flag (default: off)
    pub repeat: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            seek_step_secs: 5.0,
            slider_hide_delay_ms: 3000,
            end_guard_secs: 0.001,
            default_artwork: DEFAULT_ARTWORK.to_string(),
            shuffle: false,
            repeat: false,
        }
    }
}

impl PlayerConfig {
    /// Check that every value is usable by the controller
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PlaybackError::InvalidConfig(format!(
                "initial_volume must be within 0.0..=1.0, got {}",
                self.initial_volume
            )));
        }

        if !self.seek_step_secs.is_finite() || self.seek_step_secs <= 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "seek_step_secs must be positive, got {}",
                self.seek_step_secs
            )));
        }

        if !self.end_guard_secs.is_finite() || self.end_guard_secs < 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "end_guard_secs must not be negative, got {}",
                self.end_guard_secs
            )));
        }

        if self.slider_hide_delay_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "slider_hide_delay_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
