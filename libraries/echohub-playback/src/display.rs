//! Display helpers and the snapshot handed to the UI

use crate::types::{PlaybackStatus, TrackDescriptor};
use serde::Serialize;

/// Format seconds as `m:ss` (or `h:mm:ss` from one hour up)
///
/// Non-finite and negative input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Fraction of the track already played, in 0.0-1.0
///
/// Zero whenever the duration is unknown, so callers never divide by zero.
pub fn progress_ratio(current_secs: f64, duration_secs: f64) -> f64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || !current_secs.is_finite() {
        return 0.0;
    }
    (current_secs / duration_secs).clamp(0.0, 1.0)
}

/// Point-in-time view of the controller for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub track: Option<TrackDescriptor>,
    /// Player bar is shown only while a track is selected
    pub visible: bool,
    pub is_playing: bool,
    pub current_time_secs: f64,
    pub duration_secs: f64,
    pub remaining_secs: f64,
    /// Progress bar value (0-100)
    pub progress_percent: f64,
    pub elapsed_label: String,
    pub duration_label: String,
    pub remaining_label: String,
    pub volume: f64,
    /// Level actually audible (0 while muted)
    pub effective_volume: f64,
    pub is_muted: bool,
    /// Slider visibility as rendered (never shown while muted)
    pub slider_visible: bool,
    pub is_shuffle: bool,
    pub is_repeat: bool,
    pub playback_blocked: Option<String>,
    pub artwork_url: String,
}

impl PlaybackSnapshot {
    /// Single line summary, used by the replay harness text output
    pub fn summary(&self) -> String {
        let title = self.track.as_ref().map_or("-", |t| t.title.as_str());
        let mut line = format!(
            "[{:<7}] {} {}/{} vol={:.2}{}{}{}{}",
            self.status.as_str(),
            title,
            self.elapsed_label,
            self.duration_label,
            self.volume,
            if self.is_muted { " muted" } else { "" },
            if self.slider_visible { " slider" } else { "" },
            if self.is_shuffle { " shuffle" } else { "" },
            if self.is_repeat { " repeat" } else { "" },
        );
        if let Some(reason) = &self.playback_blocked {
            line.push_str(" blocked=");
            line.push_str(reason);
        }
        line
    }
}
