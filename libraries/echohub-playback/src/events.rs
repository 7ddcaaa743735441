//! Controller events
//!
//! Queued by the controller as state changes and drained by the UI layer,
//! which re-renders from them (or simply re-reads the snapshot).

use crate::types::PlaybackStatus;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// Status changed
    StatusChanged {
        /// The new status
        status: PlaybackStatus,
    },

    /// A different track was selected (or the selection was cleared)
    TrackChanged {
        /// ID of the new track, `None` when idle
        track_id: Option<String>,
    },

    /// Duration became known (or was reset)
    DurationChanged { duration_secs: f64 },

    /// Playhead moved
    PositionChanged { position_secs: f64 },

    /// Volume or mute changed
    VolumeChanged {
        /// Stored level (0.0-1.0)
        level: f64,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Volume slider shown or hidden
    SliderVisibilityChanged { visible: bool },

    /// Shuffle toggled
    ShuffleChanged { enabled: bool },

    /// Repeat toggled
    RepeatChanged { enabled: bool },

    /// The renderer refused to start; a user gesture is needed to retry
    PlaybackBlocked { reason: String },

    /// Track restarted because repeat is on
    RepeatRestarted { track_id: String },
}
