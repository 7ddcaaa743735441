//! Error types for the playback controller

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently selected
    #[error("No track loaded")]
    NoTrackLoaded,

    /// The rendering primitive rejected a command
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
