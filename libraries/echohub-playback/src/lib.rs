//! EchoHub - Playback Controller
//!
//! Platform-agnostic playback control for the EchoHub podcast player.
//!
//! This crate provides:
//! - Playback state machine (idle, loading, paused, playing, ended)
//! - Relative seeking clamped to the track (the ±5 s buttons)
//! - Volume and mute, with an auto-hiding volume slider
//! - Repeat (restart on end) and an advisory shuffle flag
//! - Formatted elapsed/remaining time for display
//!
//! # Architecture
//!
//! `echohub-playback` never produces sound itself. The platform supplies an
//! [`AudioRenderer`] (an HTML `<audio>` element in the browser, see the
//! `wasm` feature) and a [`Clock`]; the controller commands the renderer and
//! is fed the renderer's notifications back.
//!
//! # Example
//!
//! ```rust
//! use echohub_playback::{
//!     ManualClock, PlaybackController, PlaybackStatus, PlayerConfig, RecordingRenderer,
//!     TrackDescriptor,
//! };
//!
//! let (renderer, probe) = RecordingRenderer::new();
//! let mut controller =
//!     PlaybackController::new(renderer, Box::new(ManualClock::new()), PlayerConfig::default())?;
//!
//! controller.select_track(Some(TrackDescriptor::new(
//!     "podcast-1",
//!     "https://cdn.example.com/episode.mp3",
//!     "Episode 1",
//!     "Host",
//! )));
//!
//! // Feed back what the renderer reported
//! for notification in probe.take_notifications() {
//!     controller.handle(notification);
//! }
//! controller.on_metadata_ready(180.0);
//! assert_eq!(controller.status(), PlaybackStatus::Playing);
//!
//! controller.forward();
//! assert_eq!(controller.snapshot().elapsed_label, "0:05");
//! # Ok::<(), echohub_playback::PlaybackError>(())
//! ```

mod controller;
pub mod display;
mod error;
pub mod events;
pub mod renderer;
pub mod timer;
pub mod types;
mod volume;

pub mod wasm;

// Public exports
pub use controller::PlaybackController;
pub use display::{format_time, progress_ratio, PlaybackSnapshot};
pub use error::{PlaybackError, Result};
pub use events::ControllerEvent;
pub use renderer::{
    AudioRenderer, RecordingRenderer, RendererCommand, RendererNotification, RendererProbe,
};
#[cfg(not(target_arch = "wasm32"))]
pub use timer::SystemClock;
pub use timer::{Clock, ManualClock, OneShotTimer, TimerHandle};
pub use types::{PlaybackStatus, PlayerConfig, TrackDescriptor, DEFAULT_ARTWORK};
pub use volume::{Volume, VolumeSlider};
