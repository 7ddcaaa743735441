//! Rendering primitive seam
//!
//! Abstracts the platform device that turns a URL into sound (an HTML
//! `<audio>` element in the browser, a simulated device in tests and in the
//! replay harness).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Platform rendering primitive
///
/// Commands are fire-and-forget: their outcome comes back later as a
/// [`RendererNotification`]. An `Err` only means the command could not be
/// issued at all.
pub trait AudioRenderer {
    /// Point the primitive at a new source
    fn load(&mut self, url: &str) -> Result<()>;

    /// Request playback start
    ///
    /// The request may still be refused afterwards (autoplay policy,
    /// network); that arrives as [`RendererNotification::PlayRejected`].
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self) -> Result<()>;

    /// Stop playback and release the source
    fn stop(&mut self) -> Result<()> {
        self.pause()
    }

    /// Move the playhead (seconds from start)
    fn seek(&mut self, position_secs: f64) -> Result<()>;

    /// Set the output level (0.0-1.0)
    fn set_volume(&mut self, level: f64) -> Result<()>;

    /// Set the mute flag
    fn set_muted(&mut self, muted: bool) -> Result<()>;

    /// Actual paused status of the primitive
    fn is_paused(&self) -> bool;
}

/// Notification emitted by the rendering primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RendererNotification {
    /// Playhead advanced
    TimeProgress { seconds: f64 },

    /// Duration became known
    MetadataReady { duration_secs: f64 },

    /// Reached end of source
    Ended,

    /// Audio output actually started
    Playing,

    /// The primitive paused (on request, on error or at end of source)
    Paused,

    /// A play request was refused
    PlayRejected { reason: String },
}

/// Command issued to the rendering primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RendererCommand {
    Load { url: String },
    Play,
    Pause,
    Stop,
    Seek { position_secs: f64 },
    SetVolume { level: f64 },
    SetMuted { muted: bool },
}

#[derive(Debug, Default)]
struct RecorderState {
    commands: Vec<RendererCommand>,
    outbox: VecDeque<RendererNotification>,
    paused: bool,
    loaded: bool,
    autoplay_blocked: bool,
    fail_commands: bool,
}

/// Simulated rendering primitive
///
/// Records every command and queues the notifications a media element would
/// emit in response. Inspect and drive it through the [`RendererProbe`]
/// returned alongside it.
#[derive(Debug)]
pub struct RecordingRenderer {
    state: Rc<RefCell<RecorderState>>,
}

/// Test-side handle of a [`RecordingRenderer`]
#[derive(Debug, Clone)]
pub struct RendererProbe {
    state: Rc<RefCell<RecorderState>>,
}

impl RecordingRenderer {
    /// Create a renderer and the probe observing it
    pub fn new() -> (Self, RendererProbe) {
        let state = Rc::new(RefCell::new(RecorderState {
            paused: true,
            ..Default::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            RendererProbe { state },
        )
    }

    fn record(&self, command: RendererCommand) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_commands {
            return Err(crate::error::PlaybackError::Renderer(format!(
                "device unavailable for {command:?}"
            )));
        }
        state.commands.push(command);
        Ok(())
    }
}

impl AudioRenderer for RecordingRenderer {
    fn load(&mut self, url: &str) -> Result<()> {
        self.record(RendererCommand::Load {
            url: url.to_string(),
        })?;
        let mut state = self.state.borrow_mut();
        state.paused = true;
        state.loaded = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.record(RendererCommand::Play)?;
        let mut state = self.state.borrow_mut();
        if state.autoplay_blocked {
            state.paused = true;
            state.outbox.push_back(RendererNotification::PlayRejected {
                reason: "NotAllowedError: play() requires a user gesture".to_string(),
            });
        } else if state.loaded {
            state.paused = false;
            state.outbox.push_back(RendererNotification::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(RendererCommand::Pause)?;
        let mut state = self.state.borrow_mut();
        if !state.paused {
            state.paused = true;
            state.outbox.push_back(RendererNotification::Paused);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(RendererCommand::Stop)?;
        let mut state = self.state.borrow_mut();
        state.paused = true;
        state.loaded = false;
        Ok(())
    }

    fn seek(&mut self, position_secs: f64) -> Result<()> {
        self.record(RendererCommand::Seek { position_secs })
    }

    fn set_volume(&mut self, level: f64) -> Result<()> {
        self.record(RendererCommand::SetVolume { level })
    }

    fn set_muted(&mut self, muted: bool) -> Result<()> {
        self.record(RendererCommand::SetMuted { muted })
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }
}

impl RendererProbe {
    /// All commands received so far
    pub fn commands(&self) -> Vec<RendererCommand> {
        self.state.borrow().commands.clone()
    }

    /// Number of recorded commands equal to `command`
    pub fn count(&self, command: &RendererCommand) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| *c == command)
            .count()
    }

    /// Forget recorded commands
    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Take the notifications queued since the last call
    pub fn take_notifications(&self) -> Vec<RendererNotification> {
        self.state.borrow_mut().outbox.drain(..).collect()
    }

    /// Refuse (or accept again) play requests, like a browser autoplay policy
    pub fn set_autoplay_blocked(&self, blocked: bool) {
        self.state.borrow_mut().autoplay_blocked = blocked;
    }

    /// Make every command fail synchronously
    pub fn set_fail_commands(&self, fail: bool) {
        self.state.borrow_mut().fail_commands = fail;
    }

    /// Pause on the device side, without going through the controller
    pub fn pause_externally(&self) {
        let mut state = self.state.borrow_mut();
        if !state.paused {
            state.paused = true;
            state.outbox.push_back(RendererNotification::Paused);
        }
    }

    /// Simulate the end of the source: the element pauses, then ends
    pub fn finish(&self) {
        let mut state = self.state.borrow_mut();
        if !state.paused {
            state.paused = true;
            state.outbox.push_back(RendererNotification::Paused);
        }
        state.outbox.push_back(RendererNotification::Ended);
    }

    /// Actual paused status
    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }
}
