//! Session scripts and their replay
//!
//! A script is a JSON list of steps. Each step is either something the
//! listener does, something the simulated device does, or a move of the
//! clock. Replay runs the steps against a [`PlaybackController`] wired to a
//! [`RecordingRenderer`] and records one frame per step.

use crate::config::OutputFormat;
use crate::error::Result;
use echohub_playback::{
    ControllerEvent, ManualClock, PlaybackController, PlaybackSnapshot, PlayerConfig,
    RecordingRenderer, RendererCommand, RendererNotification, RendererProbe, TrackDescriptor,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One step of a session script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    // ===== Listener =====
    /// Publish a selection; a missing or null `track` clears it
    Select {
        #[serde(default)]
        track: Option<TrackDescriptor>,
    },
    TogglePlayPause,
    Play,
    Pause,
    Forward,
    Rewind,
    Seek {
        delta_secs: f64,
    },
    SetVolume {
        level: f64,
    },
    SetMuted {
        muted: bool,
    },
    ToggleMute,
    PointerEnter,
    PointerLeave,
    ToggleShuffle,
    ToggleRepeat,

    // ===== Device =====
    /// Forward the notifications the device queued so far
    Deliver,
    /// Inject a notification directly
    Notify {
        notification: RendererNotification,
    },
    /// Device pauses on its own (stall, headphones unplugged)
    PauseExternally,
    /// Device reaches the end of the source
    Finish,
    /// Refuse play requests like a browser autoplay policy
    BlockAutoplay {
        blocked: bool,
    },

    // ===== Clock =====
    /// Advance the clock and fire due timers
    Advance {
        ms: u64,
    },
}

impl ScriptStep {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptStep::Select { .. } => "select",
            ScriptStep::TogglePlayPause => "toggle_play_pause",
            ScriptStep::Play => "play",
            ScriptStep::Pause => "pause",
            ScriptStep::Forward => "forward",
            ScriptStep::Rewind => "rewind",
            ScriptStep::Seek { .. } => "seek",
            ScriptStep::SetVolume { .. } => "set_volume",
            ScriptStep::SetMuted { .. } => "set_muted",
            ScriptStep::ToggleMute => "toggle_mute",
            ScriptStep::PointerEnter => "pointer_enter",
            ScriptStep::PointerLeave => "pointer_leave",
            ScriptStep::ToggleShuffle => "toggle_shuffle",
            ScriptStep::ToggleRepeat => "toggle_repeat",
            ScriptStep::Deliver => "deliver",
            ScriptStep::Notify { .. } => "notify",
            ScriptStep::PauseExternally => "pause_externally",
            ScriptStep::Finish => "finish",
            ScriptStep::BlockAutoplay { .. } => "block_autoplay",
            ScriptStep::Advance { .. } => "advance",
        }
    }
}

/// Parse a script from JSON text
pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a script file
pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let json = std::fs::read_to_string(path)?;
    let steps = parse_script(&json)?;
    debug!(path = %path.display(), steps = steps.len(), "script loaded");
    Ok(steps)
}

/// Outcome of a single step
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFrame {
    pub index: usize,
    pub step: ScriptStep,
    /// Commands the controller sent to the device during this step
    pub commands: Vec<RendererCommand>,
    pub events: Vec<ControllerEvent>,
    pub snapshot: PlaybackSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplayFrame {
    /// Render the frame for output
    pub fn render(&self, format: OutputFormat, show_events: bool) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string(self)?),
            OutputFormat::Text => {
                let mut line = format!(
                    "{:>3} {:<17} {}",
                    self.index,
                    self.step.name(),
                    self.snapshot.summary()
                );
                if let Some(error) = &self.error {
                    line.push_str(" error=");
                    line.push_str(error);
                }
                if show_events {
                    for event in &self.events {
                        line.push_str("\n      ");
                        line.push_str(&serde_json::to_string(event)?);
                    }
                }
                Ok(line)
            }
        }
    }
}

/// Controller wired to a simulated device and a manual clock
pub struct Replay {
    controller: PlaybackController<RecordingRenderer>,
    probe: RendererProbe,
    clock: ManualClock,
    steps_run: usize,
}

impl Replay {
    pub fn new(config: PlayerConfig) -> Result<Self> {
        let (renderer, probe) = RecordingRenderer::new();
        let clock = ManualClock::new();
        let mut controller = PlaybackController::new(renderer, Box::new(clock.clone()), config)?;

        // Initial volume sync is not part of any step
        probe.clear_commands();
        controller.drain_events();

        Ok(Self {
            controller,
            probe,
            clock,
            steps_run: 0,
        })
    }

    /// Run every step, one frame each
    ///
    /// A step the controller refuses (e.g. `play` with nothing selected) is
    /// recorded in its frame and the replay continues.
    pub fn run(&mut self, steps: &[ScriptStep]) -> Vec<ReplayFrame> {
        info!(steps = steps.len(), "replaying session");
        steps.iter().map(|step| self.step(step)).collect()
    }

    /// Apply one step and capture its frame
    pub fn step(&mut self, step: &ScriptStep) -> ReplayFrame {
        let index = self.steps_run;
        self.steps_run += 1;

        let error = match self.apply(step) {
            Ok(()) => None,
            Err(e) => {
                warn!(index, step = step.name(), error = %e, "step rejected");
                Some(e.to_string())
            }
        };

        let commands = self.probe.commands();
        self.probe.clear_commands();

        ReplayFrame {
            index,
            step: step.clone(),
            commands,
            events: self.controller.drain_events(),
            snapshot: self.controller.snapshot(),
            error,
        }
    }

    fn apply(&mut self, step: &ScriptStep) -> Result<()> {
        let controller = &mut self.controller;
        match step {
            ScriptStep::Select { track } => controller.select_track(track.clone()),
            ScriptStep::TogglePlayPause => controller.toggle_play_pause(),
            ScriptStep::Play => controller.play()?,
            ScriptStep::Pause => controller.pause()?,
            ScriptStep::Forward => controller.forward(),
            ScriptStep::Rewind => controller.rewind(),
            ScriptStep::Seek { delta_secs } => controller.seek_relative(*delta_secs),
            ScriptStep::SetVolume { level } => controller.set_volume(*level),
            ScriptStep::SetMuted { muted } => controller.set_muted(*muted),
            ScriptStep::ToggleMute => controller.toggle_mute(),
            ScriptStep::PointerEnter => controller.pointer_enter(),
            ScriptStep::PointerLeave => controller.pointer_leave(),
            ScriptStep::ToggleShuffle => controller.toggle_shuffle(),
            ScriptStep::ToggleRepeat => controller.toggle_repeat(),
            ScriptStep::Deliver => {
                for notification in self.probe.take_notifications() {
                    controller.handle(notification);
                }
            }
            ScriptStep::Notify { notification } => controller.handle(notification.clone()),
            ScriptStep::PauseExternally => self.probe.pause_externally(),
            ScriptStep::Finish => self.probe.finish(),
            ScriptStep::BlockAutoplay { blocked } => self.probe.set_autoplay_blocked(*blocked),
            ScriptStep::Advance { ms } => {
                self.clock.advance(Duration::from_millis(*ms));
                controller.tick();
            }
        }
        Ok(())
    }

    pub fn controller(&self) -> &PlaybackController<RecordingRenderer> {
        &self.controller
    }

    /// Take the notifications the device queued but no step delivered
    pub fn take_undelivered(&mut self) -> Vec<RendererNotification> {
        self.probe.take_notifications()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echohub_playback::PlaybackStatus;

    #[test]
    fn step_names_match_wire_tags() {
        let steps = parse_script(
            r#"[
                {"step": "toggle_play_pause"},
                {"step": "advance", "ms": 250},
                {"step": "notify", "notification": {"type": "ended"}}
            ]"#,
        )
        .unwrap();

        assert_eq!(steps[0].name(), "toggle_play_pause");
        assert_eq!(steps[1], ScriptStep::Advance { ms: 250 });
        assert_eq!(steps[2].name(), "notify");
    }

    #[test]
    fn select_without_track_clears() {
        let steps = parse_script(r#"[{"step": "select"}]"#).unwrap();
        assert_eq!(steps[0], ScriptStep::Select { track: None });
    }

    #[test]
    fn rejected_step_is_recorded_and_replay_continues() {
        let mut replay = Replay::new(PlayerConfig::default()).unwrap();
        let frames = replay.run(&[ScriptStep::Play, ScriptStep::ToggleRepeat]);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].error.as_deref(), Some("No track loaded"));
        assert!(frames[1].error.is_none());
        assert!(replay.controller().is_repeat());
        assert_eq!(replay.controller().status(), PlaybackStatus::Idle);
    }

    #[test]
    fn text_frame_is_one_line_without_events() {
        let mut replay = Replay::new(PlayerConfig::default()).unwrap();
        let frame = replay.step(&ScriptStep::ToggleShuffle);
        let line = frame.render(OutputFormat::Text, false).unwrap();

        assert!(!line.contains('\n'));
        assert!(line.contains("toggle_shuffle"));
        assert!(line.contains("shuffle"));
    }
}
