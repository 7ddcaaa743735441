//! Playback controller - core state machine
//!
//! Owns everything describing "what is playing and how", turns user intents
//! into renderer commands, and reconciles with the notifications the
//! renderer sends back.

use crate::{
    display::{format_time, progress_ratio, PlaybackSnapshot},
    error::{PlaybackError, Result},
    events::ControllerEvent,
    renderer::{AudioRenderer, RendererNotification},
    timer::{Clock, TimerHandle},
    types::{PlaybackStatus, PlayerConfig, TrackDescriptor},
    volume::{Volume, VolumeSlider},
};
use std::time::Duration;
use tracing::{debug, warn};

/// Playback controller for one listening session
///
/// The controller is the only party allowed to command its renderer.
/// Everything runs on the caller's thread: intents and notifications are
/// handled one at a time, in the order they are delivered.
pub struct PlaybackController<R: AudioRenderer> {
    renderer: R,
    clock: Box<dyn Clock>,
    config: PlayerConfig,

    // Per-track state, replaced on every selection
    status: PlaybackStatus,
    current_track: Option<TrackDescriptor>,
    current_time: f64,
    duration: f64,
    metadata_ready: bool,
    restart_pending: bool,
    blocked: Option<String>,

    // User preferences, kept across tracks
    volume: Volume,
    slider: VolumeSlider,
    shuffle: bool,
    repeat: bool,

    // Event queue for UI synchronization
    pending_events: Vec<ControllerEvent>,
}

impl<R: AudioRenderer> PlaybackController<R> {
    /// Create a controller around a renderer
    ///
    /// `config` is validated first. The initial volume is pushed to the
    /// renderer right away.
    pub fn new(renderer: R, clock: Box<dyn Clock>, config: PlayerConfig) -> Result<Self> {
        config.validate()?;

        let volume = Volume::new(config.initial_volume);
        let slider = VolumeSlider::new(Duration::from_millis(config.slider_hide_delay_ms));

        let mut controller = Self {
            renderer,
            clock,
            status: PlaybackStatus::Idle,
            current_track: None,
            current_time: 0.0,
            duration: 0.0,
            metadata_ready: false,
            restart_pending: false,
            blocked: None,
            volume,
            slider,
            shuffle: config.shuffle,
            repeat: config.repeat,
            config,
            pending_events: Vec::new(),
        };

        let result = controller.renderer.set_volume(controller.volume.level());
        controller.check_command("set_volume", result);
        let result = controller.renderer.set_muted(controller.volume.is_muted());
        controller.check_command("set_muted", result);

        Ok(controller)
    }

    // ===== Track Selection =====

    /// Apply a selection published by the track source
    ///
    /// `None`, or a descriptor without an audio URL, clears the selection.
    /// Any playable descriptor replaces the current track, even if it is the
    /// same episode.
    pub fn select_track(&mut self, track: Option<TrackDescriptor>) {
        match track.filter(TrackDescriptor::is_playable) {
            Some(track) => self.load_track(track),
            None => self.clear_selection(),
        }
    }

    fn load_track(&mut self, track: TrackDescriptor) {
        debug!(track_id = %track.id, url = %track.audio_url, "loading track");

        let url = track.audio_url.clone();
        let track_id = track.id.clone();

        self.current_track = Some(track);
        self.reset_track_state();
        self.pending_events.push(ControllerEvent::TrackChanged {
            track_id: Some(track_id),
        });
        self.set_status(PlaybackStatus::Loading);

        let result = self.renderer.load(&url);
        if let Err(e) = result {
            self.block(e.to_string());
            return;
        }

        self.start_playback();
    }

    fn clear_selection(&mut self) {
        if self.current_track.is_none() && self.status == PlaybackStatus::Idle {
            return;
        }

        debug!("selection cleared");
        let result = self.renderer.stop();
        self.check_command("stop", result);

        self.current_track = None;
        self.reset_track_state();
        self.pending_events
            .push(ControllerEvent::TrackChanged { track_id: None });
        self.set_status(PlaybackStatus::Idle);
    }

    fn reset_track_state(&mut self) {
        self.set_position(0.0);
        self.set_duration(0.0);
        self.metadata_ready = false;
        self.restart_pending = false;
        self.blocked = None;
    }

    // ===== Playback Control =====

    /// Play if the renderer is paused, pause otherwise
    ///
    /// Decided from the renderer's actual status rather than the cached one,
    /// so a renderer that paused on its own is resumed instead of paused
    /// twice. Does nothing while idle.
    pub fn toggle_play_pause(&mut self) {
        if self.current_track.is_none() {
            debug!("toggle ignored: no track");
            return;
        }

        if self.renderer.is_paused() {
            self.resume();
        } else {
            self.suspend();
        }
    }

    /// Start or resume playback
    ///
    /// From `Ended` the track restarts from the beginning. Must be triggered
    /// by a user gesture to get past platform autoplay policies.
    pub fn play(&mut self) -> Result<()> {
        if self.current_track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.resume();
        Ok(())
    }

    /// Pause playback
    pub fn pause(&mut self) -> Result<()> {
        if self.current_track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.suspend();
        Ok(())
    }

    fn resume(&mut self) {
        if self.status == PlaybackStatus::Ended {
            let result = self.renderer.seek(0.0);
            self.check_command("seek", result);
            self.set_position(0.0);
        }
        self.start_playback();
    }

    fn suspend(&mut self) {
        let result = self.renderer.pause();
        self.check_command("pause", result);
        self.restart_pending = false;

        if matches!(
            self.status,
            PlaybackStatus::Playing | PlaybackStatus::Loading
        ) {
            self.set_status(PlaybackStatus::Paused);
        }
    }

    /// Issue `play()` and settle the status from what the renderer reports
    fn start_playback(&mut self) {
        self.blocked = None;

        if let Err(e) = self.renderer.play() {
            self.block(e.to_string());
            return;
        }

        if self.renderer.is_paused() {
            // Start not confirmed yet; `on_playing` or `on_play_rejected` settles it
            if self.status == PlaybackStatus::Playing {
                self.set_status(PlaybackStatus::Paused);
            }
            return;
        }

        if self.status == PlaybackStatus::Loading && !self.metadata_ready {
            return;
        }

        self.set_status(PlaybackStatus::Playing);
    }

    /// Record a refused start and fall back to `Paused`
    fn block(&mut self, reason: String) {
        warn!(reason = %reason, "playback blocked");

        self.restart_pending = false;
        self.blocked = Some(reason.clone());
        if self.status != PlaybackStatus::Idle {
            self.set_status(PlaybackStatus::Paused);
        }
        self.pending_events
            .push(ControllerEvent::PlaybackBlocked { reason });
    }

    // ===== Seek =====

    /// Move the playhead by `delta_secs`
    ///
    /// Forward moves are clamped to just before the end of the track (the
    /// configured end guard) so the seek itself never finishes the track,
    /// and are ignored while the duration is unknown. Backward moves stop at
    /// zero.
    pub fn seek_relative(&mut self, delta_secs: f64) {
        if self.current_track.is_none() || !delta_secs.is_finite() || delta_secs == 0.0 {
            return;
        }

        let target = if delta_secs > 0.0 {
            if self.duration <= 0.0 {
                debug!("forward seek ignored: duration unknown");
                return;
            }
            let limit = (self.duration - self.config.end_guard_secs).max(0.0);
            let target = (self.current_time + delta_secs).min(limit);
            if target <= self.current_time {
                return;
            }
            target
        } else {
            let target = (self.current_time + delta_secs).max(0.0);
            if self.duration > 0.0 {
                target.min(self.duration)
            } else {
                target
            }
        };

        let result = self.renderer.seek(target);
        if !self.check_command("seek", result) {
            return;
        }
        self.set_position(target);

        if self.status == PlaybackStatus::Ended && target < self.duration {
            self.set_status(PlaybackStatus::Paused);
        }
    }

    /// Skip ahead by the configured step (the "+5" button)
    pub fn forward(&mut self) {
        self.seek_relative(self.config.seek_step_secs);
    }

    /// Skip back by the configured step (the "-5" button)
    pub fn rewind(&mut self) {
        self.seek_relative(-self.config.seek_step_secs);
    }

    // ===== Volume =====

    /// Mute or unmute
    ///
    /// Muting keeps the stored level and hides the slider. Unmuting restores
    /// output at the stored level; if that level is zero, output stays silent.
    pub fn set_muted(&mut self, muted: bool) {
        if self.volume.is_muted() == muted {
            return;
        }

        let slider_before = self.is_slider_visible();

        if muted {
            self.volume.mute();
            self.slider.hide();
            let result = self.renderer.set_muted(true);
            self.check_command("set_muted", result);
        } else {
            self.volume.unmute();
            let result = self.renderer.set_muted(false);
            self.check_command("set_muted", result);
            let result = self.renderer.set_volume(self.volume.level());
            self.check_command("set_volume", result);
        }

        self.emit_volume_changed();
        self.emit_slider_if_changed(slider_before);
    }

    /// Flip the mute flag (the speaker button)
    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.volume.is_muted());
    }

    /// Set the output level (clamped to 0.0-1.0)
    ///
    /// Zero mutes, any audible level unmutes. The slider is shown and its
    /// hide countdown restarts.
    pub fn set_volume(&mut self, level: f64) {
        let slider_before = self.is_slider_visible();
        let was_muted = self.volume.is_muted();

        let level = self.volume.set_level(level);
        let result = self.renderer.set_volume(level);
        self.check_command("set_volume", result);

        if was_muted != self.volume.is_muted() {
            let result = self.renderer.set_muted(self.volume.is_muted());
            self.check_command("set_muted", result);
        }

        self.slider.show_transient(self.clock.now());

        self.emit_volume_changed();
        self.emit_slider_if_changed(slider_before);
    }

    /// Pointer entered the volume area: keep the slider up
    pub fn pointer_enter(&mut self) {
        if self.volume.is_muted() {
            return;
        }
        let slider_before = self.is_slider_visible();
        self.slider.show_pinned();
        self.emit_slider_if_changed(slider_before);
    }

    /// Pointer left the volume area: start the hide countdown
    pub fn pointer_leave(&mut self) {
        if self.volume.is_muted() {
            return;
        }
        self.slider.schedule_hide(self.clock.now());
    }

    /// Fire due timers
    ///
    /// Called by the host from its frame or interval loop.
    /// Returns true if anything changed.
    pub fn tick(&mut self) -> bool {
        let slider_before = self.is_slider_visible();
        if self.slider.poll(self.clock.now()) {
            debug!("volume slider auto-hidden");
        }
        self.emit_slider_if_changed(slider_before)
    }

    /// Next timer waiting for `tick()`, with the time left until it is due
    ///
    /// Hosts without a frame loop use this to schedule a single wake-up.
    pub fn pending_timer(&self) -> Option<(TimerHandle, Duration)> {
        let handle = self.slider.hide_handle()?;
        Some((handle, handle.deadline.saturating_sub(self.clock.now())))
    }

    // ===== Shuffle & Repeat =====

    /// Flip the shuffle flag
    ///
    /// There is no queue in a single-episode session, so this is advisory.
    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        self.pending_events.push(ControllerEvent::ShuffleChanged {
            enabled: self.shuffle,
        });
    }

    /// Flip the repeat flag
    ///
    /// Only changes how the next end of track is handled.
    pub fn toggle_repeat(&mut self) {
        self.repeat = !self.repeat;
        self.pending_events.push(ControllerEvent::RepeatChanged {
            enabled: self.repeat,
        });
    }

    // ===== Renderer Notifications =====

    /// Dispatch a notification from the renderer
    pub fn handle(&mut self, notification: RendererNotification) {
        match notification {
            RendererNotification::TimeProgress { seconds } => self.on_time_progress(seconds),
            RendererNotification::MetadataReady { duration_secs } => {
                self.on_metadata_ready(duration_secs);
            }
            RendererNotification::Ended => self.on_ended(),
            RendererNotification::Playing => self.on_playing(),
            RendererNotification::Paused => self.on_paused(),
            RendererNotification::PlayRejected { reason } => self.on_play_rejected(reason),
        }
    }

    /// Playhead advanced
    ///
    /// Safe at any frequency; values are clamped into the known duration.
    pub fn on_time_progress(&mut self, seconds: f64) {
        if self.current_track.is_none() || !seconds.is_finite() {
            return;
        }

        let mut seconds = seconds.max(0.0);
        if self.duration > 0.0 {
            seconds = seconds.min(self.duration);
        }

        if self.restart_pending && (self.duration <= 0.0 || seconds < self.duration) {
            self.restart_pending = false;
        }

        self.set_position(seconds);
    }

    /// Duration became known
    ///
    /// A non-finite or negative duration (live streams, broken sources) is
    /// stored as zero.
    pub fn on_metadata_ready(&mut self, duration_secs: f64) {
        if self.current_track.is_none() {
            return;
        }

        let duration = if duration_secs.is_finite() && duration_secs > 0.0 {
            duration_secs
        } else {
            0.0
        };

        self.metadata_ready = true;
        self.set_duration(duration);
        if duration > 0.0 && self.current_time > duration {
            self.set_position(duration);
        }

        if self.status == PlaybackStatus::Loading {
            if self.renderer.is_paused() {
                self.set_status(PlaybackStatus::Paused);
            } else {
                self.set_status(PlaybackStatus::Playing);
            }
        }
    }

    /// Reached end of track
    ///
    /// With repeat on the track restarts with exactly one `play()`; further
    /// end notifications are ignored until the restart shows progress. The
    /// restart is reported as playing only once the renderer actually runs.
    pub fn on_ended(&mut self) {
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return;
        };

        if self.restart_pending {
            debug!("duplicate end of track ignored");
            return;
        }

        if self.status == PlaybackStatus::Ended {
            return;
        }

        if self.repeat {
            debug!(track_id = %track_id, "repeating track");
            self.restart_pending = true;

            let result = self.renderer.seek(0.0);
            self.check_command("seek", result);
            self.set_position(0.0);
            self.pending_events
                .push(ControllerEvent::RepeatRestarted { track_id });

            self.start_playback();
        } else {
            if self.duration > 0.0 {
                self.set_position(self.duration);
            }
            self.set_status(PlaybackStatus::Ended);
        }
    }

    /// Renderer confirmed audio output
    pub fn on_playing(&mut self) {
        if self.current_track.is_none() {
            return;
        }

        self.restart_pending = false;
        self.blocked = None;

        match self.status {
            PlaybackStatus::Paused | PlaybackStatus::Ended => {
                self.set_status(PlaybackStatus::Playing);
            }
            PlaybackStatus::Loading if self.metadata_ready => {
                self.set_status(PlaybackStatus::Playing);
            }
            _ => {}
        }
    }

    /// Renderer paused (on request, by itself, or at end of source)
    pub fn on_paused(&mut self) {
        if self.current_track.is_none() || !self.renderer.is_paused() {
            return;
        }

        if matches!(
            self.status,
            PlaybackStatus::Playing | PlaybackStatus::Loading
        ) {
            self.set_status(PlaybackStatus::Paused);
        }
    }

    /// Renderer refused to start playback
    pub fn on_play_rejected(&mut self, reason: String) {
        if self.current_track.is_none() {
            return;
        }
        self.block(reason);
    }

    // ===== State Queries =====

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_track(&self) -> Option<&TrackDescriptor> {
        self.current_track.as_ref()
    }

    /// True only while the renderer produces audio
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Track duration in seconds (0 until metadata arrives)
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Stored volume level (0.0-1.0)
    pub fn volume(&self) -> f64 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    /// Slider visibility as rendered: never shown while muted
    pub fn is_slider_visible(&self) -> bool {
        self.slider.is_visible() && !self.volume.is_muted()
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    /// Reason of the last refused start, until playback starts again
    pub fn blocked_reason(&self) -> Option<&str> {
        self.blocked.as_deref()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Read-only access to the renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Build a snapshot for rendering
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let remaining = (self.duration - self.current_time).max(0.0);
        let artwork_url = self
            .current_track
            .as_ref()
            .map_or(self.config.default_artwork.as_str(), |t| {
                t.artwork_or(&self.config.default_artwork)
            })
            .to_string();

        PlaybackSnapshot {
            status: self.status,
            track: self.current_track.clone(),
            visible: self.current_track.is_some(),
            is_playing: self.is_playing(),
            current_time_secs: self.current_time,
            duration_secs: self.duration,
            remaining_secs: remaining,
            progress_percent: progress_ratio(self.current_time, self.duration) * 100.0,
            elapsed_label: format_time(self.current_time),
            duration_label: format_time(self.duration),
            remaining_label: format_time(remaining),
            volume: self.volume.level(),
            effective_volume: self.volume.effective(),
            is_muted: self.volume.is_muted(),
            slider_visible: self.is_slider_visible(),
            is_shuffle: self.shuffle,
            is_repeat: self.repeat,
            playback_blocked: self.blocked.clone(),
            artwork_url,
        }
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// The UI calls this after delivering intents or notifications and
    /// re-renders from what it gets.
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status == status {
            return;
        }
        debug!(from = ?self.status, to = ?status, "status changed");
        self.status = status;
        self.pending_events
            .push(ControllerEvent::StatusChanged { status });
    }

    fn set_position(&mut self, position_secs: f64) {
        if self.current_time == position_secs {
            return;
        }
        self.current_time = position_secs;
        self.pending_events
            .push(ControllerEvent::PositionChanged { position_secs });
    }

    fn set_duration(&mut self, duration_secs: f64) {
        if self.duration == duration_secs {
            return;
        }
        self.duration = duration_secs;
        self.pending_events
            .push(ControllerEvent::DurationChanged { duration_secs });
    }

    fn emit_volume_changed(&mut self) {
        self.pending_events.push(ControllerEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    fn emit_slider_if_changed(&mut self, before: bool) -> bool {
        let visible = self.is_slider_visible();
        if visible == before {
            return false;
        }
        self.pending_events
            .push(ControllerEvent::SliderVisibilityChanged { visible });
        true
    }

    /// Log a failed renderer command; returns whether it succeeded
    fn check_command(&self, command: &'static str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(command, error = %e, "renderer command failed");
                false
            }
        }
    }
}
