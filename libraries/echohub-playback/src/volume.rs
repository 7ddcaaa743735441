//! Volume, mute and the auto-hiding volume slider
//!
//! The rendering primitive takes a linear level in 0.0-1.0, so unlike a
//! sample-processing pipeline there is no gain curve here: the level is
//! forwarded as-is and mute is a separate flag.

use crate::timer::{OneShotTimer, TimerHandle};
use std::time::Duration;

/// Volume state (preserves the level across mute)
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Last level set by the user (0.0-1.0)
    level: f64,

    /// Mute state
    muted: bool,
}

impl Volume {
    /// Create new volume state
    ///
    /// # Arguments
    /// * `level` - Initial level, clamped to 0.0-1.0
    pub fn new(level: f64) -> Self {
        let level = Self::clamp(level);
        Self {
            level,
            muted: level == 0.0,
        }
    }

    /// Set the level
    ///
    /// Zero counts as an implicit mute, any audible level clears mute.
    /// Returns the clamped level that was stored.
    pub fn set_level(&mut self, level: f64) -> f64 {
        self.level = Self::clamp(level);
        self.muted = self.level == 0.0;
        self.level
    }

    /// Get current level (0.0-1.0)
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Mute (level is kept)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute at the stored level
    ///
    /// With a stored level of zero this clears the flag but output stays
    /// silent.
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level actually audible: 0.0 when muted
    pub fn effective(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }

    fn clamp(level: f64) -> f64 {
        if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Visibility of the volume slider with its hide timer
#[derive(Debug, Clone)]
pub struct VolumeSlider {
    visible: bool,
    hide_timer: OneShotTimer,
    hide_delay: Duration,
}

impl VolumeSlider {
    pub fn new(hide_delay: Duration) -> Self {
        Self {
            visible: false,
            hide_timer: OneShotTimer::new(),
            hide_delay,
        }
    }

    /// Show the slider and (re)start the hide countdown
    pub fn show_transient(&mut self, now: Duration) {
        self.visible = true;
        self.hide_timer.restart(now, self.hide_delay);
    }

    /// Show the slider and keep it up until the pointer leaves
    pub fn show_pinned(&mut self) {
        self.visible = true;
        self.hide_timer.cancel();
    }

    /// Start the hide countdown without changing visibility
    pub fn schedule_hide(&mut self, now: Duration) {
        self.hide_timer.restart(now, self.hide_delay);
    }

    /// Hide right away and drop any pending countdown
    pub fn hide(&mut self) {
        self.visible = false;
        self.hide_timer.cancel();
    }

    /// Hide the slider if its countdown has elapsed
    ///
    /// Returns true when visibility changed.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.hide_timer.poll(now).is_some() && self.visible {
            self.visible = false;
            return true;
        }
        false
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Pending hide countdown, if any
    pub fn hide_handle(&self) -> Option<TimerHandle> {
        self.hide_timer.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_volume() {
        let vol = Volume::new(0.8);
        assert_eq!(vol.level(), 0.8);
        assert!(!vol.is_muted());
    }

    #[test]
    fn set_level_clamps() {
        let mut vol = Volume::new(0.5);
        assert_eq!(vol.set_level(1.7), 1.0);
        assert_eq!(vol.set_level(-0.2), 0.0);
        assert_eq!(vol.set_level(f64::NAN), 0.0);
    }

    #[test]
    fn zero_level_mutes_and_audible_level_unmutes() {
        let mut vol = Volume::new(0.8);

        vol.set_level(0.0);
        assert!(vol.is_muted());

        vol.set_level(0.3);
        assert!(!vol.is_muted());
    }

    #[test]
    fn mute_unmute_preserves_level() {
        let mut vol = Volume::new(0.6);

        vol.mute();
        assert!(vol.is_muted());
        assert_eq!(vol.level(), 0.6);
        assert_eq!(vol.effective(), 0.0);

        vol.unmute();
        assert!(!vol.is_muted());
        assert_eq!(vol.effective(), 0.6);
    }

    #[test]
    fn unmute_at_zero_stays_silent() {
        let mut vol = Volume::new(0.0);
        assert!(vol.is_muted());

        vol.unmute();
        assert!(!vol.is_muted());
        assert_eq!(vol.effective(), 0.0);
    }

    #[test]
    fn transient_slider_hides_after_delay() {
        let mut slider = VolumeSlider::new(Duration::from_secs(3));
        slider.show_transient(Duration::ZERO);
        assert!(slider.is_visible());

        assert!(!slider.poll(Duration::from_millis(2999)));
        assert!(slider.poll(Duration::from_secs(3)));
        assert!(!slider.is_visible());
    }

    #[test]
    fn pinned_slider_ignores_old_countdown() {
        let mut slider = VolumeSlider::new(Duration::from_secs(3));
        slider.show_transient(Duration::ZERO);
        slider.show_pinned();

        assert!(!slider.poll(Duration::from_secs(10)));
        assert!(slider.is_visible());
        assert_eq!(slider.hide_handle(), None);
    }

    #[test]
    fn hide_handle_tracks_latest_countdown() {
        let mut slider = VolumeSlider::new(Duration::from_secs(3));
        slider.show_transient(Duration::ZERO);
        slider.schedule_hide(Duration::from_secs(1));

        let handle = slider.hide_handle().unwrap();
        assert_eq!(handle.deadline, Duration::from_secs(4));

        slider.hide();
        assert_eq!(slider.hide_handle(), None);
    }
}
