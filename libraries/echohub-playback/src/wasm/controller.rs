//! WASM-compatible PlaybackController wrapper

use super::renderer::{DateClock, HtmlAudioRenderer, Mailbox, MediaListeners};
use crate::timer::TimerHandle;
use crate::{PlaybackController, PlaybackError, PlayerConfig, TrackDescriptor};
use gloo_timers::callback::Timeout;
use js_sys::Function;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use web_sys::HtmlAudioElement;

type SharedController = Rc<RefCell<PlaybackController<HtmlAudioRenderer>>>;

/// Connects the mailbox, the controller and the JS change callback
struct Bridge {
    this: Weak<Bridge>,
    controller: SharedController,
    mailbox: Mailbox,
    on_change: RefCell<Option<Function>>,
    /// Browser timeout armed for the controller's pending timer
    wake_up: RefCell<Option<(TimerHandle, Timeout)>>,
}

impl Bridge {
    /// Feed queued notifications into the controller, then notify JS
    fn pump(&self) {
        while let Some(notification) = self.mailbox.pop() {
            let Ok(mut controller) = self.controller.try_borrow_mut() else {
                // Controller busy further up the stack; it pumps again when done
                self.mailbox.unpop(notification);
                return;
            };
            controller.handle(notification);
        }
        self.notify();
    }

    fn notify(&self) {
        let (events, snapshot, pending) = match self.controller.try_borrow_mut() {
            Ok(mut controller) => {
                controller.tick();
                (
                    controller.drain_events(),
                    controller.snapshot(),
                    controller.pending_timer(),
                )
            }
            Err(_) => return,
        };
        self.schedule(pending);
        if events.is_empty() {
            return;
        }

        // Borrows are released before calling into JS, which may call back in
        let callback = self.on_change.borrow().clone();
        let Some(callback) = callback else {
            return;
        };

        let result = serde_wasm_bindgen::to_value(&snapshot)
            .and_then(|snapshot| Ok((snapshot, serde_wasm_bindgen::to_value(&events)?)));
        match result {
            Ok((snapshot, events)) => {
                if let Err(err) = callback.call2(&JsValue::NULL, &snapshot, &events) {
                    web_sys::console::error_1(&err);
                }
            }
            Err(err) => web_sys::console::error_1(&err.into()),
        }
    }

    /// Keep one browser timeout in step with the controller's pending timer
    ///
    /// Dropping a `Timeout` cancels it, so replacing or clearing the slot
    /// disarms the previous one.
    fn schedule(&self, pending: Option<(TimerHandle, Duration)>) {
        let mut slot = self.wake_up.borrow_mut();
        let Some((handle, delay)) = pending else {
            *slot = None;
            return;
        };
        if matches!(&*slot, Some((armed, _)) if *armed == handle) {
            return;
        }

        let weak = self.this.clone();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let timeout = Timeout::new(millis, move || {
            if let Some(bridge) = weak.upgrade() {
                bridge.on_timeout();
            }
        });
        *slot = Some((handle, timeout));
    }

    fn on_timeout(&self) {
        // Fired, so the next notify arms a fresh one
        self.wake_up.borrow_mut().take();
        self.pump();
    }
}

/// WASM-compatible playback controller
///
/// Wraps the core `PlaybackController` around an `<audio>` element with a
/// JavaScript-friendly API. Listeners on the element are removed when the
/// wrapper is freed.
#[wasm_bindgen]
pub struct WasmPlaybackController {
    bridge: Rc<Bridge>,
    _listeners: MediaListeners,
}

#[wasm_bindgen]
impl WasmPlaybackController {
    /// Create a controller driving `element`
    ///
    /// `config` is an optional `PlayerConfig`-shaped object.
    #[wasm_bindgen(constructor)]
    pub fn new(
        element: HtmlAudioElement,
        config: JsValue,
    ) -> Result<WasmPlaybackController, JsValue> {
        // Enable panic hooks for better error messages in console
        console_error_panic_hook::set_once();

        let config: PlayerConfig = if config.is_undefined() || config.is_null() {
            PlayerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let mailbox = Mailbox::default();
        let renderer = HtmlAudioRenderer::new(element.clone(), mailbox.clone());
        let controller = PlaybackController::new(renderer, Box::new(DateClock::new()), config)
            .map_err(to_js)?;

        let bridge = Rc::new_cyclic(|this| Bridge {
            this: this.clone(),
            controller: Rc::new(RefCell::new(controller)),
            mailbox: mailbox.clone(),
            on_change: RefCell::new(None),
            wake_up: RefCell::new(None),
        });

        let weak: Weak<Bridge> = Rc::downgrade(&bridge);
        mailbox.set_waker(Rc::new(move || {
            if let Some(bridge) = weak.upgrade() {
                bridge.pump();
            }
        }));

        let listeners = MediaListeners::attach(&element, &mailbox).map_err(to_js)?;

        Ok(Self {
            bridge,
            _listeners: listeners,
        })
    }

    /// Register the change callback: `(snapshot, events) => void`
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Option<Function>) {
        *self.bridge.on_change.borrow_mut() = callback;
    }

    // ===== Track Selection =====

    /// Select a track (`TrackDescriptor`-shaped object), or clear with `null`
    #[wasm_bindgen(js_name = selectTrack)]
    pub fn select_track(&self, track: JsValue) -> Result<(), JsValue> {
        let track: Option<TrackDescriptor> = if track.is_undefined() || track.is_null() {
            None
        } else {
            Some(serde_wasm_bindgen::from_value(track)?)
        };
        self.with(|c| c.select_track(track));
        Ok(())
    }

    // ===== Playback Control =====

    #[wasm_bindgen(js_name = togglePlayPause)]
    pub fn toggle_play_pause(&self) {
        self.with(|c| c.toggle_play_pause());
    }

    pub fn play(&self) -> Result<(), JsValue> {
        self.try_with(|c| c.play())
    }

    pub fn pause(&self) -> Result<(), JsValue> {
        self.try_with(|c| c.pause())
    }

    // ===== Seeking =====

    pub fn forward(&self) {
        self.with(|c| c.forward());
    }

    pub fn rewind(&self) {
        self.with(|c| c.rewind());
    }

    #[wasm_bindgen(js_name = seekRelative)]
    pub fn seek_relative(&self, delta_secs: f64) {
        self.with(|c| c.seek_relative(delta_secs));
    }

    // ===== Volume Control =====

    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&self, muted: bool) {
        self.with(|c| c.set_muted(muted));
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) {
        self.with(|c| c.toggle_mute());
    }

    /// Set volume (0.0 - 1.0)
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, level: f64) {
        self.with(|c| c.set_volume(level));
    }

    #[wasm_bindgen(js_name = pointerEnter)]
    pub fn pointer_enter(&self) {
        self.with(|c| c.pointer_enter());
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&self) {
        self.with(|c| c.pointer_leave());
    }

    // ===== Shuffle & Repeat =====

    #[wasm_bindgen(js_name = toggleShuffle)]
    pub fn toggle_shuffle(&self) {
        self.with(|c| c.toggle_shuffle());
    }

    #[wasm_bindgen(js_name = toggleRepeat)]
    pub fn toggle_repeat(&self) {
        self.with(|c| c.toggle_repeat());
    }

    /// Fire due timers now
    ///
    /// The slider auto-hide is already scheduled on a browser timeout; this
    /// is only needed to force an early check.
    pub fn tick(&self) {
        self.with(|c| {
            c.tick();
        });
    }

    // ===== State Queries =====

    /// Current snapshot as a plain object
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot = self
            .bridge
            .controller
            .try_borrow()
            .map_err(|_| JsValue::from_str("controller is busy"))?
            .snapshot();
        Ok(serde_wasm_bindgen::to_value(&snapshot)?)
    }

    /// Current status as a lowercase string
    pub fn status(&self) -> String {
        self.bridge
            .controller
            .try_borrow()
            .map(|c| c.status().as_str().to_string())
            .unwrap_or_default()
    }
}

impl WasmPlaybackController {
    fn with(&self, f: impl FnOnce(&mut PlaybackController<HtmlAudioRenderer>)) {
        match self.bridge.controller.try_borrow_mut() {
            Ok(mut controller) => f(&mut controller),
            Err(_) => {
                web_sys::console::warn_1(&JsValue::from_str(
                    "echohub: controller call ignored while busy",
                ));
                return;
            }
        }
        self.bridge.pump();
    }

    fn try_with(
        &self,
        f: impl FnOnce(&mut PlaybackController<HtmlAudioRenderer>) -> crate::Result<()>,
    ) -> Result<(), JsValue> {
        let result = {
            let mut controller = self
                .bridge
                .controller
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("controller is busy"))?;
            f(&mut controller)
        };
        self.bridge.pump();
        result.map_err(to_js)
    }
}

fn to_js(err: PlaybackError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
