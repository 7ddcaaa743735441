//! `<audio>` element renderer and its event plumbing

use crate::error::{PlaybackError, Result};
use crate::renderer::{AudioRenderer, RendererNotification};
use crate::timer::Clock;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::HtmlAudioElement;

/// Queue of renderer notifications waiting to reach the controller
///
/// Element events and play rejections land here first; the waker then pumps
/// them into the controller once it is not borrowed.
#[derive(Clone, Default)]
pub struct Mailbox {
    queue: Rc<RefCell<VecDeque<RendererNotification>>>,
    waker: Rc<RefCell<Option<Rc<dyn Fn()>>>>,
}

impl Mailbox {
    /// Queue a notification and wake the consumer
    pub fn post(&self, notification: RendererNotification) {
        self.queue.borrow_mut().push_back(notification);
        let waker = self.waker.borrow().clone();
        if let Some(waker) = waker {
            waker();
        }
    }

    pub fn pop(&self) -> Option<RendererNotification> {
        self.queue.borrow_mut().pop_front()
    }

    /// Put a notification back at the head of the queue
    pub fn unpop(&self, notification: RendererNotification) {
        self.queue.borrow_mut().push_front(notification);
    }

    pub fn set_waker(&self, waker: Rc<dyn Fn()>) {
        *self.waker.borrow_mut() = Some(waker);
    }
}

/// Renderer backed by an HTML `<audio>` element
pub struct HtmlAudioRenderer {
    element: HtmlAudioElement,
    /// Rejection handler shared by every `play()` promise
    on_rejected: Closure<dyn FnMut(JsValue)>,
}

impl HtmlAudioRenderer {
    pub fn new(element: HtmlAudioElement, mailbox: Mailbox) -> Self {
        let on_rejected = Closure::wrap(Box::new(move |err: JsValue| {
            // AbortError: the request was superseded by a new source, not refused
            if error_name(&err).as_deref() == Some("AbortError") {
                return;
            }
            mailbox.post(RendererNotification::PlayRejected {
                reason: describe(&err),
            });
        }) as Box<dyn FnMut(JsValue)>);

        Self {
            element,
            on_rejected,
        }
    }
}

impl AudioRenderer for HtmlAudioRenderer {
    fn load(&mut self, url: &str) -> Result<()> {
        self.element.set_src(url);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let promise = self.element.play().map_err(|e| js_error("play", &e))?;
        let _ = promise.catch(&self.on_rejected);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.element.pause().map_err(|e| js_error("pause", &e))
    }

    fn stop(&mut self) -> Result<()> {
        self.pause()?;
        self.element
            .remove_attribute("src")
            .map_err(|e| js_error("stop", &e))?;
        self.element.load();
        Ok(())
    }

    fn seek(&mut self, position_secs: f64) -> Result<()> {
        self.element.set_current_time(position_secs);
        Ok(())
    }

    fn set_volume(&mut self, level: f64) -> Result<()> {
        self.element.set_volume(level);
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<()> {
        self.element.set_muted(muted);
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }
}

/// Element event listeners, one per notification type
///
/// Dropping the value removes every listener it registered.
pub struct MediaListeners {
    element: HtmlAudioElement,
    listeners: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl MediaListeners {
    /// Register `timeupdate`, `loadedmetadata`, `ended`, `playing` and `pause`
    pub fn attach(element: &HtmlAudioElement, mailbox: &Mailbox) -> Result<Self> {
        let mut listeners = Self {
            element: element.clone(),
            listeners: Vec::with_capacity(5),
        };

        listeners.listen("timeupdate", mailbox, |el| {
            RendererNotification::TimeProgress {
                seconds: el.current_time(),
            }
        })?;
        listeners.listen("loadedmetadata", mailbox, |el| {
            RendererNotification::MetadataReady {
                duration_secs: el.duration(),
            }
        })?;
        listeners.listen("ended", mailbox, |_| RendererNotification::Ended)?;
        listeners.listen("playing", mailbox, |_| RendererNotification::Playing)?;
        listeners.listen("pause", mailbox, |_| RendererNotification::Paused)?;

        Ok(listeners)
    }

    fn listen(
        &mut self,
        event: &'static str,
        mailbox: &Mailbox,
        read: fn(&HtmlAudioElement) -> RendererNotification,
    ) -> Result<()> {
        let element = self.element.clone();
        let mailbox = mailbox.clone();
        let callback = Closure::wrap(Box::new(move || {
            mailbox.post(read(&element));
        }) as Box<dyn FnMut()>);

        self.element
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|e| js_error(event, &e))?;
        self.listeners.push((event, callback));
        Ok(())
    }
}

impl Drop for MediaListeners {
    fn drop(&mut self) {
        for (event, callback) in self.listeners.drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
        }
    }
}

/// Clock over `Date.now()`, measured from construction
#[derive(Debug, Clone, Copy)]
pub struct DateClock {
    origin_ms: f64,
}

impl DateClock {
    pub fn new() -> Self {
        Self {
            origin_ms: js_sys::Date::now(),
        }
    }
}

impl Default for DateClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for DateClock {
    fn now(&self) -> Duration {
        let elapsed_ms = (js_sys::Date::now() - self.origin_ms).max(0.0);
        Duration::from_secs_f64(elapsed_ms / 1000.0)
    }
}

fn error_name(err: &JsValue) -> Option<String> {
    err.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.name()))
}

fn describe(err: &JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return format!("{}: {}", String::from(e.name()), String::from(e.message()));
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn js_error(context: &str, err: &JsValue) -> PlaybackError {
    PlaybackError::Renderer(format!("{context}: {}", describe(err)))
}
