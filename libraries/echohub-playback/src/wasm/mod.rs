//! WASM bindings for echohub-playback
//!
//! Drives the controller from an HTML `<audio>` element so the player bar
//! can run in the browser.

#[cfg(feature = "wasm")]
pub mod renderer;

#[cfg(feature = "wasm")]
pub mod controller;

#[cfg(feature = "wasm")]
pub use controller::WasmPlaybackController;

#[cfg(feature = "wasm")]
pub use renderer::{DateClock, HtmlAudioRenderer, Mailbox, MediaListeners};
