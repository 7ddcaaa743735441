//! EchoHub Player Library
//!
//! Session replay harness for the EchoHub playback controller: scripted
//! listener intents and device notifications are run against the controller
//! with a simulated device and a manual clock, without a browser.
//!
//! This library exposes the harness components for testing purposes.

pub mod config;
pub mod error;
pub mod script;

// Re-export commonly used types for convenience
pub use config::{AppConfig, OutputFormat, OutputSettings};
pub use error::{ReplayError, Result};
pub use script::{load_script, parse_script, Replay, ReplayFrame, ScriptStep};
