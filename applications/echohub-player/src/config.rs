/// Harness configuration
use crate::error::{ReplayError, Result};
use echohub_playback::PlayerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "echohub.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputSettings {
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Also print the controller events emitted by each step
    #[serde(default)]
    pub show_events: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One human readable line per step
    Text,
    /// One JSON object per step
    Json,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// Without an explicit path, `echohub.toml` in the working directory is
    /// used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    /// Load configuration with a specific environment source
    pub fn load_with(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ReplayError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (ECHOHUB_PLAYER__SEEK_STEP_SECS=10)
        settings = settings.add_source(env);

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.player.validate()?;
        Ok(())
    }
}

/// Environment source with the `ECHOHUB_` prefix and `__` between keys
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("ECHOHUB")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn default_format() -> OutputFormat {
    OutputFormat::Text
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            show_events: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.player, PlayerConfig::default());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(!config.output.show_events);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_player_config_is_rejected() {
        let mut config = AppConfig::default();
        config.player.seek_step_secs = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ReplayError::Playback(_))
        ));
    }
}
