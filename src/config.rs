//! Top-level configuration, loadable from TOML.
//!
//! Every section falls back to its defaults, so an empty file is a valid
//! config:
//!
//! ```toml
//! clock = "realtime"
//!
//! [input]
//! mode = "midi"
//! device = "Keystation"
//!
//! [engine]
//! history_capacity = 200
//!
//! [random]
//! seed = 42
//! ```

use crate::Result;
use mivi_core::EngineConfig;
use mivi_input::{KeyboardConfig, RandomInputConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Where note events come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InputMode {
    /// First MIDI device if one is present, otherwise random notes.
    #[default]
    Auto,
    /// A MIDI device, by name substring or the first one available.
    Midi {
        #[serde(default)]
        device: Option<String>,
    },
    Random,
    /// Computer keyboard only.
    Keyboard,
    /// No producer is started; the host publishes events itself.
    Manual,
}

/// Who publishes `ClockTicked`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// A timer thread at `engine.tick_interval_ms`.
    #[default]
    Realtime,
    /// The host calls `MiviEngine::tick`.
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiviConfig {
    pub input: InputMode,
    pub clock: ClockMode,
    pub engine: EngineConfig,
    pub random: RandomInputConfig,
    pub keyboard: KeyboardConfig,
}

impl MiviConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        debug!("Loading config from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.random.validate()?;
        self.keyboard.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_empty_config_is_default() {
        let config = MiviConfig::from_toml_str("").unwrap();
        assert_eq!(config, MiviConfig::default());
        assert_eq!(config.input, InputMode::Auto);
        assert_eq!(config.clock, ClockMode::Realtime);
        assert_eq!(config.engine.tick_interval_ms, 15);
        assert_eq!(config.engine.history_capacity, 100);
    }

    #[test]
    fn test_partial_sections() {
        let config = MiviConfig::from_toml_str(
            r#"
            clock = "manual"

            [input]
            mode = "midi"
            device = "Keystation"

            [engine]
            history_capacity = 10

            [random]
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.clock, ClockMode::Manual);
        assert_eq!(
            config.input,
            InputMode::Midi {
                device: Some("Keystation".to_string())
            }
        );
        assert_eq!(config.engine.history_capacity, 10);
        assert_eq!(config.engine.max_age_ticks, 10_000);
        assert_eq!(config.random.seed, Some(42));
        assert_eq!(config.random.interval_ms, 200);
    }

    #[test]
    fn test_midi_without_device() {
        let config = MiviConfig::from_toml_str("[input]\nmode = \"midi\"\n").unwrap();
        assert_eq!(config.input, InputMode::Midi { device: None });
    }

    #[test]
    fn test_attenuation_override() {
        let config = MiviConfig::from_toml_str(
            r#"
            [engine.attenuation]
            released = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.attenuation.released, 0.5);
        assert_eq!(config.engine.attenuation.held, 0.998);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            MiviConfig::from_toml_str("clock = "),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            MiviConfig::from_toml_str("clock = \"sometimes\""),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            MiviConfig::from_toml_str("[engine]\nhistory_capacity = 0\n"),
            Err(Error::Core(_))
        ));
        assert!(matches!(
            MiviConfig::from_toml_str("[random]\nmin_hold_ms = 900\nmax_hold_ms = 100\n"),
            Err(Error::Input(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MiviConfig::load("/definitely/not/here/mivi.toml"),
            Err(Error::Io(_))
        ));
    }
}
