//! Engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-tick multiplicative decay, keyed on whether the key is held and whether
/// the sustain pedal is down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttenuationTable {
    /// Key held, sustain on.
    pub held_sustained: f32,
    /// Key held, sustain off.
    pub held: f32,
    /// Key released, sustain on.
    pub released_sustained: f32,
    /// Key released, sustain off.
    pub released: f32,
    /// A key counts as held while its raw velocity is above this.
    pub held_threshold: f32,
}

impl Default for AttenuationTable {
    fn default() -> Self {
        Self {
            held_sustained: 0.9999,
            held: 0.998,
            released_sustained: 0.9975,
            released: 0.75,
            held_threshold: 0.01,
        }
    }
}

impl AttenuationTable {
    #[inline]
    pub fn factor(&self, held: bool, sustain: bool) -> f32 {
        match (held, sustain) {
            (true, true) => self.held_sustained,
            (true, false) => self.held,
            (false, true) => self.released_sustained,
            (false, false) => self.released,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let factors = [
            ("held_sustained", self.held_sustained),
            ("held", self.held),
            ("released_sustained", self.released_sustained),
            ("released", self.released),
        ];
        for (name, factor) in factors {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "attenuation.{} {} out of range (0, 1]",
                    name, factor
                )));
            }
        }
        if !(self.held_threshold >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "attenuation.held_threshold {} must be non-negative",
                self.held_threshold
            )));
        }
        Ok(())
    }
}

/// Configuration for the note-state engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    /// Slots in the released-note ring.
    pub history_capacity: usize,
    /// Released notes older than this many ticks are dropped from history.
    pub max_age_ticks: u32,
    pub attenuation: AttenuationTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 15,
            history_capacity: 100,
            max_age_ticks: 10_000,
            attenuation: AttenuationTable::default(),
        }
    }
}

impl EngineConfig {
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(Error::InvalidConfig(
                "history_capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_age_ticks == 0 {
            return Err(Error::InvalidConfig(
                "max_age_ticks must be greater than zero".to_string(),
            ));
        }
        self.attenuation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(15));
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.max_age_ticks, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_factor_table_shape() {
        let table = AttenuationTable::default();
        assert_eq!(table.factor(true, true), 0.9999);
        assert_eq!(table.factor(true, false), 0.998);
        assert_eq!(table.factor(false, true), 0.9975);
        assert_eq!(table.factor(false, false), 0.75);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = EngineConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_growing_factor() {
        let mut config = EngineConfig::default();
        config.attenuation.released = 1.5;
        assert!(config.validate().is_err());

        config.attenuation.released = f32::NAN;
        assert!(config.validate().is_err());
    }
}
