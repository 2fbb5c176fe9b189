//! Builder for configuring and constructing a `MiviEngine`.

use crate::config::{ClockMode, InputMode, MiviConfig};
use crate::engine::{ActiveInput, MiviEngine};
use crate::Result;
use mivi_core::{register_default_consumers, EngineConfig, EventBus, EventConsumer, SharedState};
use mivi_input::{
    ClockTickProducer, KeyboardConfig, KeyboardInputProducer, MidiBusAdapter, RandomInputConfig,
    RandomInputProducer,
};
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(feature = "midi-hardware")]
use mivi_input::MidiInputManager;

/// Starts from [`MiviConfig::default`]. Extra consumers are registered after
/// the stock volume and length consumers, in the order given.
///
/// # Example
///
/// ```no_run
/// use mivi::prelude::*;
///
/// let engine = MiviEngine::builder()
///     .input(InputMode::Random)
///     .seed(7)
///     .build()?;
///
/// let history = engine.state().past_notes();
/// # Ok::<(), mivi::Error>(())
/// ```
#[derive(Default)]
pub struct MiviEngineBuilder {
    config: MiviConfig,
    consumers: Vec<Box<dyn EventConsumer>>,
}

impl MiviEngineBuilder {
    /// Replace the whole configuration, e.g. one loaded from TOML.
    pub fn config(mut self, config: MiviConfig) -> Self {
        self.config = config;
        self
    }

    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.config.engine = engine;
        self
    }

    /// Default: [`InputMode::Auto`]
    pub fn input(mut self, input: InputMode) -> Self {
        self.config.input = input;
        self
    }

    /// Default: [`ClockMode::Realtime`]
    pub fn clock(mut self, clock: ClockMode) -> Self {
        self.config.clock = clock;
        self
    }

    pub fn random(mut self, random: RandomInputConfig) -> Self {
        self.config.random = random;
        self
    }

    /// Seed for the random producer.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.random.seed = Some(seed);
        self
    }

    pub fn keyboard(mut self, keyboard: KeyboardConfig) -> Self {
        self.config.keyboard = keyboard;
        self
    }

    pub fn consumer(mut self, consumer: Box<dyn EventConsumer>) -> Self {
        self.consumers.push(consumer);
        self
    }

    pub fn build(self) -> Result<MiviEngine> {
        let config = self.config;
        config.validate()?;

        let state = Arc::new(SharedState::new(config.engine.history_capacity));
        let bus = Arc::new(EventBus::new());
        register_default_consumers(&bus, &state, &config.engine);
        for consumer in self.consumers {
            debug!("Registering consumer {}", consumer.name());
            bus.register_consumer(consumer);
        }

        let midi = Arc::new(MidiBusAdapter::new(bus.clone()));
        let keyboard = KeyboardInputProducer::new(bus.clone(), config.keyboard.clone())?;

        #[cfg(feature = "midi-hardware")]
        let mut midi_input = None;
        let mut random = None;

        let active = match &config.input {
            InputMode::Auto => {
                #[cfg(feature = "midi-hardware")]
                {
                    midi_input = connect_first_device(&midi)?;
                }
                #[cfg(feature = "midi-hardware")]
                let connected = midi_input.is_some();
                #[cfg(not(feature = "midi-hardware"))]
                let connected = false;

                if connected {
                    ActiveInput::Midi
                } else {
                    info!("No MIDI devices found, falling back to random input");
                    random = Some(RandomInputProducer::spawn(
                        bus.clone(),
                        config.random.clone(),
                    )?);
                    ActiveInput::Random
                }
            }
            #[cfg(feature = "midi-hardware")]
            InputMode::Midi { device } => {
                let manager = MidiInputManager::new(midi.clone())?;
                let name = match device {
                    Some(device) => manager.connect_by_name(device)?,
                    None => manager.connect(0)?,
                };
                info!("Listening to MIDI device {}", name);
                midi_input = Some(manager);
                ActiveInput::Midi
            }
            #[cfg(not(feature = "midi-hardware"))]
            InputMode::Midi { .. } => {
                return Err(mivi_input::Error::MidiDevice(
                    "hardware MIDI requires the midi-hardware feature".to_string(),
                )
                .into());
            }
            InputMode::Random => {
                random = Some(RandomInputProducer::spawn(
                    bus.clone(),
                    config.random.clone(),
                )?);
                ActiveInput::Random
            }
            InputMode::Keyboard => ActiveInput::Keyboard,
            InputMode::Manual => ActiveInput::Manual,
        };

        // Producers start after consumers are in place.
        let clock = match config.clock {
            ClockMode::Realtime => Some(ClockTickProducer::spawn(
                bus.clone(),
                config.engine.tick_interval(),
            )?),
            ClockMode::Manual => None,
        };

        info!("Mivi engine started with {:?} input", active);
        Ok(MiviEngine::from_parts(
            config,
            state,
            bus,
            midi,
            keyboard,
            active,
            clock,
            random,
            #[cfg(feature = "midi-hardware")]
            midi_input,
        ))
    }
}

#[cfg(feature = "midi-hardware")]
fn connect_first_device(midi: &Arc<MidiBusAdapter>) -> Result<Option<MidiInputManager>> {
    if MidiInputManager::list_devices().is_empty() {
        return Ok(None);
    }
    let manager = MidiInputManager::new(midi.clone())?;
    match manager.connect(0) {
        Ok(name) => {
            info!("Listening to MIDI device {}", name);
            Ok(Some(manager))
        }
        Err(e) => {
            tracing::warn!("Could not open first MIDI device: {}", e);
            Ok(None)
        }
    }
}
