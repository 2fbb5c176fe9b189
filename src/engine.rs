//! MiviEngine that owns the bus, the shared state and the running producers.

use crate::config::{ClockMode, MiviConfig};
use mivi_core::{Event, EventBus, SharedState};
use mivi_input::{
    ClockTickProducer, KeyAction, KeyboardInputProducer, MidiBusAdapter, RandomInputProducer,
};
use std::sync::Arc;

#[cfg(feature = "midi-hardware")]
use mivi_input::MidiInputManager;

/// The producer feeding note events, as resolved at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveInput {
    Midi,
    Random,
    Keyboard,
    Manual,
}

/// Live note-state engine.
///
/// The renderer reads [`SharedState`] every frame while producers publish on
/// their own threads. Dropping the engine stops the clock and the random
/// producer (releasing any keys it still holds) and closes the MIDI device.
///
/// # Example
///
/// ```
/// use mivi::prelude::*;
///
/// let engine = MiviEngine::builder()
///     .input(InputMode::Manual)
///     .clock(ClockMode::Manual)
///     .build()?;
///
/// engine.publish(Event::press(60, 100)?);
/// engine.tick();
///
/// let key = KeyIndex::new(60).unwrap();
/// assert_eq!(engine.state().note_length(key), 2);
/// # Ok::<(), mivi::Error>(())
/// ```
pub struct MiviEngine {
    // Producers first so they stop before the rest is torn down.
    clock: Option<ClockTickProducer>,
    random: Option<RandomInputProducer>,
    #[cfg(feature = "midi-hardware")]
    midi_input: Option<MidiInputManager>,

    config: MiviConfig,
    state: Arc<SharedState>,
    bus: Arc<EventBus>,
    midi: Arc<MidiBusAdapter>,
    keyboard: KeyboardInputProducer,
    active: ActiveInput,
}

impl MiviEngine {
    pub fn builder() -> crate::MiviEngineBuilder {
        crate::MiviEngineBuilder::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        config: MiviConfig,
        state: Arc<SharedState>,
        bus: Arc<EventBus>,
        midi: Arc<MidiBusAdapter>,
        keyboard: KeyboardInputProducer,
        active: ActiveInput,
        clock: Option<ClockTickProducer>,
        random: Option<RandomInputProducer>,
        #[cfg(feature = "midi-hardware")] midi_input: Option<MidiInputManager>,
    ) -> Self {
        Self {
            clock,
            random,
            #[cfg(feature = "midi-hardware")]
            midi_input,
            config,
            state,
            bus,
            midi,
            keyboard,
            active,
        }
    }

    /// Note state for the renderer.
    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &MiviConfig {
        &self.config
    }

    pub fn active_input(&self) -> ActiveInput {
        self.active
    }

    /// Publish an event as if it came from a producer.
    pub fn publish(&self, event: Event) {
        self.bus.publish(event);
    }

    /// Advance the engine by one tick.
    ///
    /// Meant for [`ClockMode::Manual`]; with the realtime clock running this
    /// adds an extra tick.
    pub fn tick(&self) {
        self.bus.publish(Event::ClockTicked);
    }

    pub fn clock_mode(&self) -> ClockMode {
        if self.clock.is_some() {
            ClockMode::Realtime
        } else {
            ClockMode::Manual
        }
    }

    /// Entry point for raw MIDI bytes from any transport.
    pub fn midi(&self) -> &MidiBusAdapter {
        &self.midi
    }

    /// Forward a key change from the windowing layer (GLFW key codes).
    pub fn push_key_change(&self, key_code: i32, action: KeyAction) {
        self.keyboard.push_key_change(key_code, action);
    }

    pub fn keyboard(&self) -> &KeyboardInputProducer {
        &self.keyboard
    }

    pub fn is_random_running(&self) -> bool {
        self.random.is_some()
    }

    /// Name of the connected hardware device, if any.
    #[cfg(feature = "midi-hardware")]
    pub fn midi_device_name(&self) -> Option<String> {
        self.midi_input
            .as_ref()
            .and_then(|manager| manager.connected_device_name())
    }
}
