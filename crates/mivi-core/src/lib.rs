//! Note-state engine for live performance visualisation.
//!
//! Producers publish [`Event`]s on an [`EventBus`]; the registered consumers turn
//! them into a continuously decaying picture of what is sounding, stored in a
//! [`SharedState`] that a renderer can read every frame.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mivi_core::{Event, EventBus, EngineConfig, KeyIndex, SharedState};
//!
//! let config = EngineConfig::default();
//! let state = Arc::new(SharedState::new(config.history_capacity));
//! let bus = EventBus::new();
//! mivi_core::register_default_consumers(&bus, &state, &config);
//!
//! bus.publish(Event::press(60, 100).unwrap());
//! assert_eq!(state.note_velocity(KeyIndex::new(60).unwrap()), 100.0);
//! ```

pub mod error;
pub use error::{Error, Result};

mod bus;
pub use bus::{EventBus, EventConsumer};

mod config;
pub use config::{AttenuationTable, EngineConfig};

mod event;
pub use event::{Event, KeyIndex, Pedal, Velocity, KEY_COUNT};

pub mod consumers;
pub use consumers::{NoteLengthConsumer, NoteVolumeConsumer};

pub(crate) mod lockfree;

mod state;
pub use state::{PastNote, PastNoteRing, SharedState};

use std::sync::Arc;

/// Register the volume and length consumers, in that order.
pub fn register_default_consumers(bus: &EventBus, state: &Arc<SharedState>, config: &EngineConfig) {
    bus.register_consumer(Box::new(NoteVolumeConsumer::new(
        state.clone(),
        config.attenuation,
    )));
    bus.register_consumer(Box::new(NoteLengthConsumer::new(
        state.clone(),
        config.max_age_ticks,
    )));
}
