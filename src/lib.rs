//! # Mivi - Live Note-State Engine
//!
//! Turns a live stream of piano input into a continuously decaying picture of
//! what is sounding, for a renderer to draw every frame.
//!
//! ## Architecture
//!
//! Mivi is an umbrella crate that coordinates:
//! - **mivi-core** - Event vocabulary, bus, shared state and the stock consumers
//! - **mivi-input** - Producers: clock, MIDI, computer keyboard, random notes
//!
//! ## Quick Start
//!
//! ```no_run
//! use mivi::prelude::*;
//!
//! let engine = MiviEngine::builder()
//!     .config(MiviConfig::load("mivi.toml")?)
//!     .build()?;
//!
//! // Every frame
//! let velocities = engine.state().velocities();
//! let history = engine.state().past_notes();
//! # Ok::<(), mivi::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-hardware` - Hardware MIDI input via midir

/// Re-export of mivi-core for direct access
pub use mivi_core as core;

/// Re-export of mivi-input for direct access
pub use mivi_input as input;

pub use mivi_core::{
    AttenuationTable, EngineConfig, Event, EventBus, EventConsumer, KeyIndex, PastNote,
    PastNoteRing, Pedal, SharedState, Velocity, KEY_COUNT,
};

pub use mivi_input::{KeyAction, KeyboardConfig, MidiBusAdapter, RandomInputConfig};

#[cfg(feature = "midi-hardware")]
pub use mivi_input::{MidiInputDevice, MidiInputManager};

mod error;
pub use error::{Error, Result};

mod config;
pub use config::{ClockMode, InputMode, MiviConfig};

mod builder;
pub use builder::MiviEngineBuilder;

mod engine;
pub use engine::{ActiveInput, MiviEngine};

/// Everything a host application usually needs.
pub mod prelude {
    pub use crate::{
        ActiveInput, ClockMode, Error, Event, InputMode, KeyAction, KeyIndex, MiviConfig,
        MiviEngine, PastNote, Result, SharedState,
    };
}
