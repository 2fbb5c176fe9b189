//! Input producers for the mivi note engine.
//!
//! Each producer turns an outside source into [`mivi_core::Event`]s published
//! on a shared [`mivi_core::EventBus`].
//!
//! # Features
//!
//! - **Clock**: fixed-period `ClockTicked` events on a named thread
//! - **MIDI translation**: raw note and pedal messages to events
//! - **Hardware MIDI**: device enumeration and connection (feature: `midi-io`)
//! - **Computer keyboard**: a QWERTY piano with velocity and pedal keys
//! - **Random notes**: a seeded performer for running without hardware
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mivi_core::EventBus;
//! use mivi_input::{ClockTickProducer, RandomInputConfig, RandomInputProducer};
//!
//! let bus = Arc::new(EventBus::new());
//! let _clock = ClockTickProducer::spawn(bus.clone(), Duration::from_millis(15))?;
//! let _random = RandomInputProducer::spawn(bus, RandomInputConfig::default())?;
//! # Ok::<(), mivi_input::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod clock;
pub use clock::ClockTickProducer;

pub mod keyboard;
pub use keyboard::{KeyAction, KeyboardConfig, KeyboardInputProducer, KeyboardMapper};

mod midi;
pub use midi::{MidiBusAdapter, RawMidiMessage};
#[cfg(feature = "midi-io")]
pub use midi::{MidiInputDevice, MidiInputManager};

mod random;
pub use random::{RandomInputConfig, RandomInputProducer, RandomNote, RandomNoteSource};
