//! MIDI input: raw message decoding and hardware device connection.

mod adapter;
pub use adapter::{MidiBusAdapter, RawMidiMessage};

#[cfg(feature = "midi-io")]
mod input;
#[cfg(feature = "midi-io")]
pub use input::{MidiInputDevice, MidiInputManager};
