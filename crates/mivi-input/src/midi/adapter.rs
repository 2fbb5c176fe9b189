//! Translation from raw MIDI messages to bus events.
//!
//! Only three things matter to the note engine: note-on, note-off and the
//! sustain/sostenuto/soft controllers. Note-on with velocity 0 is a release,
//! as many keyboards never send a real note-off. Everything else is dropped.

use mivi_core::{Event, EventBus, KeyIndex, Pedal, Velocity};
use std::sync::Arc;
use tracing::trace;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

/// Raw 3-byte MIDI message as delivered by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawMidiMessage {
    pub data: [u8; 3],
    /// Valid bytes in `data` (1-3).
    pub len: u8,
}

impl RawMidiMessage {
    #[inline]
    pub fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            data: [status, data1, data2],
            len: 3,
        }
    }

    /// Copy up to three bytes out of a transport buffer.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let mut data = [0u8; 3];
        let len = bytes.len().min(3);
        data[..len].copy_from_slice(&bytes[..len]);
        Some(Self {
            data,
            len: len as u8,
        })
    }

    #[inline]
    pub fn status(&self) -> u8 {
        self.data[0] & 0xF0
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.data[0] & 0x0F
    }

    /// Both data bytes, if present and 7-bit clean.
    #[inline]
    fn data_bytes(&self) -> Option<(u8, u8)> {
        if self.len < 3 {
            return None;
        }
        let (data1, data2) = (self.data[1], self.data[2]);
        if data1 > 0x7F || data2 > 0x7F {
            return None;
        }
        Some((data1, data2))
    }
}

/// Publishes decoded MIDI input onto the bus.
pub struct MidiBusAdapter {
    bus: Arc<EventBus>,
}

impl MidiBusAdapter {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// Decode one message. `None` for anything the engine does not model.
    pub fn translate(message: &RawMidiMessage) -> Option<Event> {
        let status = message.status();
        if !matches!(status, NOTE_OFF | NOTE_ON | CONTROL_CHANGE) {
            return None;
        }
        let (data1, data2) = message.data_bytes()?;

        match status {
            NOTE_ON => {
                let key = KeyIndex::new(data1)?;
                Some(match Velocity::new(data2) {
                    Some(velocity) => Event::key_pressed(key, velocity),
                    None => Event::key_released(key),
                })
            }
            NOTE_OFF => KeyIndex::new(data1).map(Event::key_released),
            CONTROL_CHANGE => {
                Pedal::from_controller(data1).map(|pedal| Event::pedal(pedal, data2 > 0))
            }
            _ => None,
        }
    }

    /// Decode a transport buffer and publish the result, if any.
    pub fn handle_bytes(&self, bytes: &[u8]) {
        let Some(message) = RawMidiMessage::from_bytes(bytes) else {
            return;
        };
        match Self::translate(&message) {
            Some(event) => self.bus.publish(event),
            None => trace!("Ignoring MIDI message {:02X?}", &bytes[..bytes.len().min(3)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(status: u8, data1: u8, data2: u8) -> Option<Event> {
        MidiBusAdapter::translate(&RawMidiMessage::new(status, data1, data2))
    }

    #[test]
    fn test_note_on() {
        assert_eq!(translate(0x90, 60, 100), Some(Event::press(60, 100).unwrap()));
    }

    #[test]
    fn test_note_on_velocity_zero_is_release() {
        assert_eq!(translate(0x90, 60, 0), Some(Event::release(60).unwrap()));
    }

    #[test]
    fn test_note_off() {
        assert_eq!(translate(0x80, 64, 64), Some(Event::release(64).unwrap()));
    }

    #[test]
    fn test_any_channel_accepted() {
        assert_eq!(translate(0x9F, 21, 1), Some(Event::press(21, 1).unwrap()));
        assert_eq!(RawMidiMessage::new(0x9F, 21, 1).channel(), 15);
    }

    #[test]
    fn test_pedal_controllers() {
        assert_eq!(
            translate(0xB0, 64, 127),
            Some(Event::SustainPedalChanged { on: true })
        );
        assert_eq!(
            translate(0xB0, 64, 0),
            Some(Event::SustainPedalChanged { on: false })
        );
        assert_eq!(
            translate(0xB3, 66, 1),
            Some(Event::SostenutoPedalChanged { on: true })
        );
        assert_eq!(
            translate(0xB0, 67, 90),
            Some(Event::SoftPedalChanged { on: true })
        );
    }

    #[test]
    fn test_other_messages_ignored() {
        // Portamento, volume, pitch bend, program change, clock.
        assert_eq!(translate(0xB0, 65, 127), None);
        assert_eq!(translate(0xB0, 7, 100), None);
        assert_eq!(translate(0xE0, 0, 64), None);
        assert_eq!(translate(0xC0, 5, 0), None);
        assert_eq!(MidiBusAdapter::translate(&RawMidiMessage::from_bytes(&[0xF8]).unwrap()), None);
    }

    #[test]
    fn test_malformed_messages_ignored() {
        assert_eq!(translate(0x90, 0x80, 100), None);
        assert_eq!(translate(0x90, 60, 0xFF), None);
        let truncated = RawMidiMessage::from_bytes(&[0x90, 60]).unwrap();
        assert_eq!(MidiBusAdapter::translate(&truncated), None);
        assert!(RawMidiMessage::from_bytes(&[]).is_none());
    }

    #[test]
    fn test_handle_bytes_publishes() {
        use mivi_core::EventConsumer;
        use parking_lot::Mutex;

        struct Sink(Arc<Mutex<Vec<Event>>>);
        impl EventConsumer for Sink {
            fn consume(&mut self, event: &Event) {
                self.0.lock().push(*event);
            }
        }

        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.register_consumer(Box::new(Sink(seen.clone())));
        let adapter = MidiBusAdapter::new(bus);

        adapter.handle_bytes(&[0x90, 60, 100]);
        adapter.handle_bytes(&[0xE0, 0, 64]);
        adapter.handle_bytes(&[0x80, 60, 0]);

        assert_eq!(
            *seen.lock(),
            vec![Event::press(60, 100).unwrap(), Event::release(60).unwrap()]
        );
    }
}
