//! Event vocabulary published on the bus.
//!
//! Events are small `Copy` values created by producers, fanned out to every
//! consumer and then dropped. Key and velocity ranges are enforced at
//! construction, so consumers can index their 128-slot arrays without checks.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of addressable MIDI keys.
pub const KEY_COUNT: usize = 128;

/// MIDI key index (0-127).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct KeyIndex(u8);

impl KeyIndex {
    pub const MIN: KeyIndex = KeyIndex(0);
    pub const MAX: KeyIndex = KeyIndex(127);

    #[inline]
    pub const fn new(key: u8) -> Option<Self> {
        if key <= 127 {
            Some(Self(key))
        } else {
            None
        }
    }

    /// Array slot for this key.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// All 128 keys in ascending order.
    pub fn all() -> impl Iterator<Item = KeyIndex> {
        (0..=127).map(KeyIndex)
    }
}

impl TryFrom<u8> for KeyIndex {
    type Error = Error;

    fn try_from(key: u8) -> Result<Self> {
        Self::new(key).ok_or(Error::KeyOutOfRange(key))
    }
}

impl From<KeyIndex> for u8 {
    fn from(key: KeyIndex) -> Self {
        key.0
    }
}

/// Strike velocity of a pressed key (1-127). Zero is never a press.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Velocity(u8);

impl Velocity {
    pub const MAX: Velocity = Velocity(127);

    #[inline]
    pub const fn new(velocity: u8) -> Option<Self> {
        if velocity >= 1 && velocity <= 127 {
            Some(Self(velocity))
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Soft pedal attack: `ceil(v * 2 / 3)`, computed exactly in integers.
    #[inline]
    pub const fn softened(self) -> Self {
        Self((self.0 as u16 * 2).div_ceil(3) as u8)
    }
}

impl TryFrom<u8> for Velocity {
    type Error = Error;

    fn try_from(velocity: u8) -> Result<Self> {
        Self::new(velocity).ok_or(Error::VelocityOutOfRange(velocity))
    }
}

impl From<Velocity> for u8 {
    fn from(velocity: Velocity) -> Self {
        velocity.0
    }
}

/// The three piano pedals the engine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pedal {
    Sustain,
    Sostenuto,
    Soft,
}

impl Pedal {
    /// MIDI controller number carrying this pedal.
    pub const fn controller(self) -> u8 {
        match self {
            Pedal::Sustain => 64,
            Pedal::Sostenuto => 66,
            Pedal::Soft => 67,
        }
    }

    pub const fn from_controller(controller: u8) -> Option<Self> {
        match controller {
            64 => Some(Pedal::Sustain),
            66 => Some(Pedal::Sostenuto),
            67 => Some(Pedal::Soft),
            _ => None,
        }
    }
}

/// Everything that can happen on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    KeyPressed { key: KeyIndex, velocity: Velocity },
    KeyReleased { key: KeyIndex },
    SustainPedalChanged { on: bool },
    SostenutoPedalChanged { on: bool },
    SoftPedalChanged { on: bool },
    ClockTicked,
}

impl Event {
    #[inline]
    pub fn key_pressed(key: KeyIndex, velocity: Velocity) -> Self {
        Event::KeyPressed { key, velocity }
    }

    #[inline]
    pub fn key_released(key: KeyIndex) -> Self {
        Event::KeyReleased { key }
    }

    #[inline]
    pub fn pedal(pedal: Pedal, on: bool) -> Self {
        match pedal {
            Pedal::Sustain => Event::SustainPedalChanged { on },
            Pedal::Sostenuto => Event::SostenutoPedalChanged { on },
            Pedal::Soft => Event::SoftPedalChanged { on },
        }
    }

    /// Build a press from raw bytes, rejecting out-of-range values.
    pub fn press(key: u8, velocity: u8) -> Result<Self> {
        Ok(Event::KeyPressed {
            key: KeyIndex::try_from(key)?,
            velocity: Velocity::try_from(velocity)?,
        })
    }

    /// Build a release from a raw key byte.
    pub fn release(key: u8) -> Result<Self> {
        Ok(Event::KeyReleased {
            key: KeyIndex::try_from(key)?,
        })
    }

    /// Key this event refers to, if any.
    #[inline]
    pub fn key(&self) -> Option<KeyIndex> {
        match *self {
            Event::KeyPressed { key, .. } | Event::KeyReleased { key } => Some(key),
            _ => None,
        }
    }

    #[inline]
    pub fn is_tick(&self) -> bool {
        matches!(self, Event::ClockTicked)
    }

    /// Short name used in trace output.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::KeyPressed { .. } => "KeyPressed",
            Event::KeyReleased { .. } => "KeyReleased",
            Event::SustainPedalChanged { .. } => "SustainPedalChanged",
            Event::SostenutoPedalChanged { .. } => "SostenutoPedalChanged",
            Event::SoftPedalChanged { .. } => "SoftPedalChanged",
            Event::ClockTicked => "ClockTicked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_index_range() {
        assert_eq!(KeyIndex::new(0), Some(KeyIndex::MIN));
        assert_eq!(KeyIndex::new(127), Some(KeyIndex::MAX));
        assert_eq!(KeyIndex::new(128), None);
        assert_eq!(KeyIndex::try_from(200), Err(Error::KeyOutOfRange(200)));
        assert_eq!(KeyIndex::all().count(), KEY_COUNT);
    }

    #[test]
    fn test_velocity_rejects_zero() {
        assert!(Velocity::new(0).is_none());
        assert!(Velocity::new(128).is_none());
        assert_eq!(Velocity::try_from(0), Err(Error::VelocityOutOfRange(0)));
        assert_eq!(Velocity::new(1).map(Velocity::get), Some(1));
    }

    #[test]
    fn test_softened_velocity() {
        let soft = |v| Velocity::new(v).unwrap().softened().get();
        assert_eq!(soft(100), 67);
        assert_eq!(soft(3), 2);
        assert_eq!(soft(1), 1);
        assert_eq!(soft(127), 85);
    }

    #[test]
    fn test_pedal_controllers() {
        for pedal in [Pedal::Sustain, Pedal::Sostenuto, Pedal::Soft] {
            assert_eq!(Pedal::from_controller(pedal.controller()), Some(pedal));
        }
        assert_eq!(Pedal::from_controller(65), None);
    }

    #[test]
    fn test_event_constructors() {
        let press = Event::press(60, 100).unwrap();
        assert_eq!(press.key(), KeyIndex::new(60));
        assert_eq!(press.kind(), "KeyPressed");
        assert!(Event::press(60, 0).is_err());
        assert!(Event::release(128).is_err());
        assert_eq!(
            Event::pedal(Pedal::Soft, true),
            Event::SoftPedalChanged { on: true }
        );
        assert!(Event::ClockTicked.is_tick());
        assert_eq!(Event::ClockTicked.key(), None);
    }
}
