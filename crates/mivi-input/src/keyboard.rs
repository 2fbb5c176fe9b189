//! Computer keyboard as a piano.
//!
//! The four character rows are walked column by column (`1 Q A Z 2 W S X ...`)
//! so that moving right across the keyboard moves up the piano. Shift and Ctrl
//! nudge the strike velocity for later presses, space is the sustain pedal, Alt
//! the soft pedal and Super the sostenuto pedal. Key codes follow GLFW.

use crate::error::{Error, Result};
use mivi_core::{Event, EventBus, KeyIndex, Pedal, Velocity};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// GLFW key codes used by the mapper.
pub mod key_code {
    pub const SPACE: i32 = 32;
    pub const APOSTROPHE: i32 = 39;
    pub const COMMA: i32 = 44;
    pub const MINUS: i32 = 45;
    pub const PERIOD: i32 = 46;
    pub const SLASH: i32 = 47;
    pub const NUM_0: i32 = 48;
    pub const NUM_1: i32 = 49;
    pub const SEMICOLON: i32 = 59;
    pub const EQUAL: i32 = 61;
    pub const A: i32 = 65;
    pub const LEFT_BRACKET: i32 = 91;
    pub const RIGHT_BRACKET: i32 = 93;
    pub const LEFT_SHIFT: i32 = 340;
    pub const LEFT_CONTROL: i32 = 341;
    pub const LEFT_ALT: i32 = 342;
    pub const LEFT_SUPER: i32 = 343;
    pub const RIGHT_SHIFT: i32 = 344;
    pub const RIGHT_CONTROL: i32 = 345;
    pub const RIGHT_ALT: i32 = 346;
    pub const RIGHT_SUPER: i32 = 347;

    /// Code for an ASCII letter or digit.
    pub const fn ascii(c: char) -> i32 {
        c.to_ascii_uppercase() as i32
    }
}

use key_code::ascii;

const NUMBER_ROW: [i32; 12] = [
    ascii('1'),
    ascii('2'),
    ascii('3'),
    ascii('4'),
    ascii('5'),
    ascii('6'),
    ascii('7'),
    ascii('8'),
    ascii('9'),
    ascii('0'),
    key_code::MINUS,
    key_code::EQUAL,
];

const TOP_ROW: [i32; 12] = [
    ascii('q'),
    ascii('w'),
    ascii('e'),
    ascii('r'),
    ascii('t'),
    ascii('y'),
    ascii('u'),
    ascii('i'),
    ascii('o'),
    ascii('p'),
    key_code::LEFT_BRACKET,
    key_code::RIGHT_BRACKET,
];

const HOME_ROW: [i32; 11] = [
    ascii('a'),
    ascii('s'),
    ascii('d'),
    ascii('f'),
    ascii('g'),
    ascii('h'),
    ascii('j'),
    ascii('k'),
    ascii('l'),
    key_code::SEMICOLON,
    key_code::APOSTROPHE,
];

const BOTTOM_ROW: [i32; 10] = [
    ascii('z'),
    ascii('x'),
    ascii('c'),
    ascii('v'),
    ascii('b'),
    ascii('n'),
    ascii('m'),
    key_code::COMMA,
    key_code::PERIOD,
    key_code::SLASH,
];

/// Number of playable keys on the computer keyboard.
pub const PLAYABLE_KEYS: usize = NUMBER_ROW.len() + TOP_ROW.len() + HOME_ROW.len() + BOTTOM_ROW.len();

/// Physical keys in piano order.
pub fn layout() -> Vec<i32> {
    let rows: [&[i32]; 4] = [&NUMBER_ROW, &TOP_ROW, &HOME_ROW, &BOTTOM_ROW];
    let columns = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    let mut order = Vec::with_capacity(PLAYABLE_KEYS);
    for column in 0..columns {
        for row in rows {
            if let Some(&code) = row.get(column) {
                order.push(code);
            }
        }
    }
    order
}

/// What the keyboard transport reports for a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Pressed,
    Released,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// MIDI key of the first key in the layout (`1`).
    pub base_key: u8,
    pub initial_velocity: u8,
    /// Applied per Shift (up) or Ctrl (down) press.
    pub velocity_step: u8,
    pub min_velocity: u8,
    pub max_velocity: u8,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            base_key: 36,
            initial_velocity: 64,
            velocity_step: 32,
            min_velocity: 1,
            max_velocity: 100,
        }
    }
}

impl KeyboardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_key as usize + PLAYABLE_KEYS > 128 {
            return Err(Error::InvalidConfig(format!(
                "keyboard.base_key {} leaves no room for {} keys",
                self.base_key, PLAYABLE_KEYS
            )));
        }
        if self.min_velocity == 0 || self.max_velocity > 127 || self.min_velocity > self.max_velocity
        {
            return Err(Error::InvalidConfig(format!(
                "keyboard velocity range {}..={} must lie within 1..=127",
                self.min_velocity, self.max_velocity
            )));
        }
        if !(self.min_velocity..=self.max_velocity).contains(&self.initial_velocity) {
            return Err(Error::InvalidConfig(format!(
                "keyboard.initial_velocity {} outside {}..={}",
                self.initial_velocity, self.min_velocity, self.max_velocity
            )));
        }
        Ok(())
    }
}

/// Pure translation from key changes to bus events.
#[derive(Debug, Clone)]
pub struct KeyboardMapper {
    config: KeyboardConfig,
    keys: HashMap<i32, KeyIndex>,
    velocity: u8,
}

impl KeyboardMapper {
    pub fn new(config: KeyboardConfig) -> Result<Self> {
        config.validate()?;
        let keys = layout()
            .into_iter()
            .enumerate()
            .filter_map(|(offset, code)| {
                KeyIndex::new(config.base_key + offset as u8).map(|key| (code, key))
            })
            .collect();
        Ok(Self {
            velocity: config.initial_velocity,
            config,
            keys,
        })
    }

    /// Velocity the next note press will use.
    pub fn current_velocity(&self) -> u8 {
        self.velocity
    }

    /// Piano key bound to `code`, if any.
    pub fn key_for(&self, code: i32) -> Option<KeyIndex> {
        self.keys.get(&code).copied()
    }

    pub fn handle(&mut self, code: i32, action: KeyAction) -> Option<Event> {
        use key_code::*;

        // Modifiers adjust velocity on press and on autorepeat.
        match code {
            LEFT_SHIFT | RIGHT_SHIFT => {
                if action != KeyAction::Released {
                    self.velocity = self
                        .velocity
                        .saturating_add(self.config.velocity_step)
                        .min(self.config.max_velocity);
                    trace!("Keyboard velocity now {}", self.velocity);
                }
                return None;
            }
            LEFT_CONTROL | RIGHT_CONTROL => {
                if action != KeyAction::Released {
                    self.velocity = self
                        .velocity
                        .saturating_sub(self.config.velocity_step)
                        .max(self.config.min_velocity);
                    trace!("Keyboard velocity now {}", self.velocity);
                }
                return None;
            }
            _ => {}
        }

        let on = match action {
            KeyAction::Pressed => true,
            KeyAction::Released => false,
            KeyAction::Repeated => return None,
        };

        match code {
            SPACE => Some(Event::pedal(Pedal::Sustain, on)),
            LEFT_ALT | RIGHT_ALT => Some(Event::pedal(Pedal::Soft, on)),
            LEFT_SUPER | RIGHT_SUPER => Some(Event::pedal(Pedal::Sostenuto, on)),
            _ => {
                let key = self.key_for(code)?;
                if on {
                    let velocity = Velocity::new(self.velocity)?;
                    Some(Event::key_pressed(key, velocity))
                } else {
                    Some(Event::key_released(key))
                }
            }
        }
    }
}

/// Feeds key changes from the windowing layer onto the bus.
pub struct KeyboardInputProducer {
    bus: Arc<EventBus>,
    mapper: Mutex<KeyboardMapper>,
}

impl KeyboardInputProducer {
    pub fn new(bus: Arc<EventBus>, config: KeyboardConfig) -> Result<Self> {
        Ok(Self {
            bus,
            mapper: Mutex::new(KeyboardMapper::new(config)?),
        })
    }

    pub fn push_key_change(&self, code: i32, action: KeyAction) {
        let event = self.mapper.lock().handle(code, action);
        if let Some(event) = event {
            self.bus.publish(event);
        }
    }

    pub fn current_velocity(&self) -> u8 {
        self.mapper.lock().current_velocity()
    }
}
