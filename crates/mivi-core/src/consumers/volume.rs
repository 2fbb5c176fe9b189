//! Per-key loudness with continuous decay.
//!
//! Presses write their (possibly softened) velocity straight into the shared
//! state. Releases only flag the key; the audible fade happens on later ticks,
//! using the four-way attenuation table keyed on held x sustain.

use crate::bus::EventConsumer;
use crate::config::AttenuationTable;
use crate::event::{Event, KeyIndex, Velocity, KEY_COUNT};
use crate::state::SharedState;
use std::sync::Arc;

pub struct NoteVolumeConsumer {
    state: Arc<SharedState>,
    attenuation: AttenuationTable,
    /// Raw velocity of each key as last pressed; zero once released.
    actual_velocities: [f32; KEY_COUNT],
    /// Set when a key changed since the last tick; that tick skips the key.
    fresh: [bool; KEY_COUNT],
    soft_pedal_on: bool,
}

impl NoteVolumeConsumer {
    pub fn new(state: Arc<SharedState>, attenuation: AttenuationTable) -> Self {
        Self {
            state,
            attenuation,
            actual_velocities: [0.0; KEY_COUNT],
            fresh: [false; KEY_COUNT],
            soft_pedal_on: false,
        }
    }

    /// Whether the engine currently considers `key` held down.
    pub fn is_held(&self, key: KeyIndex) -> bool {
        self.actual_velocities[key.index()] > self.attenuation.held_threshold
    }

    fn key_pressed(&mut self, key: KeyIndex, velocity: Velocity) {
        let velocity = if self.soft_pedal_on {
            velocity.softened()
        } else {
            velocity
        };
        let velocity = velocity.get() as f32;

        self.actual_velocities[key.index()] = velocity;
        self.fresh[key.index()] = true;
        self.state.set_note_velocity(key, velocity);
    }

    fn key_released(&mut self, key: KeyIndex) {
        self.actual_velocities[key.index()] = 0.0;
        self.fresh[key.index()] = true;
    }

    fn clock_ticked(&mut self) {
        let sustain = self.state.sustain_pedal_on();
        for i in 0..KEY_COUNT {
            if self.fresh[i] {
                self.fresh[i] = false;
                continue;
            }
            let held = self.actual_velocities[i] > self.attenuation.held_threshold;
            self.state.attenuate(i, self.attenuation.factor(held, sustain));
        }
    }
}

impl EventConsumer for NoteVolumeConsumer {
    fn consume(&mut self, event: &Event) {
        match *event {
            Event::KeyPressed { key, velocity } => self.key_pressed(key, velocity),
            Event::KeyReleased { key } => self.key_released(key),
            Event::SustainPedalChanged { on } => self.state.set_sustain_pedal(on),
            Event::SostenutoPedalChanged { on } => self.state.set_sostenuto_pedal(on),
            Event::SoftPedalChanged { on } => {
                self.soft_pedal_on = on;
                self.state.set_soft_pedal(on);
            }
            Event::ClockTicked => self.clock_ticked(),
        }
    }

    fn name(&self) -> &'static str {
        "NoteVolumeConsumer"
    }
}
