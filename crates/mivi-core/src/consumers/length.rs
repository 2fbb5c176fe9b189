//! Held-duration tracking and released-note history.

use crate::bus::EventConsumer;
use crate::event::{Event, KeyIndex, Velocity, KEY_COUNT};
use crate::state::{PastNote, SharedState};
use std::sync::Arc;
use tracing::trace;

pub struct NoteLengthConsumer {
    state: Arc<SharedState>,
    max_age_ticks: u32,
    /// Velocity each key was struck with, kept until release.
    velocities_at_press: [u8; KEY_COUNT],
}

impl NoteLengthConsumer {
    pub fn new(state: Arc<SharedState>, max_age_ticks: u32) -> Self {
        Self {
            state,
            max_age_ticks,
            velocities_at_press: [0; KEY_COUNT],
        }
    }

    fn key_pressed(&mut self, key: KeyIndex, velocity: Velocity) {
        self.state.set_note_length(key, 1);
        self.velocities_at_press[key.index()] = velocity.get();
    }

    fn key_released(&mut self, key: KeyIndex) {
        let length = self.state.note_length(key);
        if length == 0 {
            // Stray note-offs still take a slot.
            trace!("Release of idle key {}", key.get());
        }
        let velocity = self.velocities_at_press[key.index()];

        self.state.set_note_length(key, 0);
        self.velocities_at_press[key.index()] = 0;

        self.state.push_past_note(PastNote {
            key,
            velocity_at_release: velocity,
            length_at_release: length,
            ticks_since_release: 1,
        });
    }

    fn clock_ticked(&mut self) {
        self.state.advance_note_lengths();
        self.state.age_past_notes(self.max_age_ticks);
    }
}

impl EventConsumer for NoteLengthConsumer {
    fn consume(&mut self, event: &Event) {
        match *event {
            Event::KeyPressed { key, velocity } => self.key_pressed(key, velocity),
            Event::KeyReleased { key } => self.key_released(key),
            Event::ClockTicked => self.clock_ticked(),
            Event::SustainPedalChanged { .. }
            | Event::SostenutoPedalChanged { .. }
            | Event::SoftPedalChanged { .. } => {}
        }
    }

    fn name(&self) -> &'static str {
        "NoteLengthConsumer"
    }
}
