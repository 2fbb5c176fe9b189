//! State written by the consumers and read by the renderer.
//!
//! One `SharedState` is created at startup and handed (behind an `Arc`) to the
//! consumers and to whatever draws the keyboard. Writes only happen while the
//! bus lock is held. Reads are lock-free for the per-key arrays: a frame may
//! observe some keys from before a tick and some from after, which is fine for
//! display purposes. The history ring takes a short read lock.

use crate::event::{KeyIndex, KEY_COUNT};
use crate::lockfree::{AtomicFlag, AtomicFloat, AtomicTicks};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A note that has been pressed and released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastNote {
    pub key: KeyIndex,
    pub velocity_at_release: u8,
    /// Ticks the key was held.
    pub length_at_release: u32,
    pub ticks_since_release: u32,
}

/// Fixed-size ring of released notes.
///
/// Writes go to the slot under the cursor regardless of what it holds, so once
/// the ring is full the oldest insertion is overwritten first. Slots also empty
/// out on their own when their note ages past the limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PastNoteRing {
    slots: Vec<Option<PastNote>>,
    cursor: usize,
}

impl PastNoteRing {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");
        Self {
            slots: vec![None; capacity],
            cursor: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot the next insertion will use.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Store `note` in the next slot, overwriting whatever is there.
    pub fn push(&mut self, note: PastNote) {
        self.slots[self.cursor] = Some(note);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Advance every occupied slot by one tick, clearing those older than
    /// `max_age_ticks`.
    pub fn age(&mut self, max_age_ticks: u32) {
        for slot in self.slots.iter_mut() {
            if let Some(note) = slot {
                note.ticks_since_release += 1;
                if note.ticks_since_release > max_age_ticks {
                    *slot = None;
                }
            }
        }
    }

    #[inline]
    pub fn slot(&self, index: usize) -> Option<PastNote> {
        self.slots.get(index).copied().flatten()
    }

    pub fn slots(&self) -> &[Option<PastNote>] {
        &self.slots
    }

    /// Occupied slots in physical order.
    pub fn iter(&self) -> impl Iterator<Item = &PastNote> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Process-wide note state.
#[derive(Debug)]
pub struct SharedState {
    note_velocities: [AtomicFloat; KEY_COUNT],
    note_lengths: [AtomicTicks; KEY_COUNT],
    sustain_pedal_on: AtomicFlag,
    sostenuto_pedal_on: AtomicFlag,
    soft_pedal_on: AtomicFlag,
    past_notes: RwLock<PastNoteRing>,
}

impl SharedState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            note_velocities: std::array::from_fn(|_| AtomicFloat::default()),
            note_lengths: std::array::from_fn(|_| AtomicTicks::default()),
            sustain_pedal_on: AtomicFlag::default(),
            sostenuto_pedal_on: AtomicFlag::default(),
            soft_pedal_on: AtomicFlag::default(),
            past_notes: RwLock::new(PastNoteRing::new(history_capacity)),
        }
    }

    // ==================== Renderer reads ====================

    /// Current perceived loudness of `key`.
    #[inline]
    pub fn note_velocity(&self, key: KeyIndex) -> f32 {
        self.note_velocities[key.index()].get()
    }

    /// Ticks `key` has been held; zero when up.
    #[inline]
    pub fn note_length(&self, key: KeyIndex) -> u32 {
        self.note_lengths[key.index()].get()
    }

    pub fn velocities(&self) -> [f32; KEY_COUNT] {
        std::array::from_fn(|i| self.note_velocities[i].get())
    }

    pub fn lengths(&self) -> [u32; KEY_COUNT] {
        std::array::from_fn(|i| self.note_lengths[i].get())
    }

    pub fn sustain_pedal_on(&self) -> bool {
        self.sustain_pedal_on.get()
    }

    pub fn sostenuto_pedal_on(&self) -> bool {
        self.sostenuto_pedal_on.get()
    }

    pub fn soft_pedal_on(&self) -> bool {
        self.soft_pedal_on.get()
    }

    /// Occupied history slots, in physical slot order.
    pub fn past_notes(&self) -> Vec<PastNote> {
        self.past_notes.read().iter().copied().collect()
    }

    /// Run `f` against the history ring under a read lock.
    pub fn with_past_notes<R>(&self, f: impl FnOnce(&PastNoteRing) -> R) -> R {
        f(&self.past_notes.read())
    }

    pub fn history_capacity(&self) -> usize {
        self.past_notes.read().capacity()
    }

    // ==================== Consumer writes ====================

    #[inline]
    pub(crate) fn set_note_velocity(&self, key: KeyIndex, velocity: f32) {
        self.note_velocities[key.index()].set(velocity);
    }

    #[inline]
    pub(crate) fn attenuate(&self, index: usize, factor: f32) {
        self.note_velocities[index].scale(factor);
    }

    #[inline]
    pub(crate) fn set_note_length(&self, key: KeyIndex, ticks: u32) {
        self.note_lengths[key.index()].set(ticks);
    }

    /// Bump every non-zero length by one tick.
    pub(crate) fn advance_note_lengths(&self) {
        for length in self.note_lengths.iter() {
            if length.get() != 0 {
                length.increment();
            }
        }
    }

    pub(crate) fn set_sustain_pedal(&self, on: bool) {
        self.sustain_pedal_on.set(on);
    }

    pub(crate) fn set_sostenuto_pedal(&self, on: bool) {
        self.sostenuto_pedal_on.set(on);
    }

    pub(crate) fn set_soft_pedal(&self, on: bool) {
        self.soft_pedal_on.set(on);
    }

    pub(crate) fn push_past_note(&self, note: PastNote) {
        self.past_notes.write().push(note);
    }

    pub(crate) fn age_past_notes(&self, max_age_ticks: u32) {
        self.past_notes.write().age(max_age_ticks);
    }
}
