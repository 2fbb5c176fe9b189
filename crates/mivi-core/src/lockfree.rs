//! Lock-free cells shared between the dispatch thread and the renderer.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Atomic f32 with acquire/release semantics.
#[derive(Debug)]
pub struct AtomicFloat {
    value: AtomicF32,
}

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(value, Ordering::Release);
    }

    /// Multiply in place. Only one writer is expected (the dispatch lock holder),
    /// so a load/store pair is sufficient.
    #[inline]
    pub fn scale(&self, factor: f32) {
        self.set(self.get() * factor);
    }
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Atomic bool with acquire/release semantics.
#[derive(Debug, Default)]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }
}

/// Atomic tick counter.
#[derive(Debug, Default)]
pub struct AtomicTicks {
    value: AtomicU32,
}

impl AtomicTicks {
    #[inline]
    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: u32) {
        self.value.store(value, Ordering::Release);
    }

    #[inline]
    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::AcqRel);
    }
}
