//! Synthetic performer for running without hardware.
//!
//! Every `interval_ms` a random key in the piano range is struck with a random
//! velocity and scheduled for release after a random hold. Releases are
//! tracked on the same thread, so the bus always sees a matching release for
//! every press, including on shutdown.

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, select, Sender};
use mivi_core::{Event, EventBus, KeyIndex, Velocity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomInputConfig {
    /// Time between strikes.
    pub interval_ms: u64,
    pub min_hold_ms: u64,
    /// Exclusive.
    pub max_hold_ms: u64,
    pub lowest_key: u8,
    pub highest_key: u8,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for RandomInputConfig {
    fn default() -> Self {
        Self {
            interval_ms: 200,
            min_hold_ms: 50,
            max_hold_ms: 1000,
            lowest_key: 21,
            highest_key: 108,
            seed: None,
        }
    }
}

impl RandomInputConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "random.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_hold_ms <= self.min_hold_ms {
            return Err(Error::InvalidConfig(format!(
                "random hold range {}..{} ms is empty",
                self.min_hold_ms, self.max_hold_ms
            )));
        }
        if self.highest_key > KeyIndex::MAX.get() || self.lowest_key > self.highest_key {
            return Err(Error::InvalidConfig(format!(
                "random key range {}..={} must lie within 0..=127",
                self.lowest_key, self.highest_key
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// One generated strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomNote {
    pub key: KeyIndex,
    pub velocity: Velocity,
    pub hold: Duration,
}

/// Deterministic for a given seed.
pub struct RandomNoteSource {
    rng: StdRng,
    config: RandomInputConfig,
}

impl RandomNoteSource {
    pub fn new(config: RandomInputConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { rng, config })
    }

    pub fn next_note(&mut self) -> RandomNote {
        let key = self
            .rng
            .gen_range(self.config.lowest_key..=self.config.highest_key);
        let velocity = self.rng.gen_range(1..=Velocity::MAX.get());
        let hold = self
            .rng
            .gen_range(self.config.min_hold_ms..self.config.max_hold_ms);
        RandomNote {
            // Both ranges are checked by `validate`.
            key: KeyIndex::new(key).unwrap_or(KeyIndex::MAX),
            velocity: Velocity::new(velocity).unwrap_or(Velocity::MAX),
            hold: Duration::from_millis(hold),
        }
    }
}

pub struct RandomInputProducer {
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RandomInputProducer {
    pub fn spawn(bus: Arc<EventBus>, config: RandomInputConfig) -> Result<Self> {
        let interval = config.interval();
        let mut source = RandomNoteSource::new(config)?;

        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let thread = thread::Builder::new()
            .name("mivi-random".to_string())
            .spawn(move || {
                let mut held: Vec<(Instant, KeyIndex)> = Vec::new();
                let mut next_strike = Instant::now() + interval;

                loop {
                    let now = Instant::now();
                    held.retain(|&(due, key)| {
                        if due <= now {
                            bus.publish(Event::key_released(key));
                            false
                        } else {
                            true
                        }
                    });

                    if next_strike <= now {
                        let note = source.next_note();
                        if held.iter().any(|&(_, key)| key == note.key) {
                            trace!("Key {} still held, skipping strike", note.key.get());
                        } else {
                            bus.publish(Event::key_pressed(note.key, note.velocity));
                            held.push((now + note.hold, note.key));
                        }
                        next_strike += interval;
                    }

                    let deadline = held
                        .iter()
                        .map(|&(due, _)| due)
                        .fold(next_strike, Instant::min);
                    select! {
                        recv(shutdown_rx) -> _ => break,
                        default(deadline.saturating_duration_since(Instant::now())) => {}
                    }
                }

                for (_, key) in held.drain(..) {
                    bus.publish(Event::key_released(key));
                }
                debug!("Random input thread stopped");
            })
            .map_err(Error::Timer)?;

        debug!("Random input started, one strike per {:?}", interval);
        Ok(Self {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

impl Drop for RandomInputProducer {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
