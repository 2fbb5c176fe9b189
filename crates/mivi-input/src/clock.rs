//! Fixed-period tick source.
//!
//! A named thread publishes [`Event::ClockTicked`] every `interval` until the
//! producer is dropped. The tick cadence is independent of the renderer's frame
//! rate.

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, select, tick, Sender};
use mivi_core::{Event, EventBus};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

pub struct ClockTickProducer {
    interval: Duration,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ClockTickProducer {
    /// Start ticking. Fails only if the timer thread cannot be created.
    pub fn spawn(bus: Arc<EventBus>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::InvalidConfig(
                "clock interval must be greater than zero".to_string(),
            ));
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let thread = thread::Builder::new()
            .name("mivi-clock".to_string())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => bus.publish(Event::ClockTicked),
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                debug!("Clock thread stopped");
            })
            .map_err(Error::Timer)?;

        debug!("Clock started at {:?} per tick", interval);
        Ok(Self {
            interval,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for ClockTickProducer {
    fn drop(&mut self) {
        // Dropping the sender disconnects the channel and wakes the thread.
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mivi_core::EventConsumer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TickCounter(Arc<AtomicUsize>);

    impl EventConsumer for TickCounter {
        fn consume(&mut self, event: &Event) {
            if event.is_tick() {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_clock_ticks_until_dropped() {
        let bus = Arc::new(EventBus::new());
        let ticks = Arc::new(AtomicUsize::new(0));
        bus.register_consumer(Box::new(TickCounter(ticks.clone())));

        let clock = ClockTickProducer::spawn(bus, Duration::from_millis(5)).unwrap();
        assert_eq!(clock.interval(), Duration::from_millis(5));
        thread::sleep(Duration::from_millis(100));
        drop(clock);

        let after_drop = ticks.load(Ordering::SeqCst);
        assert!(after_drop > 0, "expected at least one tick");
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let bus = Arc::new(EventBus::new());
        assert!(matches!(
            ClockTickProducer::spawn(bus, Duration::ZERO),
            Err(Error::InvalidConfig(_))
        ));
    }
}
