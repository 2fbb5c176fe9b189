//! In-process event bus.
//!
//! `publish` fans an event out to every registered consumer, in registration
//! order, on the calling thread. The consumer list sits behind a single lock
//! that is held for the whole fan-out, so events from the clock thread and the
//! input threads are applied one at a time and never interleave.
//!
//! There is no queue and no recovery: a consumer that panics aborts the
//! process, since the remaining consumers would otherwise see a half-applied
//! tick.

use crate::event::Event;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, trace};

/// Something that reacts to bus events.
///
/// Handlers must be total: kinds a consumer does not care about are ignored,
/// and nothing is returned. Publishing from inside `consume` deadlocks.
pub trait EventConsumer: Send {
    fn consume(&mut self, event: &Event);

    /// Name used in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Synchronous fan-out dispatcher.
#[derive(Default)]
pub struct EventBus {
    consumers: Mutex<Vec<Box<dyn EventConsumer>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a consumer. Intended for startup wiring.
    pub fn register_consumer(&self, consumer: Box<dyn EventConsumer>) {
        let mut consumers = self.consumers.lock();
        tracing::debug!(
            "Registered consumer {}: {}",
            consumers.len(),
            consumer.name()
        );
        consumers.push(consumer);
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.lock().len()
    }

    /// Deliver `event` to every consumer before returning.
    pub fn publish(&self, event: Event) {
        let mut consumers = self.consumers.lock();
        if !event.is_tick() {
            trace!("Publishing {:?}", event);
        }
        for consumer in consumers.iter_mut() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| consumer.consume(&event)));
            if result.is_err() {
                error!(
                    "Consumer {} panicked while handling {}; aborting",
                    consumer.name(),
                    event.kind()
                );
                std::process::abort();
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("consumers", &self.consumer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyIndex;
    use std::sync::Arc;

    struct Recorder {
        id: usize,
        log: Arc<Mutex<Vec<(usize, Event)>>>,
    }

    impl EventConsumer for Recorder {
        fn consume(&mut self, event: &Event) {
            self.log.lock().push((self.id, *event));
        }
    }

    #[test]
    fn test_publish_reaches_consumers_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            bus.register_consumer(Box::new(Recorder {
                id,
                log: log.clone(),
            }));
        }
        assert_eq!(bus.consumer_count(), 3);

        bus.publish(Event::ClockTicked);
        let release = Event::key_released(KeyIndex::new(60).unwrap());
        bus.publish(release);

        let log = log.lock();
        let ids: Vec<usize> = log.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 1, 2]);
        assert!(log[..3].iter().all(|(_, e)| e.is_tick()));
        assert!(log[3..].iter().all(|(_, e)| *e == release));
    }

    #[test]
    fn test_publish_without_consumers_is_noop() {
        let bus = EventBus::new();
        bus.publish(Event::SustainPedalChanged { on: true });
        assert_eq!(bus.consumer_count(), 0);
    }

    #[test]
    fn test_concurrent_publishers_are_serialized() {
        struct Counter {
            inside: Arc<std::sync::atomic::AtomicBool>,
            seen: Arc<std::sync::atomic::AtomicUsize>,
        }

        impl EventConsumer for Counter {
            fn consume(&mut self, _event: &Event) {
                use std::sync::atomic::Ordering;
                assert!(!self.inside.swap(true, Ordering::SeqCst));
                self.seen.fetch_add(1, Ordering::SeqCst);
                self.inside.store(false, Ordering::SeqCst);
            }
        }

        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        bus.register_consumer(Box::new(Counter {
            inside: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            seen: seen.clone(),
        }));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        bus.publish(Event::ClockTicked);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1000);
    }
}
