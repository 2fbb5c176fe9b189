//! End-to-end flows through the bus with both stock consumers registered.

use approx::assert_relative_eq;
use std::sync::Arc;
use mivi_core::{
    register_default_consumers, EngineConfig, Event, EventBus, EventConsumer, KeyIndex,
    SharedState,
};

fn key(k: u8) -> KeyIndex {
    KeyIndex::new(k).unwrap()
}

fn engine(config: EngineConfig) -> (Arc<SharedState>, EventBus) {
    let state = Arc::new(SharedState::new(config.history_capacity));
    let bus = EventBus::new();
    register_default_consumers(&bus, &state, &config);
    (state, bus)
}

#[test]
fn test_press_hold_release_cycle() {
    let (state, bus) = engine(EngineConfig::default());

    bus.publish(Event::press(60, 100).unwrap());
    assert_eq!(state.note_velocity(key(60)), 100.0);
    assert_eq!(state.note_length(key(60)), 1);

    for _ in 0..4 {
        bus.publish(Event::ClockTicked);
    }
    // First tick skipped by the fresh bit, three held ticks after.
    assert_relative_eq!(
        state.note_velocity(key(60)),
        100.0 * 0.998 * 0.998 * 0.998,
        max_relative = 1e-6
    );
    assert_eq!(state.note_length(key(60)), 5);

    bus.publish(Event::release(60).unwrap());
    assert_eq!(state.note_length(key(60)), 0);
    let history = state.past_notes();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].key, key(60));
    assert_eq!(history[0].velocity_at_release, 100);
    assert_eq!(history[0].length_at_release, 5);

    let at_release = state.note_velocity(key(60));
    bus.publish(Event::ClockTicked);
    assert_eq!(state.note_velocity(key(60)), at_release);
    bus.publish(Event::ClockTicked);
    assert_relative_eq!(state.note_velocity(key(60)), at_release * 0.75);
}

#[test]
fn test_history_records_unsoftened_velocity() {
    let (state, bus) = engine(EngineConfig::default());
    bus.publish(Event::SoftPedalChanged { on: true });
    bus.publish(Event::press(60, 100).unwrap());
    bus.publish(Event::release(60).unwrap());

    assert_eq!(state.note_velocity(key(60)), 67.0);
    assert_eq!(state.past_notes()[0].velocity_at_release, 100);
}

#[test]
fn test_ring_holds_capacity_most_recent_releases() {
    let config = EngineConfig {
        history_capacity: 10,
        ..Default::default()
    };
    let (state, bus) = engine(config);

    for k in 0..11u8 {
        bus.publish(Event::press(30 + k, 64).unwrap());
        bus.publish(Event::ClockTicked);
        bus.publish(Event::release(30 + k).unwrap());
    }

    let mut keys: Vec<u8> = state.past_notes().iter().map(|n| n.key.get()).collect();
    keys.sort_unstable();
    assert_eq!(keys, (31..41).collect::<Vec<u8>>());
}

#[test]
fn test_long_silence_empties_history() {
    let config = EngineConfig {
        max_age_ticks: 50,
        ..Default::default()
    };
    let (state, bus) = engine(config);
    bus.publish(Event::press(72, 50).unwrap());
    bus.publish(Event::release(72).unwrap());

    for _ in 0..49 {
        bus.publish(Event::ClockTicked);
    }
    assert_eq!(state.past_notes().len(), 1);
    bus.publish(Event::ClockTicked);
    assert!(state.past_notes().is_empty());

    let velocity = state.note_velocity(key(72));
    assert!(velocity >= 0.0);
    assert!(velocity < 1e-3);
}

#[test]
fn test_consumer_ignoring_event_keeps_state() {
    struct PressCounter(usize);

    impl EventConsumer for PressCounter {
        fn consume(&mut self, event: &Event) {
            if let Event::KeyPressed { .. } = event {
                self.0 += 1;
            }
        }
    }

    let (state, bus) = engine(EngineConfig::default());
    bus.register_consumer(Box::new(PressCounter(0)));

    let before = state.velocities();
    bus.publish(Event::SostenutoPedalChanged { on: true });
    assert_eq!(state.velocities(), before);
    assert!(state.past_notes().is_empty());
    assert_eq!(bus.consumer_count(), 3);
}

#[test]
fn test_stray_note_off_overwrites_oldest_slot() {
    let config = EngineConfig {
        history_capacity: 2,
        ..Default::default()
    };
    let (state, bus) = engine(config);
    for k in [60, 61] {
        bus.publish(Event::press(k, 80).unwrap());
        bus.publish(Event::release(k).unwrap());
    }
    bus.publish(Event::release(62).unwrap());

    let keys: Vec<u8> = state.past_notes().iter().map(|n| n.key.get()).collect();
    assert_eq!(keys, vec![62, 61]);
    state.with_past_notes(|ring| assert_eq!(ring.cursor(), 1));
}
