mod common;

use std::sync::Arc;

use mission_control::config::EventBusConfig;
use mission_control::events::{EventBus, EventRecord, EventType};

use common::{DeadSink, FailingSink, RecordingSink, wait_until};

fn bus_with_capacity(queue_capacity: usize) -> EventBus {
    EventBus::new(&EventBusConfig { queue_capacity })
}

fn record(n: usize) -> EventRecord {
    EventRecord::new(EventType::MissionProgress, "test", format!("E{}", n))
}

#[tokio::test]
async fn test_queue_capacity_drop_oldest() {
    let bus = bus_with_capacity(3);

    for n in 1..=5 {
        bus.publish(record(n));
        assert!(bus.queue_len() <= 3);
    }
    assert_eq!(bus.queue_len(), 3);
    assert_eq!(bus.dropped_records(), 2);

    // Drain what is left; only the newest three survived.
    let sink = RecordingSink::new();
    bus.subscribe(sink.clone());
    let broadcaster = bus.spawn_broadcaster();
    bus.close();
    broadcaster.await.unwrap();

    assert_eq!(sink.messages(), vec!["E3", "E4", "E5"]);
}

#[tokio::test]
async fn test_delivery_preserves_publish_order_without_duplicates() {
    let bus = bus_with_capacity(64);
    let sink = RecordingSink::new();
    bus.subscribe(sink.clone());

    for n in 1..=10 {
        bus.publish(record(n));
    }
    let broadcaster = bus.spawn_broadcaster();
    bus.close();
    broadcaster.await.unwrap();

    let expected: Vec<String> = (1..=10).map(|n| format!("E{}", n)).collect();
    assert_eq!(sink.messages(), expected);
}

#[tokio::test]
async fn test_failing_connection_pruned_others_unaffected() {
    let bus = bus_with_capacity(64);
    let failing = FailingSink::new();
    let healthy = RecordingSink::new();
    bus.subscribe(failing.clone());
    bus.subscribe(healthy.clone());
    assert_eq!(bus.connection_count(), 2);

    for n in 1..=3 {
        bus.publish(record(n));
    }
    let broadcaster = bus.spawn_broadcaster();
    bus.close();
    broadcaster.await.unwrap();

    // One failed send removes the connection; it is never retried.
    assert_eq!(failing.attempts(), 1);
    assert_eq!(bus.connection_count(), 1);
    assert_eq!(healthy.messages(), vec!["E1", "E2", "E3"]);
}

#[tokio::test]
async fn test_dead_connection_pruned_without_send_attempt() {
    let bus = bus_with_capacity(64);
    let dead = DeadSink::new();
    let healthy = RecordingSink::new();
    bus.subscribe(dead.clone());
    bus.subscribe(healthy.clone());

    bus.publish(record(1));
    let broadcaster = bus.spawn_broadcaster();
    bus.close();
    broadcaster.await.unwrap();

    assert_eq!(dead.attempts(), 0);
    assert_eq!(bus.connection_count(), 1);
    assert_eq!(healthy.len(), 1);
}

#[tokio::test]
async fn test_unsubscribe_unknown_is_noop() {
    let bus = bus_with_capacity(8);
    let sink = RecordingSink::new();
    let id = bus.subscribe(sink);

    assert!(bus.unsubscribe(&id));
    assert!(!bus.unsubscribe(&id));
    assert_eq!(bus.connection_count(), 0);
}

#[tokio::test]
async fn test_publish_with_zero_subscribers() {
    let bus = bus_with_capacity(3);
    for n in 1..=5 {
        bus.publish(record(n));
    }
    assert_eq!(bus.queue_len(), 3);
    assert_eq!(bus.connection_count(), 0);
}

#[tokio::test]
async fn test_new_subscriber_gets_no_backlog() {
    let bus = bus_with_capacity(64);
    let early = RecordingSink::new();
    bus.subscribe(early.clone());
    let broadcaster = bus.spawn_broadcaster();

    for n in 1..=3 {
        bus.publish(record(n));
    }
    {
        let early = early.clone();
        wait_until(move || early.len() == 3).await;
    }

    let late = RecordingSink::new();
    bus.subscribe(late.clone());
    bus.publish(record(4));
    bus.publish(record(5));
    bus.close();
    broadcaster.await.unwrap();

    assert_eq!(late.messages(), vec!["E4", "E5"]);
    assert_eq!(early.len(), 5);
}

#[tokio::test]
async fn test_unsubscribed_connection_receives_nothing_further() {
    let bus = bus_with_capacity(64);
    let first = RecordingSink::new();
    let second = RecordingSink::new();
    let first_id = bus.subscribe(first.clone());
    bus.subscribe(second.clone());

    let broadcaster = bus.spawn_broadcaster();
    bus.publish(record(1));
    {
        let first = first.clone();
        let second = second.clone();
        wait_until(move || first.len() == 1 && second.len() == 1).await;
    }

    bus.unsubscribe(&first_id);
    bus.publish(record(2));
    bus.close();
    broadcaster.await.unwrap();

    assert_eq!(first.messages(), vec!["E1"]);
    assert_eq!(second.messages(), vec!["E1", "E2"]);
}

#[tokio::test]
async fn test_connection_stats_track_deliveries() {
    let bus = bus_with_capacity(64);
    let sink = RecordingSink::new();
    let id = bus.subscribe(sink);

    for n in 1..=4 {
        bus.publish(record(n));
    }
    let broadcaster = bus.spawn_broadcaster();
    bus.close();
    broadcaster.await.unwrap();

    let stats = bus.connection_stats(&id).expect("connection still registered");
    assert_eq!(stats.messages_sent, 4);
    assert!(stats.last_activity >= stats.registered_at);
}

#[tokio::test]
async fn test_capacity_floor_is_one() {
    let bus = bus_with_capacity(0);
    bus.publish(record(1));
    bus.publish(record(2));
    assert_eq!(bus.queue_len(), 1);
}
