//! Bounded event queue with best-effort fan-out.
//!
//! Publishers push records without ever blocking; a single broadcaster task
//! drains the queue and delivers each record to every registered connection.
//!
//! ## Rules
//! - **Drop-oldest**: a publish at capacity evicts the single oldest queued
//!   record. A record dropped this way is delivered to nobody.
//! - **Best-effort**: delivery failures prune the connection and are never
//!   surfaced to the publisher or to other connections.
//! - **Per-connection FIFO**: records a live connection does receive arrive
//!   in publish order, without duplication.
//! - **No backlog**: a new subscriber only sees records published after it
//!   subscribed (minus any capacity drops).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{Connection, ConnectionId, ConnectionStats, EventRecord, EventSink};
use crate::config::EventBusConfig;

/// Cheaply cloneable handle; all clones share one queue, one registry and
/// one broadcaster.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    capacity: usize,
    queue: Mutex<VecDeque<EventRecord>>,
    connections: Mutex<HashMap<ConnectionId, Connection>>,
    notify: Notify,
    dropped: AtomicU64,
    closed: AtomicBool,
}

impl EventBus {
    /// Capacity below 1 is clamped to 1.
    pub fn new(config: &EventBusConfig) -> Self {
        let capacity = config.queue_capacity.max(1);
        Self {
            inner: Arc::new(BusInner {
                capacity,
                queue: Mutex::new(VecDeque::with_capacity(capacity)),
                connections: Mutex::new(HashMap::new()),
                notify: Notify::new(),
                dropped: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Enqueues a record for broadcast. Non-blocking; callable concurrently
    /// from any mission task. At capacity the oldest queued record is
    /// evicted first.
    pub fn publish(&self, record: EventRecord) {
        {
            let mut queue = self.inner.queue.lock();
            if queue.len() >= self.inner.capacity {
                queue.pop_front();
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("Event queue at capacity, oldest record evicted");
            }
            queue.push_back(record);
        }
        self.inner.notify.notify_one();
    }

    /// Registers an observer and returns its connection id.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) -> ConnectionId {
        let connection = Connection::new(sink);
        let id = connection.id();
        self.inner.connections.lock().insert(id, connection);
        debug!(connection = %id, "Connection subscribed");
        id
    }

    /// Removes a connection. Unknown ids are a no-op; returns whether a
    /// connection was actually removed.
    pub fn unsubscribe(&self, id: &ConnectionId) -> bool {
        let removed = self.inner.connections.lock().remove(id).is_some();
        if removed {
            debug!(connection = %id, "Connection unsubscribed");
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.lock().len()
    }

    pub fn connection_stats(&self, id: &ConnectionId) -> Option<ConnectionStats> {
        self.inner.connections.lock().get(id).map(|c| c.stats())
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Records evicted for capacity since the bus was created.
    pub fn dropped_records(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Stops the broadcaster after it drains the remaining queue. Publishes
    /// after close still enqueue but may never be delivered.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
        self.inner.notify.notify_one();
    }

    /// Spawns the single broadcaster loop. Call once per bus.
    pub fn spawn_broadcaster(&self) -> JoinHandle<()> {
        let bus = self.clone();
        tokio::spawn(async move {
            debug!("Broadcaster started");
            while let Some(record) = bus.next_record().await {
                bus.deliver(&record).await;
            }
            debug!("Broadcaster stopped");
        })
    }

    /// Waiting here is the broadcaster's only idle suspension point.
    async fn next_record(&self) -> Option<EventRecord> {
        loop {
            if let Some(record) = self.inner.queue.lock().pop_front() {
                return Some(record);
            }
            if self.inner.closed.load(Ordering::SeqCst) {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }

    /// One fan-out pass: attempt delivery to every registered connection.
    /// A connection whose transport is non-live or whose send fails is
    /// unsubscribed immediately; the pass continues with the rest.
    async fn deliver(&self, record: &EventRecord) {
        let targets: Vec<(ConnectionId, Arc<dyn EventSink>)> = self
            .inner
            .connections
            .lock()
            .values()
            .map(|c| (c.id(), c.sink()))
            .collect();

        for (id, sink) in targets {
            if !sink.is_alive() {
                debug!(connection = %id, sink = sink.name(), "Pruning dead connection");
                self.unsubscribe(&id);
                continue;
            }
            match sink.send(record).await {
                Ok(()) => {
                    if let Some(connection) = self.inner.connections.lock().get_mut(&id) {
                        connection.record_delivery();
                    }
                }
                Err(e) => {
                    debug!(
                        connection = %id,
                        sink = sink.name(),
                        error = %e,
                        "Pruning connection after delivery failure"
                    );
                    self.unsubscribe(&id);
                }
            }
        }
    }
}
