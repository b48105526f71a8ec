use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::EventSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery diagnostics, informational only.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStats {
    pub registered_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub messages_sent: u64,
}

/// One observer's registration: transport handle plus diagnostics.
///
/// Added by `EventBus::subscribe`, removed by the broadcaster on first
/// delivery failure or by explicit `unsubscribe`. Never retried once removed.
pub struct Connection {
    id: ConnectionId,
    sink: Arc<dyn EventSink>,
    stats: ConnectionStats,
}

impl Connection {
    pub(crate) fn new(sink: Arc<dyn EventSink>) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            sink,
            stats: ConnectionStats {
                registered_at: now,
                last_activity: now,
                messages_sent: 0,
            },
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats.clone()
    }

    pub(crate) fn record_delivery(&mut self) {
        self.stats.messages_sent += 1;
        self.stats.last_activity = Utc::now();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("sink", &self.sink.name())
            .field("messages_sent", &self.stats.messages_sent)
            .finish()
    }
}
