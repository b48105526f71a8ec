use async_trait::async_trait;
use tracing::info;

use super::EventRecord;
use crate::error::Result;

/// Delivery transport for one observer.
///
/// The bus requires only "send one JSON-serializable record" and "report
/// liveness"; the wire protocol behind `send` is the implementor's concern.
/// A failed send permanently removes the connection, so implementations
/// should only return `Err` for conditions that will not recover.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, record: &EventRecord) -> Result<()>;

    /// Checked before each delivery; a non-live sink is pruned without a
    /// send attempt.
    fn is_alive(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}

/// Sink that emits one JSON line per record through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for LogSink {
    async fn send(&self, record: &EventRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        info!(target: "mission_control::events", "{}", line);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
