#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use mission_control::engine::{ExecutionStage, StageContext, StageOutcome};
use mission_control::error::{ControlError, Result};
use mission_control::events::{EventRecord, EventSink, EventType};

/// Sink that remembers every record it is handed.
pub struct RecordingSink {
    records: Mutex<Vec<EventRecord>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.records.lock().iter().map(|r| r.event_type).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn send(&self, record: &EventRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Sink whose every send fails; counts how often delivery was attempted.
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for FailingSink {
    async fn send(&self, _record: &EventRecord) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ControlError::Delivery("transport closed".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Sink that reports a dead transport; sends must never be attempted.
pub struct DeadSink {
    attempts: AtomicUsize,
}

impl DeadSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for DeadSink {
    async fn send(&self, _record: &EventRecord) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "dead"
    }
}

type StageScript = Box<dyn Fn(&StageContext) -> Result<StageOutcome> + Send + Sync>;

/// Executor driven by a closure; records every invocation.
pub struct ScriptedExecutor {
    calls: Mutex<Vec<StageContext>>,
    script: StageScript,
    delay: Duration,
}

impl ScriptedExecutor {
    pub fn new(
        script: impl Fn(&StageContext) -> Result<StageOutcome> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
            delay: Duration::ZERO,
        })
    }

    pub fn with_delay(
        delay: Duration,
        script: impl Fn(&StageContext) -> Result<StageOutcome> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
            delay,
        })
    }

    pub fn calls(&self) -> Vec<StageContext> {
        self.calls.lock().clone()
    }

    pub fn stage_calls(&self, stage: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.stage == stage).count()
    }
}

#[async_trait]
impl ExecutionStage for ScriptedExecutor {
    async fn execute(&self, ctx: &StageContext) -> Result<StageOutcome> {
        self.calls.lock().push(ctx.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.script)(ctx)
    }
}

/// Polls `cond` until it holds or the timeout elapses.
pub async fn wait_until(cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached within timeout");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
