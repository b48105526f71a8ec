//! Self-healing mission pipeline with live event fan-out.
//!
//! A mission is one natural-language request driven through an ordered
//! stage sequence by [`MissionEngine`]. Stage failures trigger bounded,
//! failure-aware retries ("healing") with a mutated prompt instead of
//! surfacing the first error. Progress streams through [`EventBus`], a
//! bounded drop-oldest queue with a single broadcaster task, so a slow or
//! dead observer can never stall mission execution.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod mission;

pub use config::{ControlConfig, EngineConfig, EventBusConfig, StageSpec};
pub use engine::{CancelFlag, ExecutionStage, MissionEngine, StageContext, StageOutcome};
pub use error::{ControlError, Result};
pub use events::{
    Connection, ConnectionId, ConnectionStats, EventBus, EventRecord, EventSink, EventType,
    LogSink, Severity,
};
pub use mission::{AgentType, MemoryStore, Mission, MissionStatus, MissionStore, StatusUpdate};
