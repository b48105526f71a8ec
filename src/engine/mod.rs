//! Mission execution engine.
//!
//! - `MissionEngine`: Lifecycle state machine with bounded failure-aware healing
//! - `ExecutionStage`: Seam for the real per-stage work
//! - `CancelFlag`: Cooperative cancellation, checked at stage boundaries

mod core;
mod signal;
mod stage;

pub use self::core::MissionEngine;
pub use signal::CancelFlag;
pub use stage::{ExecutionStage, StageContext, StageOutcome};
