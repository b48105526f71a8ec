use async_trait::async_trait;

use crate::error::Result;
use crate::mission::AgentType;

/// Inputs for one stage invocation.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub mission_id: String,
    /// Effective prompt for the current attempt; carries the healing
    /// mutation on retries.
    pub prompt: String,
    pub agent_type: AgentType,
    /// Stage identifier from the configured sequence.
    pub stage: String,
    /// 0 on the first pass, then the healing cycle count.
    pub attempt: u32,
}

/// What a stage reported. A failed outcome is data, not an `Err`; `Err`
/// from `execute` means the orchestration itself faulted.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl StageOutcome {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            output: None,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Performs one unit of real work. Opaque, possibly slow, possibly failing;
/// per-stage timeouts belong here, not in the engine.
#[async_trait]
pub trait ExecutionStage: Send + Sync {
    async fn execute(&self, ctx: &StageContext) -> Result<StageOutcome>;
}
