use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MissionStatus;
use crate::error::ControlError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub prompt: String,
    pub status: MissionStatus,

    /// 0-100, monotonic within a single attempt, reset when healing restarts
    /// the stage sequence.
    #[serde(default)]
    pub progress: u8,

    /// Number of healing cycles consumed. Starts at 0, never decrements.
    #[serde(default)]
    pub attempt_count: u32,

    #[serde(default)]
    pub agent_type: AgentType,

    #[serde(default)]
    pub result: Option<String>,

    #[serde(default)]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mission {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            prompt: prompt.into(),
            status: MissionStatus::Pending,
            progress: 0,
            attempt_count: 0,
            agent_type: AgentType::General,
            result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_agent_type(mut self, agent_type: AgentType) -> Self {
        self.agent_type = agent_type;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == MissionStatus::Completed
    }
}

/// Which worker pool a mission's stages are dispatched to. Opaque to the
/// engine; passed through to the stage executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    #[default]
    General,
    CodeGen,
    Research,
    Ops,
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::General => "general",
            Self::CodeGen => "code_gen",
            Self::Research => "research",
            Self::Ops => "ops",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AgentType {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "code_gen" | "codegen" => Ok(Self::CodeGen),
            "research" => Ok(Self::Research),
            "ops" => Ok(Self::Ops),
            other => Err(ControlError::Config(format!(
                "unknown agent type: {}",
                other
            ))),
        }
    }
}
