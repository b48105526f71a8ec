use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MissionStarted,
    MissionProgress,
    MissionHealing,
    MissionCompleted,
    MissionFailed,
    MissionError,
    MissionCancelled,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissionStarted => "mission_started",
            Self::MissionProgress => "mission_progress",
            Self::MissionHealing => "mission_healing",
            Self::MissionCompleted => "mission_completed",
            Self::MissionFailed => "mission_failed",
            Self::MissionError => "mission_error",
            Self::MissionCancelled => "mission_cancelled",
        }
    }

    /// Exactly one terminal event closes each mission's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::MissionCompleted | Self::MissionFailed | Self::MissionCancelled
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::MissionFailed | Self::MissionError)
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Self::MissionStarted | Self::MissionProgress => Severity::Info,
            Self::MissionHealing | Self::MissionCancelled => Severity::Warning,
            Self::MissionCompleted => Severity::Success,
            Self::MissionFailed | Self::MissionError => Severity::Error,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
        };
        write!(f, "{}", s)
    }
}

/// One immutable observability fact. Owned by the bus queue until delivered;
/// cloned per connection at delivery time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub source: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub payload: Map<String, Value>,
}

impl EventRecord {
    pub fn new(
        event_type: EventType,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            source: source.into(),
            severity: event_type.default_severity(),
            message: message.into(),
            payload: Map::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn mission_id(&self) -> Option<&str> {
        self.payload.get("mission_id").and_then(Value::as_str)
    }
}
