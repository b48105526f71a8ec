use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{ControlError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub engine: EngineConfig,
    pub events: EventBusConfig,
}

impl ControlConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ControlError::Config(e.to_string()))?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.events.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Healing cycles allowed per mission before a failure is terminal.
    pub max_healing_attempts: u32,
    /// Progress recorded when a pass enters the first stage.
    pub start_progress: u8,
    /// Ordered stage identifiers with their progress checkpoints.
    pub stages: Vec<StageSpec>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_healing_attempts: 2,
            start_progress: 5,
            stages: vec![
                StageSpec::new("generate", 25),
                StageSpec::new("apply", 50),
                StageSpec::new("verify", 75),
                StageSpec::new("finalize", 100),
            ],
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(ControlError::Config("stage sequence is empty".into()));
        }
        let mut previous = self.start_progress;
        for stage in &self.stages {
            if stage.id.trim().is_empty() {
                return Err(ControlError::Config("stage id is empty".into()));
            }
            if stage.progress > 100 {
                return Err(ControlError::Config(format!(
                    "stage '{}' checkpoint {} exceeds 100",
                    stage.id, stage.progress
                )));
            }
            if stage.progress < previous {
                return Err(ControlError::Config(format!(
                    "stage '{}' checkpoint {} regresses below {}",
                    stage.id, stage.progress, previous
                )));
            }
            previous = stage.progress;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    pub id: String,
    pub progress: u8,
}

impl StageSpec {
    pub fn new(id: impl Into<String>, progress: u8) -> Self {
        Self {
            id: id.into(),
            progress,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Bounded queue size; the oldest record is evicted on overflow.
    pub queue_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
        }
    }
}

impl EventBusConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(ControlError::Config("queue_capacity must be >= 1".into()));
        }
        Ok(())
    }
}
