use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use super::{Mission, MissionStatus};
use crate::error::{ControlError, Result};

/// Field changes applied alongside a status update.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub progress: Option<u8>,
    pub attempt_count: Option<u32>,
    pub result: Option<String>,
    pub error_message: Option<String>,
}

impl StatusUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_attempt_count(mut self, attempt_count: u32) -> Self {
        self.attempt_count = Some(attempt_count);
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error_message = Some(error.into());
        self
    }
}

/// Persistence seam for mission records.
///
/// The engine is the only writer after submission. Implementations must be
/// safe for concurrent use and must reject mutation of terminal missions.
#[async_trait]
pub trait MissionStore: Send + Sync {
    async fn create(&self, mission: Mission) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Mission>;

    /// Applies a status change plus any accompanying fields, returning the
    /// updated record. Same-status updates (e.g. running progress ticks) are
    /// allowed for non-terminal missions.
    async fn update_status(
        &self,
        id: &str,
        status: MissionStatus,
        update: StatusUpdate,
    ) -> Result<Mission>;

    async fn list(&self) -> Result<Vec<Mission>>;
}

/// In-memory store. Single-process by design; durable persistence lives
/// behind the same trait.
#[derive(Default)]
pub struct MemoryStore {
    missions: RwLock<HashMap<String, Mission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MissionStore for MemoryStore {
    async fn create(&self, mission: Mission) -> Result<()> {
        let mut missions = self.missions.write();
        if missions.contains_key(&mission.id) {
            return Err(ControlError::MissionAlreadyExists(mission.id));
        }
        debug!(mission_id = %mission.id, "Mission record created");
        missions.insert(mission.id.clone(), mission);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Mission> {
        self.missions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ControlError::MissionNotFound(id.to_string()))
    }

    async fn update_status(
        &self,
        id: &str,
        status: MissionStatus,
        update: StatusUpdate,
    ) -> Result<Mission> {
        let mut missions = self.missions.write();
        let mission = missions
            .get_mut(id)
            .ok_or_else(|| ControlError::MissionNotFound(id.to_string()))?;

        if mission.status.is_terminal() {
            return Err(ControlError::InvalidMissionState {
                expected: "non-terminal".into(),
                actual: mission.status.to_string(),
            });
        }
        if status != mission.status && !mission.status.can_transition_to(status) {
            let allowed = mission
                .status
                .allowed_transitions()
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ControlError::InvalidStateTransition {
                from: mission.status.to_string(),
                to: status.to_string(),
                allowed,
            });
        }

        mission.status = status;
        if let Some(progress) = update.progress {
            mission.progress = progress.min(100);
        }
        if let Some(attempt_count) = update.attempt_count {
            mission.attempt_count = attempt_count;
        }
        if let Some(result) = update.result {
            mission.result = Some(result);
        }
        if let Some(error) = update.error_message {
            mission.error_message = Some(error);
        }
        mission.updated_at = Utc::now();

        debug!(
            mission_id = %id,
            status = %mission.status,
            progress = mission.progress,
            "Mission status updated"
        );
        Ok(mission.clone())
    }

    async fn list(&self) -> Result<Vec<Mission>> {
        let mut missions: Vec<Mission> = self.missions.read().values().cloned().collect();
        missions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(missions)
    }
}
