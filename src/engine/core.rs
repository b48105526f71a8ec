use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};

use super::signal::CancelFlag;
use super::stage::{ExecutionStage, StageContext};
use crate::config::EngineConfig;
use crate::error::{ControlError, Result};
use crate::events::{EventBus, EventRecord, EventType};
use crate::mission::{AgentType, Mission, MissionStatus, MissionStore, StatusUpdate};

/// Source label stamped on every record the engine emits.
const EVENT_SOURCE: &str = "mission_engine";

/// Result of one full traversal of the stage sequence.
enum PassOutcome {
    Completed(Option<String>),
    Failed(String),
    Cancelled,
}

/// Drives missions through the stage sequence, applying the healing policy
/// on failure and emitting one record per lifecycle transition.
///
/// Runs for distinct mission ids are independent and may execute
/// concurrently; they share only the bus and the store. At most one
/// in-flight `run` per mission id is admitted.
pub struct MissionEngine {
    config: EngineConfig,
    store: Arc<dyn MissionStore>,
    bus: EventBus,
    executor: Arc<dyn ExecutionStage>,
    active: DashMap<String, ()>,
    cancels: DashMap<String, CancelFlag>,
}

impl MissionEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn MissionStore>,
        bus: EventBus,
        executor: Arc<dyn ExecutionStage>,
    ) -> Self {
        Self {
            config,
            store,
            bus,
            executor,
            active: DashMap::new(),
            cancels: DashMap::new(),
        }
    }

    /// Creates the mission record in `Pending`. Rejects empty prompts and
    /// duplicate ids.
    pub async fn submit(
        &self,
        mission_id: &str,
        prompt: &str,
        agent_type: AgentType,
    ) -> Result<Mission> {
        if prompt.trim().is_empty() {
            return Err(ControlError::EmptyPrompt(mission_id.to_string()));
        }
        let mission = Mission::new(mission_id, prompt).with_agent_type(agent_type);
        self.store.create(mission.clone()).await?;
        info!(mission_id = %mission_id, agent_type = %agent_type, "Mission submitted");
        Ok(mission)
    }

    /// Flags a mission for cooperative cancellation. The running engine
    /// observes the flag at the next stage boundary; healing is skipped.
    pub fn cancel(&self, mission_id: &str) {
        self.cancels
            .entry(mission_id.to_string())
            .or_default()
            .cancel();
        info!(mission_id = %mission_id, "Cancellation requested");
    }

    pub async fn status(&self, mission_id: &str) -> Result<Mission> {
        self.store.get(mission_id).await
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// `submit` + `run` in one call.
    pub async fn submit_and_run(
        &self,
        mission_id: &str,
        prompt: &str,
        agent_type: AgentType,
    ) -> Result<MissionStatus> {
        self.submit(mission_id, prompt, agent_type).await?;
        self.run(mission_id).await
    }

    /// Drives a pending mission to a terminal status.
    ///
    /// Each healing cycle restarts the stage sequence from the first stage
    /// with a mutated prompt; the retry bound is a plain loop condition, so
    /// stack depth stays constant regardless of attempts.
    pub async fn run(&self, mission_id: &str) -> Result<MissionStatus> {
        let _guard = ActiveGuard::acquire(&self.active, mission_id)?;

        let mission = self.store.get(mission_id).await?;
        if mission.status != MissionStatus::Pending {
            return Err(ControlError::InvalidMissionState {
                expected: MissionStatus::Pending.to_string(),
                actual: mission.status.to_string(),
            });
        }
        let cancel = self
            .cancels
            .entry(mission_id.to_string())
            .or_default()
            .clone();

        self.store
            .update_status(
                mission_id,
                MissionStatus::Running,
                StatusUpdate::new().with_progress(self.config.start_progress),
            )
            .await?;
        self.emit(
            self.mission_event(mission_id, EventType::MissionStarted, "Mission started")
                .with_field("prompt", mission.prompt.clone())
                .with_field("agent_type", mission.agent_type.to_string()),
        );
        info!(mission_id = %mission_id, "Mission started");

        let original_prompt = mission.prompt.clone();
        let mut prompt = original_prompt.clone();
        let mut attempt: u32 = 0;

        loop {
            let outcome = match self
                .run_pass(mission_id, &prompt, mission.agent_type, attempt, &cancel)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    // Orchestration-level fault: report it, then let the
                    // healing policy treat it like a stage failure.
                    warn!(mission_id = %mission_id, error = %e, "Orchestration fault in stage pass");
                    self.emit(
                        self.mission_event(
                            mission_id,
                            EventType::MissionError,
                            "Orchestration fault",
                        )
                        .with_field("error", e.to_string()),
                    );
                    PassOutcome::Failed(e.to_string())
                }
            };

            match outcome {
                PassOutcome::Completed(output) => {
                    let result = output.unwrap_or_else(|| "mission complete".to_string());
                    self.store
                        .update_status(
                            mission_id,
                            MissionStatus::Completed,
                            StatusUpdate::new().with_progress(100).with_result(result.clone()),
                        )
                        .await?;
                    self.emit(
                        self.mission_event(
                            mission_id,
                            EventType::MissionCompleted,
                            "Mission completed",
                        )
                        .with_field("result", result),
                    );
                    info!(mission_id = %mission_id, attempts = attempt, "Mission completed");
                    self.cancels.remove(mission_id);
                    return Ok(MissionStatus::Completed);
                }
                PassOutcome::Cancelled => {
                    self.store
                        .update_status(mission_id, MissionStatus::Cancelled, StatusUpdate::new())
                        .await?;
                    self.emit(self.mission_event(
                        mission_id,
                        EventType::MissionCancelled,
                        "Mission cancelled",
                    ));
                    info!(mission_id = %mission_id, "Mission cancelled");
                    self.cancels.remove(mission_id);
                    return Ok(MissionStatus::Cancelled);
                }
                PassOutcome::Failed(error) => {
                    if attempt >= self.config.max_healing_attempts {
                        return self.fail(mission_id, &error).await;
                    }
                    attempt += 1;
                    self.store
                        .update_status(
                            mission_id,
                            MissionStatus::Healing,
                            StatusUpdate::new()
                                .with_attempt_count(attempt)
                                .with_progress(0)
                                .with_error(error.clone()),
                        )
                        .await?;
                    self.emit(
                        self.mission_event(mission_id, EventType::MissionHealing, "Mission healing")
                            .with_field("error", error.clone())
                            .with_field("attempt", attempt),
                    );
                    warn!(
                        mission_id = %mission_id,
                        attempt,
                        error = %error,
                        "Stage pass failed, healing"
                    );
                    if attempt >= self.config.max_healing_attempts {
                        // Healing budget exhausted by this cycle; no
                        // further pass is started.
                        return self.fail(mission_id, &error).await;
                    }
                    prompt = healing_prompt(&original_prompt, &error);
                    self.store
                        .update_status(
                            mission_id,
                            MissionStatus::Running,
                            StatusUpdate::new().with_progress(self.config.start_progress),
                        )
                        .await?;
                }
            }
        }
    }

    async fn fail(&self, mission_id: &str, error: &str) -> Result<MissionStatus> {
        self.store
            .update_status(
                mission_id,
                MissionStatus::Failed,
                StatusUpdate::new().with_error(error),
            )
            .await?;
        self.emit(
            self.mission_event(mission_id, EventType::MissionFailed, "Mission failed")
                .with_field("error", error.to_string()),
        );
        warn!(mission_id = %mission_id, error = %error, "Mission failed");
        self.cancels.remove(mission_id);
        Ok(MissionStatus::Failed)
    }

    /// One traversal of the configured stage sequence. Cancellation is
    /// checked at every stage boundary. A stage-reported failure becomes a
    /// `Failed` outcome; an `Err` from the executor or the store propagates
    /// as an orchestration fault.
    async fn run_pass(
        &self,
        mission_id: &str,
        prompt: &str,
        agent_type: AgentType,
        attempt: u32,
        cancel: &CancelFlag,
    ) -> Result<PassOutcome> {
        let total = self.config.stages.len();
        let mut output = None;

        for (index, stage) in self.config.stages.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(PassOutcome::Cancelled);
            }
            debug!(mission_id = %mission_id, stage = %stage.id, attempt, "Executing stage");
            let ctx = StageContext {
                mission_id: mission_id.to_string(),
                prompt: prompt.to_string(),
                agent_type,
                stage: stage.id.clone(),
                attempt,
            };
            let outcome = self.executor.execute(&ctx).await?;
            if !outcome.success {
                let error = outcome
                    .error
                    .unwrap_or_else(|| format!("stage '{}' reported failure", stage.id));
                return Ok(PassOutcome::Failed(error));
            }
            if outcome.output.is_some() {
                output = outcome.output;
            }
            if index + 1 < total {
                self.store
                    .update_status(
                        mission_id,
                        MissionStatus::Running,
                        StatusUpdate::new().with_progress(stage.progress),
                    )
                    .await?;
                self.emit(
                    self.mission_event(
                        mission_id,
                        EventType::MissionProgress,
                        format!("Stage '{}' complete", stage.id),
                    )
                    .with_field("percent", stage.progress)
                    .with_field("stage", stage.id.clone()),
                );
            }
        }
        Ok(PassOutcome::Completed(output))
    }

    fn mission_event(
        &self,
        mission_id: &str,
        event_type: EventType,
        message: impl Into<String>,
    ) -> EventRecord {
        EventRecord::new(event_type, EVENT_SOURCE, message).with_field("mission_id", mission_id)
    }

    fn emit(&self, record: EventRecord) {
        self.bus.publish(record);
    }
}

/// Prompt mutation applied on each healing cycle. Always derived from the
/// original prompt so mutations do not compound across attempts.
fn healing_prompt(original: &str, error: &str) -> String {
    format!(
        "Original prompt failed due to '{}'. Re-attempt with more robustness. Original prompt: {}",
        error, original
    )
}

/// Registry entry guaranteeing at most one in-flight `run` per mission id.
/// Removal happens on drop, including on early return.
struct ActiveGuard<'a> {
    active: &'a DashMap<String, ()>,
    mission_id: String,
}

impl<'a> ActiveGuard<'a> {
    fn acquire(active: &'a DashMap<String, ()>, mission_id: &str) -> Result<Self> {
        match active.entry(mission_id.to_string()) {
            Entry::Occupied(_) => Err(ControlError::MissionAlreadyRunning(mission_id.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(());
                Ok(Self {
                    active,
                    mission_id: mission_id.to_string(),
                })
            }
        }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.active.remove(&self.mission_id);
    }
}
