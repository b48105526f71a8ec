use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Pending,
    Running,
    Healing,
    Completed,
    Failed,
    Cancelled,
}

impl MissionStatus {
    pub fn allowed_transitions(&self) -> &'static [MissionStatus] {
        use MissionStatus::*;
        match self {
            Pending => &[Running, Cancelled],
            Running => &[Healing, Completed, Failed, Cancelled],
            Healing => &[Running, Failed, Cancelled],
            Completed => &[],
            Failed => &[],
            Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: MissionStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MissionStatus::Completed | MissionStatus::Failed | MissionStatus::Cancelled
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MissionStatus::Running | MissionStatus::Healing)
    }

    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Healing => "healing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}
