use serde::{Deserialize, Serialize};
use std::fmt;

/// 1 回のトグル操作のライフサイクル
///
/// `Idle → OptimisticApplied → Reconciling → {Synced | Corrected | QueuedForRetry}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleState {
    Idle,
    OptimisticApplied,
    Reconciling,
    Synced,
    Corrected,
    QueuedForRetry,
}

impl ToggleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleState::Idle => "idle",
            ToggleState::OptimisticApplied => "optimistic_applied",
            ToggleState::Reconciling => "reconciling",
            ToggleState::Synced => "synced",
            ToggleState::Corrected => "corrected",
            ToggleState::QueuedForRetry => "queued_for_retry",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ToggleState::Synced | ToggleState::Corrected | ToggleState::QueuedForRetry
        )
    }
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
