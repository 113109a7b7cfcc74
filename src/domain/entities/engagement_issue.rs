use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    TransportFailure,
    CacheCorruption,
}

/// ストア全体で保持する非致命的なエラー（明示的にクリアされるまで残る）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementIssue {
    pub kind: IssueKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl EngagementIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}
