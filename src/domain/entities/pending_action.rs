use crate::domain::value_objects::{LikeKind, PostId, UserId};
use serde::{Deserialize, Serialize};

/// サーバーに届かなかったトグル操作の記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    #[serde(rename = "type")]
    pub kind: LikeKind,
    pub post_id: PostId,
    pub user_id: UserId,
    /// epoch millis
    pub timestamp: i64,
}

impl PendingAction {
    pub fn new(kind: LikeKind, post_id: PostId, user_id: UserId) -> Self {
        Self {
            kind,
            post_id,
            user_id,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
