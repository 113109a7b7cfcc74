use crate::domain::value_objects::{LikeAction, PostId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// トグル API の応答。`count` はサーバー側の正確な件数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleReceipt {
    pub action: LikeAction,
    pub count: i64,
}

/// サーバー（正）との通信ポート
#[async_trait]
pub trait ReconciliationClient: Send + Sync {
    async fn submit_toggle(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<ToggleReceipt, AppError>;

    async fn query_status(&self, post_id: &PostId, user_id: &UserId) -> Result<bool, AppError>;

    async fn fetch_liked(&self, user_id: &UserId) -> Result<Vec<PostId>, AppError>;
}
