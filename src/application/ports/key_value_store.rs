use crate::shared::error::AppError;
use async_trait::async_trait;

/// 永続化先に依存しない最小限のキー・バリューストア
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
