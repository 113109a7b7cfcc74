use crate::application::ports::key_value_store::KeyValueStore;
use crate::domain::entities::PendingAction;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const PENDING_ACTIONS_KEY: &str = "pending_like_actions";

/// サーバーに届かなかったトグル操作の追記専用ログ
///
/// 読み込み→変更→書き込みを 1 つのロックで直列化する。
#[derive(Clone)]
pub struct PendingActionLog {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl PendingActionLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn append(&self, action: PendingAction) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut actions = self.read_all().await?;
        info!(
            post_id = %action.post_id,
            user_id = %action.user_id,
            kind = %action.kind,
            "queued pending like action"
        );
        actions.push(action);
        self.write_all(&actions).await?;
        Ok(actions.len())
    }

    pub async fn list(&self) -> Result<Vec<PendingAction>, AppError> {
        self.read_all().await
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(PENDING_ACTIONS_KEY).await
    }

    /// `keep` が false を返したエントリを削除し、削除件数を返す
    pub async fn retain<F>(&self, mut keep: F) -> Result<usize, AppError>
    where
        F: FnMut(&PendingAction) -> bool + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut actions = self.read_all().await?;
        let before = actions.len();
        actions.retain(|action| keep(action));
        let removed = before - actions.len();
        if removed > 0 {
            self.write_all(&actions).await?;
        }
        Ok(removed)
    }

    async fn read_all(&self) -> Result<Vec<PendingAction>, AppError> {
        let Some(raw) = self.store.get(PENDING_ACTIONS_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(actions) => Ok(actions),
            Err(err) => Err(AppError::CacheCorruption(format!(
                "pending action log is unreadable: {err}"
            ))),
        }
    }

    async fn write_all(&self, actions: &[PendingAction]) -> Result<(), AppError> {
        if actions.is_empty() {
            return self.store.remove(PENDING_ACTIONS_KEY).await;
        }
        let payload = serde_json::to_string(actions)?;
        self.store.set(PENDING_ACTIONS_KEY, &payload).await
    }

    /// 壊れたログを退避せずに破棄する
    pub async fn reset_if_corrupt(&self) -> Result<bool, AppError> {
        match self.list().await {
            Err(AppError::CacheCorruption(message)) => {
                warn!(%message, "dropping corrupt pending action log");
                self.clear().await?;
                Ok(true)
            }
            Err(err) => Err(err),
            Ok(_) => Ok(false),
        }
    }
}
