use crate::application::ports::key_value_store::KeyValueStore;
use crate::application::ports::reconciliation::ReconciliationClient;
use crate::application::services::{
    DurableCache, EngagementStore, PendingActionLog, PendingActionReplayer, SessionDedupeSet,
    StoreSettings,
};
use crate::domain::value_objects::UserId;
use crate::infrastructure::http::HttpReconciliationClient;
use crate::infrastructure::storage::{MemoryKeyValueStore, SqliteKeyValueStore};
use crate::shared::config::AppConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// アプリケーション全体の状態を管理する構造体
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: EngagementStore,
    pub replayer: PendingActionReplayer,
}

impl AppState {
    /// 設定に従って SQLite と HTTP クライアントを組み立てる
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        let durable = SqliteKeyValueStore::connect(
            &config.database.url,
            config.database.max_connections,
        )
        .await?;
        let client = HttpReconciliationClient::new(
            config.api.base_url.clone(),
            config.api.request_timeout(),
        )?;

        info!(base_url = %config.api.base_url, "engagement state initialized");

        Ok(Self::from_parts(
            config,
            Arc::new(client),
            Arc::new(durable),
            Arc::new(MemoryKeyValueStore::new()),
        ))
    }

    /// 永続ストアとセッションストアを分けて注入する
    pub fn from_parts(
        config: AppConfig,
        client: Arc<dyn ReconciliationClient>,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> Self {
        let store = EngagementStore::new(
            client,
            DurableCache::new(durable.clone(), config.cache.liked_ttl()),
            SessionDedupeSet::new(session),
            PendingActionLog::new(durable),
            StoreSettings::from_config(&config),
        );
        let replayer = PendingActionReplayer::new(store.clone());

        Self {
            config,
            store,
            replayer,
        }
    }

    /// `sync.auto_flush` が有効な場合だけ再送タスクを起動する
    pub fn start_auto_flush(&self, user_id: UserId) -> Option<JoinHandle<()>> {
        if !self.config.sync.auto_flush {
            return None;
        }
        info!(
            user_id = %user_id,
            interval_secs = self.config.sync.flush_interval_secs,
            "pending like auto flush enabled"
        );
        Some(
            self.replayer
                .schedule(self.config.sync.flush_interval(), user_id),
        )
    }
}
