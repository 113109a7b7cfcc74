use crate::application::ports::key_value_store::KeyValueStore;
use crate::application::ports::reconciliation::{ReconciliationClient, ToggleReceipt};
use crate::application::services::durable_cache::DurableCache;
use crate::application::services::engagement_store::{EngagementStore, StoreSettings};
use crate::application::services::pending_action_log::PendingActionLog;
use crate::application::services::session_dedupe::SessionDedupeSet;
use crate::domain::entities::{EngagementStats, VibePost};
use crate::domain::value_objects::{LikeAction, PostId, UserId};
use crate::infrastructure::storage::MemoryKeyValueStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use mockall::mock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

mock! {
    pub Client {}

    #[async_trait]
    impl ReconciliationClient for Client {
        async fn submit_toggle(&self, post_id: &PostId, user_id: &UserId) -> Result<ToggleReceipt, AppError>;
        async fn query_status(&self, post_id: &PostId, user_id: &UserId) -> Result<bool, AppError>;
        async fn fetch_liked(&self, user_id: &UserId) -> Result<Vec<PostId>, AppError>;
    }
}

/// `release` されるまでトグル応答を返さないクライアント
pub struct GatedClient {
    pub gate: Arc<Notify>,
    pub receipt: ToggleReceipt,
}

#[async_trait]
impl ReconciliationClient for GatedClient {
    async fn submit_toggle(&self, _: &PostId, _: &UserId) -> Result<ToggleReceipt, AppError> {
        self.gate.notified().await;
        Ok(self.receipt)
    }

    async fn query_status(&self, _: &PostId, _: &UserId) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn fetch_liked(&self, _: &UserId) -> Result<Vec<PostId>, AppError> {
        Ok(Vec::new())
    }
}

/// 応答しないサーバー
pub struct HangingClient;

#[async_trait]
impl ReconciliationClient for HangingClient {
    async fn submit_toggle(&self, _: &PostId, _: &UserId) -> Result<ToggleReceipt, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(receipt(LikeAction::Liked, 1))
    }

    async fn query_status(&self, _: &PostId, _: &UserId) -> Result<bool, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(true)
    }

    async fn fetch_liked(&self, _: &UserId) -> Result<Vec<PostId>, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

/// 最初の「いいね」集合の書き込みだけを `release` まで止めるストア
#[derive(Clone)]
pub struct GatedKeyValueStore {
    pub inner: MemoryKeyValueStore,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
    armed: Arc<AtomicBool>,
}

impl GatedKeyValueStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryKeyValueStore::new(),
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            armed: Arc::new(AtomicBool::new(true)),
        }
    }
}

#[async_trait]
impl KeyValueStore for GatedKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        if key == "user_likes_user-1" && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.inner.remove(key).await
    }
}

pub struct Harness {
    pub store: EngagementStore,
    pub durable: MemoryKeyValueStore,
}

pub fn fast_settings() -> StoreSettings {
    StoreSettings {
        request_timeout: Duration::from_secs(5),
        fetch_max_attempts: 3,
        fetch_backoff: Duration::from_millis(1),
    }
}

pub fn harness<C>(client: C) -> Harness
where
    C: ReconciliationClient + 'static,
{
    harness_with(client, fast_settings())
}

pub fn harness_with<C>(client: C, settings: StoreSettings) -> Harness
where
    C: ReconciliationClient + 'static,
{
    let durable = MemoryKeyValueStore::new();
    let store = EngagementStore::new(
        Arc::new(client),
        DurableCache::new(Arc::new(durable.clone()), Duration::from_secs(300)),
        SessionDedupeSet::new(Arc::new(MemoryKeyValueStore::new())),
        PendingActionLog::new(Arc::new(durable.clone())),
        settings,
    );
    Harness { store, durable }
}

pub fn store_with_durable<C>(client: C, durable: Arc<dyn KeyValueStore>) -> EngagementStore
where
    C: ReconciliationClient + 'static,
{
    EngagementStore::new(
        Arc::new(client),
        DurableCache::new(durable.clone(), Duration::from_secs(300)),
        SessionDedupeSet::new(Arc::new(MemoryKeyValueStore::new())),
        PendingActionLog::new(durable),
        fast_settings(),
    )
}

pub fn post(id: &str) -> PostId {
    PostId::new(id).unwrap()
}

pub fn user() -> UserId {
    UserId::new("user-1").unwrap()
}

pub fn receipt(action: LikeAction, count: i64) -> ToggleReceipt {
    ToggleReceipt { action, count }
}

pub fn vibe(id: &str, likes: u64) -> VibePost {
    VibePost::new(post(id), EngagementStats::new(likes, 2, 30))
}

/// 永続キャッシュを直接書き込む（`age_ms` 前に保存された扱い）
pub async fn seed_cache(durable: &MemoryKeyValueStore, ids: &[&str], age_ms: i64) {
    let payload = serde_json::to_string(ids).unwrap();
    let stored_at = chrono::Utc::now().timestamp_millis() - age_ms;
    durable.set("user_likes_user-1", &payload).await.unwrap();
    durable
        .set("user_likes_user-1_timestamp", &stored_at.to_string())
        .await
        .unwrap();
}

pub async fn cached_ids(durable: &MemoryKeyValueStore) -> Option<Vec<String>> {
    durable
        .get("user_likes_user-1")
        .await
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}
