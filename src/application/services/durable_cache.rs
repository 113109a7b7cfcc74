use crate::application::ports::key_value_store::KeyValueStore;
use crate::domain::entities::LikedSet;
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// キャッシュ参照の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Fresh(LikedSet),
    /// TTL 切れ。フェッチが全滅した時の最終手段としてのみ使う
    Expired(LikedSet),
    Missing,
    Corrupted(String),
}

/// ユーザー単位の「いいね」集合を TTL 付きで保存する
#[derive(Clone)]
pub struct DurableCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl DurableCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }


    pub fn liked_key(user_id: &UserId) -> String {
        format!("user_likes_{}", user_id.as_str())
    }

    pub fn timestamp_key(user_id: &UserId) -> String {
        format!("user_likes_{}_timestamp", user_id.as_str())
    }

    pub async fn load_liked(&self, user_id: &UserId) -> Result<CacheLookup, AppError> {
        let Some(raw) = self.store.get(&Self::liked_key(user_id)).await? else {
            return Ok(CacheLookup::Missing);
        };

        let set = match serde_json::from_str::<LikedSet>(&raw) {
            Ok(set) => set,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "liked cache payload is corrupt");
                return Ok(CacheLookup::Corrupted(err.to_string()));
            }
        };

        // タイムスタンプが無い・読めない場合は期限切れ扱い
        let stored_at = self
            .store
            .get(&Self::timestamp_key(user_id))
            .await?
            .and_then(|value| value.trim().parse::<i64>().ok());

        let lookup = match stored_at {
            Some(stored_at) if self.is_fresh(stored_at, Utc::now().timestamp_millis()) => {
                CacheLookup::Fresh(set)
            }
            _ => CacheLookup::Expired(set),
        };
        debug!(
            user_id = %user_id,
            fresh = matches!(lookup, CacheLookup::Fresh(_)),
            "liked cache lookup"
        );
        Ok(lookup)
    }

    pub async fn store_liked(&self, user_id: &UserId, liked: &LikedSet) -> Result<(), AppError> {
        let payload = serde_json::to_string(liked)?;
        let now = Utc::now().timestamp_millis();
        self.store.set(&Self::liked_key(user_id), &payload).await?;
        self.store
            .set(&Self::timestamp_key(user_id), &now.to_string())
            .await?;
        Ok(())
    }

    fn is_fresh(&self, stored_at_ms: i64, now_ms: i64) -> bool {
        let age_ms = now_ms.saturating_sub(stored_at_ms);
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        age_ms < ttl_ms
    }
}
