use super::core::{parse_user, EngagementStore};
use crate::application::services::durable_cache::CacheLookup;
use crate::domain::entities::{IssueKind, LikedSet};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use tracing::{debug, info, warn};

impl EngagementStore {
    /// ユーザーの「いいね」一覧を読み込む。
    ///
    /// 新しいキャッシュがあれば即座に適用し、サーバーからの更新は裏で行う。
    pub async fn fetch_all_liked_by_user(&self, user_id: &str) -> Result<(), AppError> {
        let user_id = parse_user(user_id)?;

        let lookup = match self.cache.load_liked(&user_id).await {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(error = %err, "liked cache unavailable");
                CacheLookup::Missing
            }
        };

        match lookup {
            CacheLookup::Fresh(cached) => {
                debug!(user_id = %user_id, count = cached.len(), "applied fresh liked cache");
                self.state.write().await.liked = cached;
                let store = self.clone();
                self.spawn_background(async move {
                    store.refresh_liked(&user_id, None).await;
                })
                .await;
            }
            CacheLookup::Corrupted(message) => {
                self.raise(IssueKind::CacheCorruption, message).await;
                self.refresh_liked(&user_id, Some(LikedSet::new())).await;
            }
            CacheLookup::Expired(stale) => {
                self.refresh_liked(&user_id, Some(stale)).await;
            }
            CacheLookup::Missing => {
                self.refresh_liked(&user_id, Some(LikedSet::new())).await;
            }
        }
        Ok(())
    }

    /// 変更系の操作の前に、メモリ上の集合を前回の状態に揃える。
    ///
    /// 新しいキャッシュがあればそれを取り込むだけで、裏での更新は行わない
    /// （直後の楽観的更新を上書きしないため）。無ければサーバーから取得する。
    pub async fn hydrate(&self, user_id: &str) -> Result<(), AppError> {
        let user = parse_user(user_id)?;
        match self.cache.load_liked(&user).await {
            Ok(CacheLookup::Fresh(cached)) => {
                debug!(user_id = %user, count = cached.len(), "hydrated from liked cache");
                self.state.write().await.liked.merge(&cached);
                Ok(())
            }
            _ => self.fetch_all_liked_by_user(user_id).await,
        }
    }

    /// リトライ付きでサーバーから取得し、全滅した場合は `fallback` を使う。
    /// `None` なら現在のメモリ上の集合を残す。
    async fn refresh_liked(&self, user_id: &UserId, fallback: Option<LikedSet>) {
        match self.fetch_liked_with_retry(user_id).await {
            Ok(fetched) => {
                info!(user_id = %user_id, count = fetched.len(), "liked set refreshed");
                self.state.write().await.liked = fetched;
                self.persist_liked(user_id).await;
            }
            Err(err) => {
                let mut state = self.state.write().await;
                state.raise(IssueKind::TransportFailure, err.to_string());
                match fallback {
                    Some(fallback) if fallback.is_empty() => {
                        warn!(user_id = %user_id, error = %err, "no liked cache, starting empty");
                        state.liked = fallback;
                    }
                    Some(stale) => {
                        warn!(user_id = %user_id, error = %err, "using expired liked cache");
                        state.liked = stale;
                    }
                    None => {
                        warn!(user_id = %user_id, error = %err, "background liked refresh failed");
                    }
                }
            }
        }
    }

    async fn fetch_liked_with_retry(&self, user_id: &UserId) -> Result<LikedSet, AppError> {
        let max_attempts = self.settings.fetch_max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self
                .with_timeout(self.client.fetch_liked(user_id))
                .await
            {
                Ok(ids) => return Ok(ids.into_iter().collect()),
                Err(err) if attempt < max_attempts => {
                    let delay = self.settings.backoff_for(attempt);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "liked fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
