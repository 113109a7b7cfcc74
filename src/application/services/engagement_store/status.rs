use super::core::{parse_ids, EngagementStore};
use crate::application::services::durable_cache::CacheLookup;
use crate::domain::entities::IssueKind;
use crate::shared::error::AppError;
use tracing::{debug, warn};

impl EngagementStore {
    /// 投稿が「いいね」済みかを判定する。
    ///
    /// メモリ → 永続キャッシュ → セッション内の確認済み集合 → サーバーの順に見て、
    /// 最初に答えが出たところで返す。通信エラー時はメモリ上の状態を返す。
    pub async fn check_liked(&self, post_id: &str, user_id: &str) -> Result<bool, AppError> {
        let (post_id, user_id) = parse_ids(post_id, user_id)?;

        if self.state.read().await.liked.contains(&post_id) {
            return Ok(true);
        }

        match self.cache.load_liked(&user_id).await {
            Ok(CacheLookup::Fresh(cached)) if cached.contains(&post_id) => {
                debug!(post_id = %post_id, "like status served from durable cache");
                self.state.write().await.liked.merge(&cached);
                return Ok(true);
            }
            Ok(CacheLookup::Corrupted(message)) => {
                self.raise(IssueKind::CacheCorruption, message).await;
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "liked cache unavailable"),
        }

        if self.dedupe.contains(&post_id).await {
            debug!(post_id = %post_id, "like status already checked this session");
            return Ok(false);
        }

        let liked = match self
            .with_timeout(self.client.query_status(&post_id, &user_id))
            .await
        {
            Ok(liked) => liked,
            Err(err) => {
                warn!(post_id = %post_id, error = %err, "like status check failed");
                let mut state = self.state.write().await;
                state.raise(IssueKind::TransportFailure, err.to_string());
                return Ok(state.liked.contains(&post_id));
            }
        };

        if let Err(err) = self.dedupe.record(&post_id).await {
            warn!(error = %err, "failed to record checked like");
        }

        if liked {
            self.state.write().await.liked.insert(post_id.clone());
            self.persist_liked(&user_id).await;
        }
        Ok(liked)
    }
}
