use super::core::{parse_ids, EngagementStore};
use crate::domain::value_objects::{LikeKind, PostId, ToggleState, UserId};
use crate::shared::error::AppError;
use crate::shared::metrics;
use tracing::debug;

impl EngagementStore {
    /// 現在の状態を反転する。楽観的更新が適用された時点で `true` を返す
    pub async fn toggle(&self, post_id: &str, user_id: &str) -> Result<bool, AppError> {
        let (post_id, user_id) = parse_ids(post_id, user_id)?;
        self.apply_intent(post_id, user_id, None).await
    }

    /// 既に「いいね」済みなら何もしない
    pub async fn like(&self, post_id: &str, user_id: &str) -> Result<bool, AppError> {
        let (post_id, user_id) = parse_ids(post_id, user_id)?;
        self.apply_intent(post_id, user_id, Some(LikeKind::Like))
            .await
    }

    /// 「いいね」していなければ何もしない
    pub async fn unlike(&self, post_id: &str, user_id: &str) -> Result<bool, AppError> {
        let (post_id, user_id) = parse_ids(post_id, user_id)?;
        self.apply_intent(post_id, user_id, Some(LikeKind::Unlike))
            .await
    }

    async fn apply_intent(
        &self,
        post_id: PostId,
        user_id: UserId,
        intent: Option<LikeKind>,
    ) -> Result<bool, AppError> {
        let kind = {
            let mut state = self.state.write().await;
            let currently_liked = state.liked.contains(&post_id);
            let kind = match intent {
                Some(kind) if kind.resulting_membership() == currently_liked => {
                    debug!(post_id = %post_id, kind = %kind, "like state already matches intent");
                    return Ok(true);
                }
                Some(kind) => kind,
                None => LikeKind::from_membership(currently_liked),
            };

            state
                .liked
                .set_membership(&post_id, kind.resulting_membership());
            state.update_stats(&post_id, |stats| match kind {
                LikeKind::Like => stats.increment_likes(),
                LikeKind::Unlike => stats.decrement_likes(),
            });
            state
                .toggle_states
                .insert(post_id.clone(), ToggleState::OptimisticApplied);
            kind
        };

        debug!(post_id = %post_id, kind = %kind, "optimistic like applied");
        self.persist_liked(&user_id).await;

        let store = self.clone();
        self.spawn_background(async move {
            store.reconcile(post_id, user_id, kind).await;
        })
        .await;

        Ok(true)
    }

    async fn reconcile(&self, post_id: PostId, user_id: UserId, kind: LikeKind) {
        self.state
            .write()
            .await
            .toggle_states
            .insert(post_id.clone(), ToggleState::Reconciling);

        let result = self
            .with_timeout(self.client.submit_toggle(&post_id, &user_id))
            .await;

        let outcome = match result {
            Ok(receipt) => self.merge_receipt(&post_id, &user_id, kind, receipt).await,
            Err(err) => {
                self.queue_failed(&post_id, &user_id, kind, &err).await;
                ToggleState::QueuedForRetry
            }
        };
        metrics::record_toggle_outcome(outcome);
    }
}
