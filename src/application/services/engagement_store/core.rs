use crate::application::ports::reconciliation::{ReconciliationClient, ToggleReceipt};
use crate::application::services::durable_cache::DurableCache;
use crate::application::services::pending_action_log::PendingActionLog;
use crate::application::services::session_dedupe::SessionDedupeSet;
use crate::domain::entities::{
    EngagementIssue, EngagementStats, IssueKind, LikedSet, PendingAction, VibePost,
};
use crate::domain::value_objects::{LikeKind, PostId, ToggleState, UserId};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// ネットワーク関連の調整値
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub request_timeout: Duration,
    pub fetch_max_attempts: u32,
    pub fetch_backoff: Duration,
}

impl StoreSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: config.api.request_timeout(),
            fetch_max_attempts: config.sync.fetch_max_attempts.max(1),
            fetch_backoff: Duration::from_millis(config.sync.fetch_backoff_ms),
        }
    }

    /// `attempt` 回目の失敗後の待ち時間
    pub(crate) fn backoff_for(&self, attempt: u32) -> Duration {
        self.fetch_backoff.saturating_mul(attempt)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Default)]
pub(crate) struct EngagementState {
    pub(crate) liked: LikedSet,
    pub(crate) stats: HashMap<PostId, EngagementStats>,
    pub(crate) feed: Vec<VibePost>,
    pub(crate) current_post: Option<VibePost>,
    pub(crate) toggle_states: HashMap<PostId, ToggleState>,
    pub(crate) last_error: Option<EngagementIssue>,
}

impl EngagementState {
    /// 正本・一覧・詳細のすべてに同じ変更を適用する
    pub(crate) fn update_stats<F>(&mut self, post_id: &PostId, mut apply: F)
    where
        F: FnMut(&mut EngagementStats),
    {
        apply(self.stats.entry(post_id.clone()).or_default());
        for post in self.feed.iter_mut().filter(|post| &post.id == post_id) {
            apply(&mut post.engagement_stats);
        }
        if let Some(post) = self
            .current_post
            .as_mut()
            .filter(|post| &post.id == post_id)
        {
            apply(&mut post.engagement_stats);
        }
    }

    pub(crate) fn raise(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.last_error = Some(EngagementIssue::new(kind, message));
    }
}

/// 「いいね」状態のオーケストレーター
///
/// メモリ上の集合とカウンタを正とし、楽観的更新 → 永続キャッシュ書き込み →
/// サーバー照合の順に処理する。クローンは同じ状態を共有する。
#[derive(Clone)]
pub struct EngagementStore {
    pub(crate) client: Arc<dyn ReconciliationClient>,
    pub(crate) cache: DurableCache,
    pub(crate) dedupe: SessionDedupeSet,
    pub(crate) pending: PendingActionLog,
    pub(crate) settings: StoreSettings,
    pub(crate) state: Arc<RwLock<EngagementState>>,
    tasks: Arc<Mutex<JoinSet<()>>>,
    settle_lock: Arc<Mutex<()>>,
    persist_lock: Arc<Mutex<()>>,
}

impl EngagementStore {
    pub fn new(
        client: Arc<dyn ReconciliationClient>,
        cache: DurableCache,
        dedupe: SessionDedupeSet,
        pending: PendingActionLog,
        settings: StoreSettings,
    ) -> Self {
        Self {
            client,
            cache,
            dedupe,
            pending,
            settings,
            state: Arc::new(RwLock::new(EngagementState::default())),
            tasks: Arc::new(Mutex::new(JoinSet::new())),
            settle_lock: Arc::new(Mutex::new(())),
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn pending_log(&self) -> &PendingActionLog {
        &self.pending
    }

    pub fn dedupe(&self) -> &SessionDedupeSet {
        &self.dedupe
    }

    /// 一覧表示の投稿を受け取り、カウンタを正本に取り込む
    pub async fn load_feed(&self, posts: Vec<VibePost>) {
        let mut state = self.state.write().await;
        for post in &posts {
            state.stats.insert(post.id.clone(), post.engagement_stats);
        }
        debug!(count = posts.len(), "feed loaded");
        state.feed = posts;
    }

    pub async fn set_current_post(&self, post: Option<VibePost>) {
        let mut state = self.state.write().await;
        if let Some(post) = &post {
            state.stats.insert(post.id.clone(), post.engagement_stats);
        }
        state.current_post = post;
    }

    pub async fn liked_post_ids(&self) -> Vec<PostId> {
        self.state.read().await.liked.to_vec()
    }

    pub async fn is_liked_locally(&self, post_id: &PostId) -> bool {
        self.state.read().await.liked.contains(post_id)
    }

    pub async fn stats_for(&self, post_id: &PostId) -> Option<EngagementStats> {
        self.state.read().await.stats.get(post_id).copied()
    }

    pub async fn feed(&self) -> Vec<VibePost> {
        self.state.read().await.feed.clone()
    }

    pub async fn current_post(&self) -> Option<VibePost> {
        self.state.read().await.current_post.clone()
    }

    pub async fn last_error(&self) -> Option<EngagementIssue> {
        self.state.read().await.last_error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.last_error = None;
    }

    pub async fn toggle_state(&self, post_id: &PostId) -> ToggleState {
        self.state
            .read()
            .await
            .toggle_states
            .get(post_id)
            .copied()
            .unwrap_or(ToggleState::Idle)
    }

    /// 実行中のバックグラウンド処理（照合・キャッシュ更新）がすべて終わるまで待つ
    pub async fn settle(&self) {
        // 並行して呼ばれても、先行する呼び出しの待機が終わるまで返さない
        let _guard = self.settle_lock.lock().await;
        loop {
            // 待機中に追加されたタスクは次の周回で拾う
            let mut drained = std::mem::take(&mut *self.tasks.lock().await);
            if drained.is_empty() {
                return;
            }
            while let Some(result) = drained.join_next().await {
                if let Err(err) = result {
                    warn!(error = %err, "background engagement task failed");
                }
            }
        }
    }

    pub(crate) async fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        // 終わったものは捨てておく
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// 全ての通信にタイムアウトをかける
    pub(crate) async fn with_timeout<T, F>(&self, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        tokio::time::timeout(self.settings.request_timeout, call)
            .await
            .map_err(AppError::from)?
    }

    /// 書き込み直前の集合を保存する。書き込み同士は直列化され、古い集合が後勝ちしない
    pub(crate) async fn persist_liked(&self, user_id: &UserId) {
        let _guard = self.persist_lock.lock().await;
        let liked = self.state.read().await.liked.clone();
        if let Err(err) = self.cache.store_liked(user_id, &liked).await {
            warn!(user_id = %user_id, error = %err, "failed to persist liked cache");
        }
    }

    /// サーバー応答を取り込む。カウンタは常にサーバー値で上書きし、
    /// 向きが想定と違えば集合を訂正する。
    pub(crate) async fn merge_receipt(
        &self,
        post_id: &PostId,
        user_id: &UserId,
        intended: LikeKind,
        receipt: ToggleReceipt,
    ) -> ToggleState {
        let expected = intended.expected_action();
        let corrected = receipt.action != expected;

        let outcome = if corrected {
            ToggleState::Corrected
        } else {
            ToggleState::Synced
        };

        {
            let mut state = self.state.write().await;
            state.update_stats(post_id, |stats| stats.overwrite_likes(receipt.count));
            state.toggle_states.insert(post_id.clone(), outcome);
            if corrected {
                state
                    .liked
                    .set_membership(post_id, receipt.action.is_liked());
            }
        }

        if corrected {
            warn!(
                post_id = %post_id,
                expected = %expected,
                actual = %receipt.action,
                "StateDivergence: server disagreed with optimistic like state"
            );
            self.persist_liked(user_id).await;
        } else {
            info!(post_id = %post_id, count = receipt.count, "like reconciled");
        }
        outcome
    }

    /// サーバーが既に意図どおりの状態だった場合に、集合だけ合わせる
    pub(crate) async fn confirm_membership(&self, post_id: &PostId, user_id: &UserId, liked: bool) {
        {
            let mut state = self.state.write().await;
            state
                .toggle_states
                .insert(post_id.clone(), ToggleState::Synced);
            if state.liked.contains(post_id) == liked {
                return;
            }
            state.liked.set_membership(post_id, liked);
        }
        self.persist_liked(user_id).await;
    }

    /// 通信失敗。楽観的な状態は残し、ペンディングログに積む
    pub(crate) async fn queue_failed(
        &self,
        post_id: &PostId,
        user_id: &UserId,
        intended: LikeKind,
        err: &AppError,
    ) {
        warn!(post_id = %post_id, kind = %intended, error = %err, "like request failed, queued for retry");
        {
            let mut state = self.state.write().await;
            state.raise(IssueKind::TransportFailure, err.to_string());
            state
                .toggle_states
                .insert(post_id.clone(), ToggleState::QueuedForRetry);
        }

        let action = PendingAction::new(intended, post_id.clone(), user_id.clone());
        match self.pending.append(action.clone()).await {
            Ok(_) => {}
            Err(AppError::CacheCorruption(message)) => {
                warn!(%message, "pending action log was corrupt, starting a new one");
                let retried = match self.pending.reset_if_corrupt().await {
                    Ok(_) => self.pending.append(action).await.map(|_| ()),
                    Err(err) => Err(err),
                };
                if let Err(err) = retried {
                    warn!(error = %err, "failed to record pending like action");
                }
            }
            Err(err) => warn!(error = %err, "failed to record pending like action"),
        }
    }

    pub(crate) async fn raise(&self, kind: IssueKind, message: impl Into<String>) {
        self.state.write().await.raise(kind, message);
    }
}

pub(crate) fn parse_ids(post_id: &str, user_id: &str) -> Result<(PostId, UserId), AppError> {
    let post_id = PostId::new(post_id).map_err(AppError::invalid_argument)?;
    let user_id = parse_user(user_id)?;
    Ok((post_id, user_id))
}

pub(crate) fn parse_user(user_id: &str) -> Result<UserId, AppError> {
    UserId::new(user_id).map_err(AppError::invalid_argument)
}
