use crate::application::ports::reconciliation::ToggleReceipt;
use crate::application::services::engagement_store::core::parse_user;
use crate::application::services::engagement_store::EngagementStore;
use crate::domain::entities::{IssueKind, PendingAction};
use crate::domain::value_objects::{PostId, UserId};
use crate::shared::error::AppError;
use crate::shared::metrics;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub attempted: usize,
    pub acknowledged: usize,
    pub failed: usize,
}

enum ReplayOutcome {
    /// サーバーが既に意図どおりだった
    AlreadyApplied,
    Applied(ToggleReceipt),
}

/// ペンディングログの再送
#[derive(Clone)]
pub struct PendingActionReplayer {
    store: EngagementStore,
}

impl PendingActionReplayer {
    pub fn new(store: EngagementStore) -> Self {
        Self { store }
    }

    /// ユーザーの未送信操作を投稿ごとに最新の意図へまとめて再送する。
    /// 受理されたものだけログから消える。
    pub async fn flush(&self, user_id: &str) -> Result<ReplayReport, AppError> {
        let user_id = parse_user(user_id)?;
        let latest = collapse_latest(self.store.pending_log().list().await?, &user_id);

        let mut report = ReplayReport {
            attempted: latest.len(),
            ..ReplayReport::default()
        };
        let mut acknowledged: BTreeMap<PostId, i64> = BTreeMap::new();

        for (post_id, action) in latest {
            match self.replay_one(&action).await {
                Ok(ReplayOutcome::AlreadyApplied) => {
                    self.store
                        .confirm_membership(&post_id, &user_id, action.kind.resulting_membership())
                        .await;
                    acknowledged.insert(post_id, action.timestamp);
                }
                Ok(ReplayOutcome::Applied(receipt)) => {
                    self.store
                        .merge_receipt(&post_id, &user_id, action.kind, receipt)
                        .await;
                    if receipt.action == action.kind.expected_action() {
                        acknowledged.insert(post_id, action.timestamp);
                    } else {
                        warn!(
                            post_id = %post_id,
                            kind = %action.kind,
                            actual = %receipt.action,
                            "replayed like landed the other way, keeping it queued"
                        );
                        report.failed += 1;
                    }
                }
                Err(err) => {
                    warn!(post_id = %post_id, error = %err, "pending like replay failed");
                    if err.is_transport() {
                        self.store
                            .raise(IssueKind::TransportFailure, err.to_string())
                            .await;
                    }
                    report.failed += 1;
                }
            }
        }

        report.acknowledged = acknowledged.len();
        if !acknowledged.is_empty() {
            // 再送中に追記されたより新しい操作は残す
            self.store
                .pending_log()
                .retain(|entry| {
                    entry.user_id != user_id
                        || acknowledged
                            .get(&entry.post_id)
                            .map_or(true, |acked_at| entry.timestamp > *acked_at)
                })
                .await?;
        }

        metrics::record_replay(report.acknowledged as u64, report.failed as u64);
        info!(
            user_id = %user_id,
            attempted = report.attempted,
            acknowledged = report.acknowledged,
            failed = report.failed,
            "pending like replay finished"
        );
        Ok(report)
    }

    async fn replay_one(&self, action: &PendingAction) -> Result<ReplayOutcome, AppError> {
        let server_liked = self
            .store
            .with_timeout(
                self.store
                    .client
                    .query_status(&action.post_id, &action.user_id),
            )
            .await?;
        if server_liked == action.kind.resulting_membership() {
            return Ok(ReplayOutcome::AlreadyApplied);
        }

        let receipt = self
            .store
            .with_timeout(
                self.store
                    .client
                    .submit_toggle(&action.post_id, &action.user_id),
            )
            .await?;
        Ok(ReplayOutcome::Applied(receipt))
    }

    /// `every` ごとに再送する常駐タスクを起動する
    pub fn schedule(&self, every: Duration, user_id: UserId) -> JoinHandle<()> {
        let replayer = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            loop {
                interval.tick().await;

                if let Err(e) = replayer.flush(user_id.as_str()).await {
                    tracing::error!("Pending like replay error: {}", e);
                }
            }
        })
    }
}

/// 投稿ごとに最新の意図だけを残す（同時刻なら後に積まれた方）
fn collapse_latest(actions: Vec<PendingAction>, user_id: &UserId) -> BTreeMap<PostId, PendingAction> {
    let mut latest: BTreeMap<PostId, PendingAction> = BTreeMap::new();
    for action in actions.into_iter().filter(|a| &a.user_id == user_id) {
        let newer = latest
            .get(&action.post_id)
            .map_or(true, |current| action.timestamp >= current.timestamp);
        if newer {
            latest.insert(action.post_id.clone(), action);
        }
    }
    latest
}
