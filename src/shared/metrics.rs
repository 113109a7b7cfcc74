use crate::domain::value_objects::ToggleState;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetricsSnapshot {
    pub toggles_synced: u64,
    pub toggles_corrected: u64,
    pub toggles_queued: u64,
    pub replay_acknowledged: u64,
    pub replay_failed: u64,
    pub last_toggle_ms: Option<u64>,
    pub last_replay_ms: Option<u64>,
    pub last_outcome: Option<ToggleState>,
}

struct EngagementMetrics {
    synced: AtomicU64,
    corrected: AtomicU64,
    queued: AtomicU64,
    replay_acknowledged: AtomicU64,
    replay_failed: AtomicU64,
    last_toggle_ms: AtomicU64,
    last_replay_ms: AtomicU64,
    last_outcome: Mutex<Option<ToggleState>>,
}

impl EngagementMetrics {
    fn new() -> Self {
        Self {
            synced: AtomicU64::new(0),
            corrected: AtomicU64::new(0),
            queued: AtomicU64::new(0),
            replay_acknowledged: AtomicU64::new(0),
            replay_failed: AtomicU64::new(0),
            last_toggle_ms: AtomicU64::new(0),
            last_replay_ms: AtomicU64::new(0),
            last_outcome: Mutex::new(None),
        }
    }

    fn record_toggle(&self, outcome: ToggleState) {
        let counter = match outcome {
            ToggleState::Synced => &self.synced,
            ToggleState::Corrected => &self.corrected,
            ToggleState::QueuedForRetry => &self.queued,
            // 終端状態以外は数えない
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.last_toggle_ms
            .store(current_unix_ms(), Ordering::Relaxed);
        if let Ok(mut guard) = self.last_outcome.lock() {
            *guard = Some(outcome);
        }
    }

    fn record_replay(&self, acknowledged: u64, failed: u64) {
        self.replay_acknowledged
            .fetch_add(acknowledged, Ordering::Relaxed);
        self.replay_failed.fetch_add(failed, Ordering::Relaxed);
        self.last_replay_ms
            .store(current_unix_ms(), Ordering::Relaxed);
    }

    fn snapshot(&self) -> EngagementMetricsSnapshot {
        let last_outcome = self
            .last_outcome
            .lock()
            .map(|guard| *guard)
            .unwrap_or(None);

        EngagementMetricsSnapshot {
            toggles_synced: self.synced.load(Ordering::Relaxed),
            toggles_corrected: self.corrected.load(Ordering::Relaxed),
            toggles_queued: self.queued.load(Ordering::Relaxed),
            replay_acknowledged: self.replay_acknowledged.load(Ordering::Relaxed),
            replay_failed: self.replay_failed.load(Ordering::Relaxed),
            last_toggle_ms: to_option(self.last_toggle_ms.load(Ordering::Relaxed)),
            last_replay_ms: to_option(self.last_replay_ms.load(Ordering::Relaxed)),
            last_outcome,
        }
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

static ENGAGEMENT_METRICS: LazyLock<EngagementMetrics> = LazyLock::new(EngagementMetrics::new);

pub fn record_toggle_outcome(outcome: ToggleState) {
    ENGAGEMENT_METRICS.record_toggle(outcome);
}

pub fn record_replay(acknowledged: u64, failed: u64) {
    ENGAGEMENT_METRICS.record_replay(acknowledged, failed);
}

pub fn snapshot() -> EngagementMetricsSnapshot {
    ENGAGEMENT_METRICS.snapshot()
}
