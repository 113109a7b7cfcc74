use super::engagement_stats::EngagementStats;
use crate::domain::value_objects::PostId;
use serde::{Deserialize, Serialize};

/// 画面が保持している投稿の表示用コピー（一覧・詳細）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibePost {
    pub id: PostId,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default, alias = "stats")]
    pub engagement_stats: EngagementStats,
}

impl VibePost {
    pub fn new(id: PostId, engagement_stats: EngagementStats) -> Self {
        Self {
            id,
            user_id: None,
            caption: None,
            engagement_stats,
        }
    }
}
