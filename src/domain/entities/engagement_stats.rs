use serde::{Deserialize, Deserializer, Serialize};

/// 投稿ごとのエンゲージメント数
///
/// 受信時は `[likes, comments, views]` の三つ組とキー付きレコードの両方を受け付け、
/// 送信時は常にキー付きレコードで書き出す。負数は 0 に丸める。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementStats {
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_views: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEngagementStats {
    Triple(i64, i64, i64),
    Record {
        #[serde(default)]
        total_likes: i64,
        #[serde(default)]
        total_comments: i64,
        #[serde(default)]
        total_views: i64,
    },
}

impl<'de> Deserialize<'de> for EngagementStats {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawEngagementStats::deserialize(deserializer)?;
        Ok(match raw {
            RawEngagementStats::Triple(likes, comments, views) => {
                Self::from_counts(likes, comments, views)
            }
            RawEngagementStats::Record {
                total_likes,
                total_comments,
                total_views,
            } => Self::from_counts(total_likes, total_comments, total_views),
        })
    }
}

impl EngagementStats {
    pub fn new(total_likes: u64, total_comments: u64, total_views: u64) -> Self {
        Self {
            total_likes,
            total_comments,
            total_views,
        }
    }

    pub fn from_counts(likes: i64, comments: i64, views: i64) -> Self {
        Self {
            total_likes: clamp_count(likes),
            total_comments: clamp_count(comments),
            total_views: clamp_count(views),
        }
    }

    pub fn increment_likes(&mut self) {
        self.total_likes = self.total_likes.saturating_add(1);
    }

    pub fn decrement_likes(&mut self) {
        self.total_likes = self.total_likes.saturating_sub(1);
    }

    /// サーバーが返した値で上書きする
    pub fn overwrite_likes(&mut self, server_count: i64) {
        self.total_likes = clamp_count(server_count);
    }
}

fn clamp_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
