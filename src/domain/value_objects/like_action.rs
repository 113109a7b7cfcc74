use serde::{Deserialize, Serialize};
use std::fmt;

/// クライアントが意図した操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeKind {
    Like,
    Unlike,
}

/// サーバーが報告した結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeAction {
    Liked,
    Unliked,
}

impl LikeKind {
    pub fn from_membership(currently_liked: bool) -> Self {
        if currently_liked {
            LikeKind::Unlike
        } else {
            LikeKind::Like
        }
    }

    pub fn expected_action(self) -> LikeAction {
        match self {
            LikeKind::Like => LikeAction::Liked,
            LikeKind::Unlike => LikeAction::Unliked,
        }
    }

    /// この操作を適用した後の「いいね済み」状態
    pub fn resulting_membership(self) -> bool {
        matches!(self, LikeKind::Like)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LikeKind::Like => "like",
            LikeKind::Unlike => "unlike",
        }
    }
}

impl LikeAction {
    pub fn is_liked(self) -> bool {
        matches!(self, LikeAction::Liked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LikeAction::Liked => "liked",
            LikeAction::Unliked => "unliked",
        }
    }
}

impl fmt::Display for LikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LikeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
