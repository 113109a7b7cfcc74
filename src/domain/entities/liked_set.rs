use crate::domain::value_objects::PostId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 現在のユーザーが「いいね」した投稿の集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikedSet(BTreeSet<PostId>);

impl LikedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, post_id: &PostId) -> bool {
        self.0.contains(post_id)
    }

    /// 追加された場合に true
    pub fn insert(&mut self, post_id: PostId) -> bool {
        self.0.insert(post_id)
    }

    /// 削除された場合に true
    pub fn remove(&mut self, post_id: &PostId) -> bool {
        self.0.remove(post_id)
    }

    pub fn set_membership(&mut self, post_id: &PostId, liked: bool) {
        if liked {
            self.0.insert(post_id.clone());
        } else {
            self.0.remove(post_id);
        }
    }

    pub fn merge(&mut self, other: &LikedSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostId> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<PostId> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<PostId> for LikedSet {
    fn from_iter<I: IntoIterator<Item = PostId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
