use crate::application::ports::key_value_store::KeyValueStore;
use crate::domain::value_objects::PostId;
use crate::shared::error::AppError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const CHECKED_LIKES_KEY: &str = "checked_likes";

/// 今回のセッションで既にサーバーに問い合わせた投稿の集合
///
/// 同じ投稿への重複した状態確認を防ぐ。メモリ上の集合を正とし、
/// セッションスコープのストアへ書き写す。
#[derive(Clone)]
pub struct SessionDedupeSet {
    checked: Arc<RwLock<BTreeSet<PostId>>>,
    store: Arc<dyn KeyValueStore>,
}

impl SessionDedupeSet {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            checked: Arc::new(RwLock::new(BTreeSet::new())),
            store,
        }
    }

    pub async fn contains(&self, post_id: &PostId) -> bool {
        self.checked.read().await.contains(post_id)
    }

    pub async fn record(&self, post_id: &PostId) -> Result<(), AppError> {
        let payload = {
            let mut checked = self.checked.write().await;
            if !checked.insert(post_id.clone()) {
                return Ok(());
            }
            serde_json::to_string(&*checked)?
        };
        self.store.set(CHECKED_LIKES_KEY, &payload).await
    }

    pub async fn len(&self) -> usize {
        self.checked.read().await.len()
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.checked.write().await.clear();
        self.store.remove(CHECKED_LIKES_KEY).await
    }
}
