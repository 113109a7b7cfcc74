pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::services::{EngagementStore, PendingActionReplayer, ReplayReport};
pub use shared::{AppConfig, AppError, Result};
pub use state::AppState;

/// ログ設定の初期化（`RUST_LOG` があればそちらを優先）
pub fn init_logging(level: &str, json: bool) {
    shared::logging::init(level, json);
}
