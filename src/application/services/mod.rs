pub mod durable_cache;
pub mod engagement_store;
pub mod pending_action_log;
pub mod pending_replay;
pub mod session_dedupe;

pub use durable_cache::{CacheLookup, DurableCache};
pub use engagement_store::{EngagementStore, StoreSettings};
pub use pending_action_log::PendingActionLog;
pub use pending_replay::{PendingActionReplayer, ReplayReport};
pub use session_dedupe::SessionDedupeSet;
