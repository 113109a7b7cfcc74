pub mod engagement_issue;
pub mod engagement_stats;
pub mod liked_set;
pub mod pending_action;
pub mod post;

pub use engagement_issue::{EngagementIssue, IssueKind};
pub use engagement_stats::EngagementStats;
pub use liked_set::LikedSet;
pub use pending_action::PendingAction;
pub use post::VibePost;
