pub mod like_action;
pub mod post_id;
pub mod toggle_state;
pub mod user_id;

pub use like_action::{LikeAction, LikeKind};
pub use post_id::PostId;
pub use toggle_state::ToggleState;
pub use user_id::UserId;
