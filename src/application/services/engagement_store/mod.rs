pub mod core;
mod fetch;
mod status;
mod toggle;


pub use self::core::{EngagementStore, StoreSettings};
