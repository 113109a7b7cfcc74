pub mod key_value_store;
pub mod reconciliation;
