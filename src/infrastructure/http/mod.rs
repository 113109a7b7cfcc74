pub mod reconciliation_client;

pub use reconciliation_client::HttpReconciliationClient;
