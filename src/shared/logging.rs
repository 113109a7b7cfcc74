use tracing_subscriber::EnvFilter;

/// `RUST_LOG` が無ければ `default_level` を使う
pub fn init(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // 二重初期化（テストなど）は無視する
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_ok() {
        tracing::info!(json, "logging initialized");
    }
}
