use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub sync: SyncConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub liked_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub fetch_max_attempts: u32,
    pub fetch_backoff_ms: u64,
    pub auto_flush: bool,
    pub flush_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://127.0.0.1:3000".to_string(),
                request_timeout_ms: 10_000,
            },
            cache: CacheConfig {
                liked_ttl_secs: 300, // 5 minutes
            },
            sync: SyncConfig::default(),
            database: DatabaseConfig {
                url: "sqlite:data/engagement.db?mode=rwc".to_string(),
                max_connections: 5,
            },
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_max_attempts: 3,
            fetch_backoff_ms: 500,
            auto_flush: false,
            flush_interval_secs: 60,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl CacheConfig {
    pub fn liked_ttl(&self) -> Duration {
        Duration::from_secs(self.liked_ttl_secs)
    }
}

impl SyncConfig {
    /// `attempt` 回目の失敗後に待つ時間（線形バックオフ）
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.fetch_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        // 既定値
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("VIBE_API_BASE_URL") {
            let trimmed = v.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                cfg.api.base_url = trimmed.to_string();
            }
        }
        if let Some(value) = env_u64("VIBE_API_TIMEOUT_MS") {
            cfg.api.request_timeout_ms = value;
        }
        if let Some(value) = env_u64("VIBE_LIKES_CACHE_TTL_SECS") {
            cfg.cache.liked_ttl_secs = value;
        }
        if let Some(value) = env_u64("VIBE_FETCH_MAX_ATTEMPTS") {
            cfg.sync.fetch_max_attempts = value.min(u64::from(u32::MAX)) as u32;
        }
        if let Some(value) = env_u64("VIBE_FETCH_BACKOFF_MS") {
            cfg.sync.fetch_backoff_ms = value;
        }
        if let Ok(v) = std::env::var("VIBE_AUTO_FLUSH") {
            cfg.sync.auto_flush = parse_bool(&v, cfg.sync.auto_flush);
        }
        if let Some(value) = env_u64("VIBE_FLUSH_INTERVAL_SECS") {
            cfg.sync.flush_interval_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("VIBE_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v.trim().to_string();
            }
        }
        if let Some(value) = env_u64("VIBE_DATABASE_MAX_CONNECTIONS") {
            cfg.database.max_connections = value.min(u64::from(u32::MAX)) as u32;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api.base_url.trim().is_empty() {
            return Err("API base_url must not be empty".to_string());
        }
        if self.api.request_timeout_ms == 0 {
            return Err("API request_timeout_ms must be greater than 0".to_string());
        }
        if self.cache.liked_ttl_secs == 0 {
            return Err("Cache liked_ttl_secs must be greater than 0".to_string());
        }
        if self.sync.fetch_max_attempts == 0 {
            return Err("Sync fetch_max_attempts must be greater than 0".to_string());
        }
        if self.sync.auto_flush && self.sync.flush_interval_secs == 0 {
            return Err("Sync flush_interval_secs must be greater than 0".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| parse_u64(&v))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
