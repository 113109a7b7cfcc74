#![allow(dead_code)]

use reqwest::Url;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;
use tempfile::TempDir;
use tiny_http::{Header, Response, Server};
use vibe_engagement::infrastructure::http::HttpReconciliationClient;
use vibe_engagement::infrastructure::storage::{MemoryKeyValueStore, SqliteKeyValueStore};
use vibe_engagement::{AppConfig, AppState};

#[derive(Debug)]
pub struct MockHttpResponse {
    pub status: u16,
    pub body: Value,
}

impl MockHttpResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub params: HashMap<String, String>,
    pub body: Option<Value>,
}

/// 受け取った順に `responses` を返すモックサーバー
pub fn spawn_json_sequence_server(
    responses: Vec<MockHttpResponse>,
) -> (String, Receiver<CapturedRequest>, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("mock server");
    let base_url = format!("http://{}", server.server_addr());
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        for response_spec in responses {
            let mut request = match server.recv_timeout(StdDuration::from_secs(8)) {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(_) => break,
            };

            let parsed =
                Url::parse(&format!("http://localhost{}", request.url())).expect("request url");
            let params = parsed
                .query_pairs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<HashMap<String, String>>();
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);
            let captured = CapturedRequest {
                method: request.method().to_string(),
                path: parsed.path().to_string(),
                params,
                body: serde_json::from_str(&raw).ok(),
            };
            let _ = tx.send(captured);

            let response = Response::from_string(response_spec.body.to_string())
                .with_status_code(response_spec.status)
                .with_header(
                    Header::from_bytes("Content-Type", "application/json").expect("header"),
                );
            let _ = request.respond(response);
        }
    });

    (base_url, rx, handle)
}

pub struct EngineContext {
    pub state: AppState,
    pub durable: SqliteKeyValueStore,
    pub db_url: String,
    _temp_dir: TempDir,
}

/// 本番と同じ構成（SQLite + HTTP）でモックサーバーに向けたエンジンを作る
pub async fn setup_engine(base_url: &str) -> EngineContext {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("engagement.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let mut config = AppConfig::default();
    config.api.base_url = base_url.to_string();
    config.api.request_timeout_ms = 5_000;
    config.sync.fetch_backoff_ms = 10;
    config.database.url = db_url.clone();

    let durable = SqliteKeyValueStore::connect(&db_url, 1)
        .await
        .expect("sqlite store");
    let client = HttpReconciliationClient::new(base_url, config.api.request_timeout())
        .expect("http client");
    let state = AppState::from_parts(
        config,
        Arc::new(client),
        Arc::new(durable.clone()),
        Arc::new(MemoryKeyValueStore::new()),
    );

    EngineContext {
        state,
        durable,
        db_url,
        _temp_dir: temp_dir,
    }
}
