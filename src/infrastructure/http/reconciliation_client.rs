use crate::application::ports::reconciliation::{ReconciliationClient, ToggleReceipt};
use crate::domain::value_objects::{PostId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TOGGLE_PATH: &str = "/api/vibes/like";
const STATUS_PATH: &str = "/api/vibes/like/status";
const LIKED_PATH: &str = "/api/vibes/liked";

#[derive(Debug, Serialize)]
struct ToggleRequest<'a> {
    user_id: &'a str,
    vibe_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(alias = "is_liked", alias = "isLiked")]
    liked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LikedBody {
    Wrapped {
        #[serde(alias = "vibeIds", alias = "liked")]
        vibe_ids: Vec<String>,
    },
    Bare(Vec<String>),
}

impl LikedBody {
    fn into_ids(self) -> Vec<String> {
        match self {
            LikedBody::Wrapped { vibe_ids } => vibe_ids,
            LikedBody::Bare(ids) => ids,
        }
    }
}

/// HTTP 経由でサーバーと突き合わせるクライアント
pub struct HttpReconciliationClient {
    client: Client,
    base_url: String,
}

impl HttpReconciliationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(no_cache_headers())
            .build()
            .map_err(|err| AppError::Configuration(err.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// 中間キャッシュを経由させないためのヘッダー
pub fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers
}

#[async_trait]
impl ReconciliationClient for HttpReconciliationClient {
    async fn submit_toggle(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<ToggleReceipt, AppError> {
        let body = ToggleRequest {
            user_id: user_id.as_str(),
            vibe_id: post_id.as_str(),
        };
        let builder = self
            .client
            .post(self.url(TOGGLE_PATH))
            .json(&body);
        let receipt: ToggleReceipt = request_json(builder).await?;
        debug!(
            post_id = %post_id,
            action = %receipt.action,
            count = receipt.count,
            "toggle acknowledged"
        );
        Ok(receipt)
    }

    async fn query_status(&self, post_id: &PostId, user_id: &UserId) -> Result<bool, AppError> {
        let builder = self
            .client
            .get(self.url(STATUS_PATH))
            .query(&[("vibe_id", post_id.as_str()), ("user_id", user_id.as_str())]);
        let status: StatusBody = request_json(builder).await?;
        Ok(status.liked)
    }

    async fn fetch_liked(&self, user_id: &UserId) -> Result<Vec<PostId>, AppError> {
        let builder = self
            .client
            .get(self.url(LIKED_PATH))
            .query(&[("user_id", user_id.as_str())]);
        let body: LikedBody = request_json(builder).await?;
        // 空の ID は捨てる
        Ok(body
            .into_ids()
            .into_iter()
            .filter_map(|id| PostId::new(id).ok())
            .collect())
    }
}

async fn request_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, AppError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|err| err.error)
            .unwrap_or(body);
        return Err(AppError::TransportFailure(format!(
            "Server error ({status}): {message}"
        )));
    }
    serde_json::from_str(&body).map_err(|err| {
        AppError::TransportFailure(format!("Malformed server response: {err}"))
    })
}
