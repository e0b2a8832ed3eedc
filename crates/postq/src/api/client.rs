//! Request construction and endpoint bindings.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::retry::send_with_retry;
use crate::api::stream::LogStream;
use crate::config::SettingsStore;

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const GENERATE_PATH: &str = "/makePostContent";
pub(crate) const PUBLISH_PATH: &str = "/postPost";
pub(crate) const LOGS_PATH: &str = "/jobs/logs";

#[derive(Debug, Clone, Serialize)]
pub struct GeneratePostContentRequest {
    pub description: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishPostRequest {
    pub text: String,
}

/// Response of a successful publish. The upstream may attach more fields
/// than the id; they are kept for diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishPostResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Stateless request layer against the configured base URL.
///
/// The base URL and credential are read fresh from the settings store on
/// every call, so configuration changes apply to all subsequent requests
/// without rebuilding the client.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    settings: Arc<SettingsStore>,
}

impl ApiClient {
    pub fn new(settings: Arc<SettingsStore>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, settings })
    }

    /// Liveness probe against the service root.
    pub async fn health(&self) -> Result<String, ApiError> {
        let response = self
            .execute::<()>(Method::GET, "/", None, HeaderMap::new())
            .await?;
        Ok(response.text().await?)
    }

    /// Requests generated post content. A successful body is either a bare
    /// string or JSON carrying the content; an empty result is an error.
    pub async fn generate_post_content(
        &self,
        request: &GeneratePostContentRequest,
    ) -> Result<String, ApiError> {
        let response = self
            .execute(Method::POST, GENERATE_PATH, Some(request), HeaderMap::new())
            .await?;
        let content = parse_content_payload(response).await?;
        if content.trim().is_empty() {
            return Err(ApiError::EmptyResult);
        }
        Ok(content)
    }

    /// Publishes a post, returning the upstream's acknowledgement.
    pub async fn publish_post(
        &self,
        request: &PublishPostRequest,
    ) -> Result<PublishPostResponse, ApiError> {
        let response = self
            .execute(Method::POST, PUBLISH_PATH, Some(request), HeaderMap::new())
            .await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("invalid publish response: {}", e)))
    }

    /// Opens the persistent one-way log event stream. The caller owns the
    /// connection; this layer performs no reconnection.
    pub async fn open_log_stream(&self) -> Result<LogStream, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let response = self
            .execute::<()>(Method::GET, LOGS_PATH, None, headers)
            .await?;
        Ok(LogStream::new(response))
    }

    /// Builds the absolute URL for `path` against the currently configured
    /// base URL: trailing slash stripped, leading slash enforced.
    fn url(&self, path: &str) -> String {
        let settings = self.settings.current();
        let base = settings.api_base_url.trim_end_matches('/').to_string();
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Default headers plus caller-supplied overrides.
    fn headers_with(&self, extra: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = self.settings.current().api_token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        extra_headers: HeaderMap,
    ) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        send_with_retry(path, || {
            let mut builder = self
                .http
                .request(method.clone(), self.url(path))
                .headers(self.headers_with(&extra_headers));
            if let Some(body) = body {
                builder = builder.json(body);
            }
            builder.send()
        })
        .await
    }
}

/// Decodes a generation payload: a JSON string, a JSON object carrying a
/// `content`/`text` string field, or a plain text body.
async fn parse_content_payload(response: Response) -> Result<String, ApiError> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    if !is_json {
        return Ok(response.text().await?);
    }

    let bytes = response.bytes().await?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::InvalidResponse(format!("invalid JSON body: {}", e)))?;
    match value {
        serde_json::Value::String(content) => Ok(content),
        serde_json::Value::Object(ref map) => map
            .get("content")
            .or_else(|| map.get("text"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::InvalidResponse("no content field in generation response".to_string())
            }),
        other => Err(ApiError::InvalidResponse(format!(
            "unexpected generation payload: {}",
            other
        ))),
    }
}
