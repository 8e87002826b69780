/// Minimal client for an OpenAI-compatible chat completions endpoint.
///
/// The trainer only needs one round-trip shape (system + user prompt in, one assistant
/// message out), so this client exposes `chat_completions` plus a `complete` shortcut.
/// Transient failures (timeouts, connection errors, 429, 5xx) are retried with capped
/// exponential backoff and jitter.
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl OpenAiClientConfig {
    /// Optional, with defaults:
    /// - `OPENAI_BASE_URL` (default: "http://localhost:8001/v1")
    /// - `OPENAI_API_KEY` (sent as a bearer token when set)
    /// - `OPENAI_TIMEOUT_SECS` (default: 30)
    /// - `OPENAI_MAX_RETRIES` (default: 3)
    /// - `OPENAI_RETRY_INITIAL_MS` / `OPENAI_RETRY_MAX_MS` (default: 200 / 5000)
    /// - `OPENAI_MAX_ERROR_BODY_BYTES` (default: 8192)
    pub fn from_env() -> Self {
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8001/v1".to_string());
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_timeout: Duration::from_secs(env_or("OPENAI_TIMEOUT_SECS", 30)),
            max_retries: env_or("OPENAI_MAX_RETRIES", 3),
            initial_backoff: Duration::from_millis(env_or("OPENAI_RETRY_INITIAL_MS", 200)),
            max_backoff: Duration::from_millis(env_or("OPENAI_RETRY_MAX_MS", 5_000)),
            max_error_body_bytes: env_or("OPENAI_MAX_ERROR_BODY_BYTES", 8 * 1024),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAiClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("response has no assistant content")]
    EmptyCompletion,
}

#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiClientConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, OpenAiClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("interview-trainer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    /// Send one system + user exchange and return the assistant text.
    pub async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, OpenAiClientError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![Message::system(system), Message::user(user)],
            temperature: Some(0.0),
            max_tokens: Some(64),
        };
        let response = self.chat_completions(&request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or(OpenAiClientError::EmptyCompletion)
    }

    pub async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiClientError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        self.request_with_retry(|| async {
            let mut builder = self
                .http
                .post(&url)
                .timeout(self.config.default_timeout)
                .json(request);
            if let Some(key) = &self.config.api_key {
                builder = builder.bearer_auth(key);
            }
            let resp = builder.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(upstream_error(resp, self.config.max_error_body_bytes).await);
            }
            let body = resp.bytes().await?;
            debug!(bytes = body.len(), "chat completion received");
            Ok(serde_json::from_slice::<ChatCompletionResponse>(&body)?)
        })
        .await
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, OpenAiClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, OpenAiClientError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match f().await {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };
            if attempt > self.config.max_retries || !is_transient(&err) {
                return Err(err);
            }
            let delay = backoff_delay(
                self.config.initial_backoff,
                self.config.max_backoff,
                attempt - 1,
            );
            warn!(
                attempt,
                delay_ms = delay.as_millis(),
                error = %err,
                "chat completion failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

async fn upstream_error(resp: reqwest::Response, max_error_body_bytes: usize) -> OpenAiClientError {
    let status = resp.status();
    let body = match resp.bytes().await {
        Ok(b) => {
            let end = b.len().min(max_error_body_bytes);
            String::from_utf8_lossy(&b[..end]).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    };
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => OpenAiClientError::Upstream {
            status,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| "unknown upstream error".to_string()),
        },
        Err(_) => OpenAiClientError::UpstreamBody { status, body },
    }
}

fn is_transient(err: &OpenAiClientError) -> bool {
    match err {
        OpenAiClientError::Request(e) => e.is_timeout() || e.is_connect() || e.is_body(),
        OpenAiClientError::Upstream { status, .. }
        | OpenAiClientError::UpstreamBody { status, .. } => is_transient_status(*status),
        OpenAiClientError::InvalidJson(_) | OpenAiClientError::EmptyCompletion => false,
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `initial * 2^exponent`, capped at `max`, plus up to 25% jitter.
fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let capped_ms = initial
        .as_millis()
        .saturating_mul(mult)
        .min(max.as_millis()) as u64;
    let jitter_cap = (capped_ms / 4).max(1);
    Duration::from_millis(capped_ms.saturating_add(clock_jitter_ms(jitter_cap)))
}

fn clock_jitter_ms(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    nanos % (max_inclusive + 1)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

impl ChatCompletionResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}
