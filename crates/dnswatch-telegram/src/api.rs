//! Minimal Telegram Bot API client
//!
//! Covers the methods the monitor needs:
//!
//! ```http
//! GET  /bot<token>/getMe
//! POST /bot<token>/sendMessage   {"chat_id": "...", "text": "..."}
//! GET  /bot<token>/getUpdates?offset=<n>&timeout=<secs>
//! ```
//!
//! The bot token is part of every URL. It never appears in logs, error
//! messages or `Debug` output: reqwest errors are stripped of their URL
//! before they are reported.

use dnswatch_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time granted to a long poll on top of its server-side timeout
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

/// An incoming update
///
/// Only message updates are of interest; everything else deserializes with
/// `message: None`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The bot's own account, as returned by `getMe`
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Telegram Bot API client
///
/// Cheap to clone; clones share the connection pool.
///
/// # Security
///
/// The Debug implementation does NOT expose the bot token.
#[derive(Clone)]
pub struct TelegramApi {
    /// Bot token
    /// ⚠️ NEVER log this value
    bot_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramApi")
            .field("bot_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TelegramApi {
    /// Create a client for the public Bot API
    pub fn new(bot_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(bot_token, TELEGRAM_API_BASE)
    }

    /// Create a client against a different API host
    ///
    /// # Errors
    ///
    /// - Empty bot token
    /// - HTTP client construction failure
    pub fn with_base_url(bot_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let bot_token = bot_token.into();
        if bot_token.is_empty() {
            return Err(Error::config("Telegram bot token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bot_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.bot_token, method)
    }

    /// Identify the bot behind the token
    pub async fn get_me(&self) -> Result<User> {
        let request = self.client.get(self.method_url("getMe"));
        self.call("getMe", request).await
    }

    /// Send `text` to `chat_id`
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let request = self.client.post(self.method_url("sendMessage")).json(&payload);
        // The result is the sent Message; only success matters
        let _: serde_json::Value = self.call("sendMessage", request).await?;

        tracing::debug!("Telegram message delivered to chat {}", chat_id);
        Ok(())
    }

    /// Long-poll for updates after `offset`
    ///
    /// Blocks server-side for up to `timeout_secs` when there is nothing new.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut query = vec![
            ("timeout", timeout_secs.to_string()),
            ("allowed_updates", r#"["message"]"#.to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let request = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&query)
            .timeout(Duration::from_secs(timeout_secs) + LONG_POLL_GRACE);

        self.call("getUpdates", request).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            Error::provider(
                "telegram",
                format!("{} request failed: {}", method, e.without_url()),
            )
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::provider(
                "telegram",
                format!("Failed to read {} response: {}", method, e.without_url()),
            )
        })?;

        if !status.is_success() {
            let (description, retry_after) =
                match serde_json::from_str::<ApiResponse<serde_json::Value>>(&body) {
                    Ok(envelope) => (
                        envelope.description.unwrap_or_default(),
                        envelope.parameters.and_then(|p| p.retry_after),
                    ),
                    Err(_) => (body, None),
                };
            return Err(status_error(method, status.as_u16(), &description, retry_after));
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        if !envelope.ok {
            return Err(Error::provider(
                "telegram",
                format!(
                    "{} rejected: {}",
                    method,
                    envelope.description.unwrap_or_default()
                ),
            ));
        }

        envelope
            .result
            .ok_or_else(|| Error::provider("telegram", format!("{} response has no result", method)))
    }
}

/// Map a non-success HTTP status to an error
pub(crate) fn status_error(
    method: &str,
    status: u16,
    description: &str,
    retry_after: Option<u64>,
) -> Error {
    match status {
        // Telegram answers 404 for an unknown token
        401 | 404 => Error::auth(format!(
            "Telegram rejected the bot token. Status: {}",
            status
        )),
        429 => Error::rate_limited(match retry_after {
            Some(secs) => format!("Telegram rate limit exceeded, retry after {}s", secs),
            None => "Telegram rate limit exceeded".to_string(),
        }),
        400 | 403 => Error::provider(
            "telegram",
            format!("{} failed: {} - {}", method, status, description),
        ),
        500..=599 => Error::provider(
            "telegram",
            format!("Telegram server error (transient): {} - {}", status, description),
        ),
        _ => Error::provider(
            "telegram",
            format!("{} failed: {} - {}", method, status, description),
        ),
    }
}
