// # Telegram Transport
//
// This crate connects the DNS change monitor to the Telegram Bot API.
//
// - `TelegramNotifier`: delivers change alerts to one configured chat
// - `TelegramCommandSource`: receives `/check` and `/status` through
//   `getUpdates` long polling and replies to the asking chat
//
// ## Trust Level: Untrusted (Transport)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTPS calls to the Bot API only
// - ✅ Parse Bot API responses
// - ✅ Run one long-poll task per `requests()` stream
//
// **Forbidden Capabilities**:
// - ❌ Retry alert delivery (a failed alert is reported to `DnsMonitor`)
// - ❌ Rewrite or truncate message text
// - ❌ Access monitor state
//
// ## Security Requirements
//
// - Bot token NEVER appears in logs
// - Bot token MUST be provided via environment variables only
// - Transport MUST fail fast if the token is empty
//
// ## API Reference
//
// - Bot API: https://core.telegram.org/bots/api
// - sendMessage: https://core.telegram.org/bots/api#sendmessage
// - getUpdates: https://core.telegram.org/bots/api#getupdates

pub mod api;

pub use api::{TelegramApi, Update, User};

use async_trait::async_trait;
use dnswatch_core::config::NotifierConfig;
use dnswatch_core::{CommandRequest, CommandSource, Notifier, Result};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;

/// Server-side long-poll timeout for `getUpdates`
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed `getUpdates` before polling again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Requests buffered between the poller and the dispatcher
const REQUEST_BUFFER: usize = 64;

/// Telegram alert transport
///
/// The destination chat is fixed at construction.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    api: TelegramApi,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier that posts to `chat_id`
    pub fn new(api: TelegramApi, chat_id: impl Into<String>) -> Self {
        Self {
            api,
            chat_id: chat_id.into(),
        }
    }

    /// Create a notifier from validated configuration
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        match config {
            NotifierConfig::Telegram { bot_token, chat_id } => {
                Ok(Self::new(TelegramApi::new(bot_token.clone())?, chat_id.clone()))
            }
        }
    }

    /// The chat alerts go to
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.api.send_message(&self.chat_id, text).await
    }

    fn notifier_name(&self) -> &'static str {
        "telegram"
    }
}

/// Telegram command transport over `getUpdates` long polling
///
/// Any chat that messages the bot gets an answer.
#[derive(Debug, Clone)]
pub struct TelegramCommandSource {
    api: TelegramApi,
    poll_timeout_secs: u64,
    retry_delay: Duration,
}

impl TelegramCommandSource {
    /// Create a source with the default long-poll timeout
    pub fn new(api: TelegramApi) -> Self {
        Self {
            api,
            poll_timeout_secs: LONG_POLL_TIMEOUT_SECS,
            retry_delay: POLL_RETRY_DELAY,
        }
    }

    /// Override the long-poll timeout and the pause after failures
    pub fn with_timing(mut self, poll_timeout_secs: u64, retry_delay: Duration) -> Self {
        self.poll_timeout_secs = poll_timeout_secs;
        self.retry_delay = retry_delay;
        self
    }
}

/// Turn an update into a request, if it carries text
pub fn update_to_request(update: Update) -> Option<CommandRequest> {
    let message = update.message?;
    let text = message.text?;
    Some(CommandRequest::new(message.chat.id.to_string(), text))
}

#[async_trait]
impl CommandSource for TelegramCommandSource {
    /// Start long polling
    ///
    /// The poller acknowledges every update it sees by advancing the offset,
    /// and stops once the returned stream is dropped.
    fn requests(&self) -> Pin<Box<dyn Stream<Item = CommandRequest> + Send + 'static>> {
        let (tx, rx) = mpsc::channel(REQUEST_BUFFER);

        let api = self.api.clone();
        let poll_timeout_secs = self.poll_timeout_secs;
        let retry_delay = self.retry_delay;

        tokio::spawn(async move {
            tracing::info!(
                "Starting Telegram long polling (timeout={}s)",
                poll_timeout_secs
            );

            let mut offset: Option<i64> = None;

            loop {
                let polled = tokio::select! {
                    polled = api.get_updates(offset, poll_timeout_secs) => polled,
                    _ = tx.closed() => break,
                };

                match polled {
                    Ok(updates) => {
                        for update in updates {
                            offset = Some(update.update_id + 1);
                            if let Some(request) = update_to_request(update) {
                                if tx.send(request).await.is_err() {
                                    tracing::debug!("Request receiver dropped, stopping poller");
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Telegram getUpdates failed: {}", e);
                        tokio::select! {
                            _ = tokio::time::sleep(retry_delay) => {}
                            _ = tx.closed() => break,
                        }
                    }
                }
            }

            tracing::debug!("Telegram long polling stopped");
        });

        Box::pin(ReceiverStream::new(rx))
    }

    async fn reply(&self, request: &CommandRequest, text: &str) -> Result<()> {
        self.api.send_message(&request.reply_to, text).await
    }

    fn source_name(&self) -> &'static str {
        "telegram"
    }
}
