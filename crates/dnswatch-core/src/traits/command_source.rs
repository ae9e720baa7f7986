// # Command Source Trait
//
// Defines the interface for request/response command transports.
//
// ## Implementations
//
// - Telegram long polling: `dnswatch-telegram` crate
//
// ## Usage
//
// ```rust,ignore
// use dnswatch_core::CommandSource;
// use tokio_stream::StreamExt;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* CommandSource implementation */;
//
//     let mut requests = source.requests();
//     while let Some(request) = requests.next().await {
//         source.reply(&request, "pong").await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

/// An incoming command from a requester
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Where the reply must go (e.g. Telegram chat ID)
    pub reply_to: String,
    /// Raw command text as typed, e.g. `/check@dnswatch_bot`
    pub text: String,
}

impl CommandRequest {
    /// Create a new command request
    pub fn new(reply_to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reply_to: reply_to.into(),
            text: text.into(),
        }
    }
}

/// Trait for command transport implementations
///
/// This trait defines two capabilities:
/// 1. **requests()**: Stream of incoming command requests
/// 2. **reply()**: Deliver a handler's answer to the original requester
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Spawn one task that feeds the request stream (long polling)
/// - ✅ Call their own endpoint for replies
///
/// ## Forbidden Capabilities
/// - ❌ Interpret commands (owned by `CommandHandler`)
/// - ❌ Touch monitor state
///
/// Dropping the stream must stop any task feeding it.
#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Stream of incoming requests
    ///
    /// The stream should run until the transport is shut down.
    fn requests(&self) -> Pin<Box<dyn Stream<Item = CommandRequest> + Send + 'static>>;

    /// Send `text` back to the requester of `request`
    async fn reply(&self, request: &CommandRequest, text: &str) -> Result<(), crate::Error>;

    /// Get the transport name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
