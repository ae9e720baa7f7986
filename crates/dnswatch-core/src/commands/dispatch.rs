//! Command dispatch loop
//!
//! Pulls requests from a [`CommandSource`], answers each one on its own
//! task and sends the answer back through the source. A slow `check` never
//! holds up a `status`, and neither touches the monitor loop.

use super::{Command, CommandHandler};
use crate::error::Result;
use crate::traits::{CommandRequest, CommandSource};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Routes incoming commands to [`CommandHandler`]
pub struct CommandDispatcher {
    source: Arc<dyn CommandSource>,
    handler: CommandHandler,
    bot_username: Option<String>,
}

impl CommandDispatcher {
    /// Create a new dispatcher
    ///
    /// Without a bot username only unsuffixed commands are answered.
    pub fn new(source: Arc<dyn CommandSource>, handler: CommandHandler) -> Self {
        Self {
            source,
            handler,
            bot_username: None,
        }
    }

    /// Also answer commands addressed as `/command@<username>`
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Dispatch until SIGINT or the request stream ends
    pub async fn run(&self) -> Result<()> {
        self.run_with_shutdown(None).await
    }

    /// Dispatch until `shutdown_rx` fires (or SIGINT when `None`)
    ///
    /// In-flight requests are aborted on shutdown.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut requests = self.source.requests();
        let mut in_flight = JoinSet::new();

        info!("Accepting commands via {}", self.source.source_name());

        loop {
            tokio::select! {
                request = requests.next() => match request {
                    Some(request) => self.dispatch(request, &mut in_flight),
                    None => {
                        warn!("{} request stream ended", self.source.source_name());
                        break;
                    }
                },
                // Reap finished handlers so the set does not grow
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received, command dispatcher stopping");
                    break;
                }
            }
        }

        in_flight.shutdown().await;
        Ok(())
    }

    fn dispatch(&self, request: CommandRequest, in_flight: &mut JoinSet<()>) {
        let Some(command) = Command::parse(&request.text, self.bot_username.as_deref()) else {
            debug!("Ignoring non-command message from {}", request.reply_to);
            return;
        };

        debug!("Dispatching {:?} from {}", command, request.reply_to);

        let handler = self.handler.clone();
        let source = Arc::clone(&self.source);
        in_flight.spawn(async move {
            let answer = handler.handle(command).await;
            if let Err(e) = source.reply(&request, &answer).await {
                error!(
                    "Failed to reply to {:?} from {}: {}",
                    command, request.reply_to, e
                );
            }
        });
    }
}
