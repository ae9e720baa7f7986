//! On-demand commands
//!
//! - `check`: resolve the domain now and answer with the current records
//! - `status`: answer with the monitor's liveness, read from [`SharedState`]
//!
//! Handlers never fail: any error becomes a fixed user-facing string.
//! [`CommandDispatcher`] connects them to a [`CommandSource`](crate::CommandSource).

pub mod dispatch;

pub use dispatch::CommandDispatcher;

use crate::config::EngineConfig;
use crate::format::{self, StatusReport};
use crate::monitor::SharedState;
use crate::snapshot::SnapshotBuilder;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{error, warn};

/// Answer to a `check` that could not complete
pub const CHECK_FAILED: &str = "Failed to fetch DNS records. Please try again later.";

/// Answer to `help` and `start`
pub const HELP_TEXT: &str = "DNS Monitor commands:\n\
     /check - show the current DNS records\n\
     /status - show monitor status";

/// A recognised command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Check,
    Status,
    Help,
}

impl Command {
    /// Parse command text such as `/check`, `/status@my_bot` or `/check now`
    ///
    /// Only the first word counts and it must start with `/`. An `@botname`
    /// suffix is accepted only when it names `bot_username` (compared
    /// case-insensitively); with no known username every suffixed command
    /// is treated as addressed to another bot. Returns `None` for anything
    /// else.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let word = word.strip_prefix('/')?;

        let name = match word.split_once('@') {
            Some((name, addressee)) => {
                let ours = bot_username
                    .map(|bot| bot.trim_start_matches('@'))
                    .is_some_and(|bot| bot.eq_ignore_ascii_case(addressee));
                if !ours {
                    return None;
                }
                name
            }
            None => word,
        };

        match name.to_ascii_lowercase().as_str() {
            "check" => Some(Command::Check),
            "status" => Some(Command::Status),
            "help" | "start" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Handlers for the on-demand commands
///
/// Cheap to clone; each dispatched request gets its own copy.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    builder: SnapshotBuilder,
    state: SharedState,
    poll_interval: Duration,
    check_timeout: Duration,
    max_message_chars: usize,
}

impl CommandHandler {
    /// Create handlers over the monitor's builder and state
    pub fn new(builder: SnapshotBuilder, state: SharedState, engine: &EngineConfig) -> Self {
        Self {
            builder,
            state,
            poll_interval: engine.poll_interval(),
            check_timeout: engine.check_timeout(),
            max_message_chars: engine.max_message_chars,
        }
    }

    /// Answer `command`
    pub async fn handle(&self, command: Command) -> String {
        match command {
            Command::Check => self.check().await,
            Command::Status => self.status().await,
            Command::Help => HELP_TEXT.to_string(),
        }
    }

    /// Current records of the domain, truncated for transport
    ///
    /// Does not touch the monitor state.
    pub async fn check(&self) -> String {
        let builder = self.builder.clone();
        let mut task = tokio::spawn(async move { builder.snapshot().await });

        match tokio::time::timeout(self.check_timeout, &mut task).await {
            Ok(Ok(snapshot)) => format::truncate(
                &format::format_check(self.builder.domain(), &snapshot),
                self.max_message_chars,
            ),
            Ok(Err(e)) => {
                error!("Check for {} failed: {}", self.builder.domain(), e);
                CHECK_FAILED.to_string()
            }
            Err(_) => {
                task.abort();
                warn!(
                    "Check for {} timed out after {:?}",
                    self.builder.domain(),
                    self.check_timeout
                );
                CHECK_FAILED.to_string()
            }
        }
    }

    /// Monitor liveness as of now
    pub async fn status(&self) -> String {
        self.status_at(Utc::now()).await
    }

    /// Monitor liveness as of `now`
    pub async fn status_at(&self, now: DateTime<Utc>) -> String {
        let state = self.state.read().await;
        let report = StatusReport {
            domain: self.builder.domain(),
            poll_interval: self.poll_interval,
            last_activity: state.last_activity,
            cycles_completed: state.cycles_completed,
            alerts_sent: state.alerts_sent,
        };
        format::truncate(&format::format_status(&report, now), self.max_message_chars)
    }
}
