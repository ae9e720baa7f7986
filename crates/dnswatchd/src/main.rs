// # dnswatchd - DNS Change Monitor Daemon
//
// This is a THIN integration layer:
// - DNS, diffing and alerting logic lives in dnswatch-core
// - Transports live in their own crates
// - Configuration is via environment variables ONLY
//
// The dnswatchd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the resolver, the Telegram transport and the monitor
// 4. Shutting everything down on SIGTERM / SIGINT
//
// ## Configuration
//
// ### Required
// - `DNSWATCH_DOMAIN`: Domain to monitor
// - `DNSWATCH_TELEGRAM_BOT_TOKEN`: Bot token from BotFather
// - `DNSWATCH_TELEGRAM_CHAT_ID`: Chat that receives change alerts
//
// ### Optional
// - `DNSWATCH_POLL_INTERVAL_SECS`: Seconds between checks (default 30)
// - `DNSWATCH_QUERY_TIMEOUT_SECS`: Single DNS query timeout (default 5)
// - `DNSWATCH_LOOKUP_TIMEOUT_SECS`: Per record type ceiling (default 10)
// - `DNSWATCH_RESOLVER`: system, google or cloudflare (default system)
// - `DNSWATCH_COMMANDS`: Answer /check and /status (default true)
// - `DNSWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DNSWATCH_DOMAIN=example.com
// export DNSWATCH_TELEGRAM_BOT_TOKEN=123456:ABC-DEF
// export DNSWATCH_TELEGRAM_CHAT_ID=-1001234567890
//
// dnswatchd
// ```

use anyhow::{Context, Result};
use dnswatch_core::{
    CommandDispatcher, CommandHandler, DnsMonitor, MonitorConfig, MonitorEvent, NotifierConfig,
};
use dnswatch_resolver_hickory::{HickoryRecordResolver, ResolverPreset};
use dnswatch_telegram::{TelegramApi, TelegramCommandSource, TelegramNotifier};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long stopped tasks get to finish
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DnswatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DnswatchExitCode> for ExitCode {
    fn from(code: DnswatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    domain: String,
    bot_token: String,
    chat_id: String,
    poll_interval_secs: Option<u64>,
    query_timeout_secs: Option<u64>,
    lookup_timeout_secs: Option<u64>,
    resolver: String,
    commands_enabled: bool,
    log_level: String,
}

// Keeps the bot token out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("domain", &self.domain)
            .field("bot_token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .field("lookup_timeout_secs", &self.lookup_timeout_secs)
            .field("resolver", &self.resolver)
            .field("commands_enabled", &self.commands_enabled)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str, example: &str| -> Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => anyhow::bail!("{} is required. Set it via: export {}={}", key, key, example),
            }
        };

        let secs = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .with_context(|| format!("{} must be a whole number of seconds. Got: {}", key, value))
                })
                .transpose()
        };

        let commands_enabled = match lookup("DNSWATCH_COMMANDS") {
            None => true,
            Some(value) => parse_bool(&value).with_context(|| {
                format!("DNSWATCH_COMMANDS must be true or false. Got: {}", value)
            })?,
        };

        Ok(Self {
            domain: required("DNSWATCH_DOMAIN", "example.com")?,
            bot_token: required("DNSWATCH_TELEGRAM_BOT_TOKEN", "123456:ABC-DEF")?,
            chat_id: required("DNSWATCH_TELEGRAM_CHAT_ID", "-1001234567890")?,
            poll_interval_secs: secs("DNSWATCH_POLL_INTERVAL_SECS")?,
            query_timeout_secs: secs("DNSWATCH_QUERY_TIMEOUT_SECS")?,
            lookup_timeout_secs: secs("DNSWATCH_LOOKUP_TIMEOUT_SECS")?,
            resolver: lookup("DNSWATCH_RESOLVER").unwrap_or_else(|| "system".to_string()),
            commands_enabled,
            log_level: lookup("DNSWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks the daemon-level settings here and defers the rest to
    /// `MonitorConfig::validate`.
    fn validate(&self) -> Result<()> {
        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.bot_token.to_lowercase();
        if token_lower.contains("your_token") || token_lower.contains("replace_me") {
            anyhow::bail!(
                "DNSWATCH_TELEGRAM_BOT_TOKEN appears to be a placeholder. \
                Use the token BotFather issued for your bot."
            );
        }

        self.resolver_preset()?;
        self.log_level()?;

        self.monitor_config()
            .validate()
            .context("Invalid monitor configuration")?;

        Ok(())
    }

    fn resolver_preset(&self) -> Result<ResolverPreset> {
        self.resolver
            .parse()
            .with_context(|| "DNSWATCH_RESOLVER is not valid")
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNSWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Monitor configuration with environment overrides applied
    fn monitor_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::new(
            self.domain.clone(),
            NotifierConfig::Telegram {
                bot_token: self.bot_token.clone(),
                chat_id: self.chat_id.clone(),
            },
        );

        if let Some(secs) = self.poll_interval_secs {
            config.engine.poll_interval_secs = secs;
        }
        if let Some(secs) = self.query_timeout_secs {
            config.engine.query_timeout_secs = secs;
        }
        if let Some(secs) = self.lookup_timeout_secs {
            config.engine.lookup_timeout_secs = secs;
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DnswatchExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DnswatchExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnswatchExitCode::ConfigError.into();
    }

    info!("Starting dnswatchd daemon");
    debug!("Configuration: {:?}", config);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnswatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DnswatchExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DnswatchExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal
async fn run_daemon(config: Config) -> Result<()> {
    let monitor_config = config.monitor_config();
    let preset = config.resolver_preset()?;

    let resolver = HickoryRecordResolver::new(preset, monitor_config.engine.query_timeout())
        .context("Failed to create DNS resolver")?;
    info!("Using {} resolver", preset);

    let api = TelegramApi::new(config.bot_token.clone())?;
    let notifier = TelegramNotifier::new(api.clone(), config.chat_id.clone());

    let (monitor, mut events) =
        DnsMonitor::new(Arc::new(resolver), Arc::new(notifier), &monitor_config)?;
    let monitor = Arc::new(monitor);

    info!(
        "Monitoring {} every {}s",
        monitor.domain(),
        monitor_config.engine.poll_interval_secs
    );

    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let (monitor_shutdown, monitor_shutdown_rx) = oneshot::channel();
    let mut monitor_task = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.run_with_shutdown(Some(monitor_shutdown_rx)).await })
    };

    let dispatcher = if config.commands_enabled {
        let handler = CommandHandler::new(
            monitor.snapshot_builder(),
            monitor.state(),
            &monitor_config.engine,
        );
        let mut dispatcher =
            CommandDispatcher::new(Arc::new(TelegramCommandSource::new(api.clone())), handler);
        match api.get_me().await {
            Ok(me) => match me.username {
                Some(username) => {
                    info!("Answering commands as @{}", username);
                    dispatcher = dispatcher.with_bot_username(username);
                }
                None => warn!("Bot has no username, only plain /commands are answered"),
            },
            Err(e) => warn!(
                "Failed to look up bot username, only plain /commands are answered: {}",
                e
            ),
        }
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task =
            tokio::spawn(async move { dispatcher.run_with_shutdown(Some(shutdown_rx)).await });
        Some((shutdown, task))
    } else {
        info!("Commands disabled");
        None
    };

    // The monitor only returns on shutdown; anything else is a failure
    let outcome = tokio::select! {
        signal = wait_for_shutdown() => {
            let signal = signal?;
            info!("Received shutdown signal: {}", signal);
            Ok(())
        }
        joined = &mut monitor_task => {
            Err(match joined {
                Ok(Ok(())) => anyhow::anyhow!("Monitor stopped unexpectedly"),
                Ok(Err(e)) => anyhow::anyhow!("Monitor failed: {}", e),
                Err(e) => anyhow::anyhow!("Monitor task panicked: {}", e),
            })
        }
    };

    info!("Shutting down daemon");

    let _ = monitor_shutdown.send(());
    if let Some((shutdown, task)) = dispatcher {
        let _ = shutdown.send(());
        join_with_timeout("command dispatcher", task).await;
    }
    if !monitor_task.is_finished() {
        join_with_timeout("monitor", monitor_task).await;
    }

    // The monitor held the last event sender
    drop(monitor);
    join_with_timeout("event logger", event_task).await;

    outcome
}

fn log_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Started {
            domain,
            poll_interval_secs,
        } => debug!("Monitor started for {} ({}s)", domain, poll_interval_secs),
        MonitorEvent::InitialSnapshot { record_types } => {
            debug!("Initial snapshot has {} record type(s)", record_types)
        }
        MonitorEvent::CycleCompleted { changes } => {
            debug!("Cycle completed with {} change(s)", changes)
        }
        MonitorEvent::AlertFailed { error } => warn!("Alert not delivered: {}", error),
        other => debug!("Monitor event: {:?}", other),
    }
}

async fn join_with_timeout<T>(name: &str, task: JoinHandle<T>) {
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
        Ok(Ok(_)) => debug!("{} stopped", name),
        Ok(Err(e)) => error!("{} task failed: {}", name, e),
        Err(_) => warn!("{} did not stop within {:?}", name, SHUTDOWN_TIMEOUT),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
