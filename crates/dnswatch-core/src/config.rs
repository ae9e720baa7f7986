//! Configuration types for the DNS monitor
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Domain to monitor (exactly one per process)
    pub domain: String,

    /// Notification transport configuration
    pub notifier: NotifierConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl MonitorConfig {
    /// Create a new configuration for `domain` with default engine settings
    pub fn new(domain: impl Into<String>, notifier: NotifierConfig) -> Self {
        Self {
            domain: domain.into(),
            notifier,
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.domain)?;
        self.notifier.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// Notification transport configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Telegram Bot API
    Telegram {
        /// Bot token issued by BotFather
        bot_token: String,
        /// Chat that receives change alerts
        chat_id: String,
    },
}

impl NotifierConfig {
    /// Validate the notifier configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            NotifierConfig::Telegram { bot_token, chat_id } => {
                if bot_token.is_empty() {
                    return Err(crate::Error::config("Telegram bot token cannot be empty"));
                }
                // Tokens look like "123456:ABC-DEF..."
                if !bot_token.contains(':') {
                    return Err(crate::Error::config(
                        "Telegram bot token must have the form <bot id>:<secret>",
                    ));
                }
                if chat_id.is_empty() {
                    return Err(crate::Error::config("Telegram chat ID cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the notifier type name
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Telegram { .. } => "telegram",
        }
    }
}

// Keeps the bot token out of logs
impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifierConfig::Telegram { chat_id, .. } => f
                .debug_struct("Telegram")
                .field("bot_token", &"<REDACTED>")
                .field("chat_id", chat_id)
                .finish(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between poll cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Timeout of a single DNS query, handed to the resolver
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Ceiling on one record type's lookup, retries and all
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    /// Ceiling on an on-demand check
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,

    /// Longest message handed to a transport before truncation
    ///
    /// Telegram rejects messages above 4096 characters; the default leaves
    /// room for the truncation marker.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Capacity of the monitor event channel
    ///
    /// When full, events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.query_timeout_secs == 0 {
            return Err(crate::Error::config("Query timeout must be > 0"));
        }
        if self.lookup_timeout_secs < self.query_timeout_secs {
            return Err(crate::Error::config(format!(
                "Lookup timeout ({}s) must not be shorter than the query timeout ({}s)",
                self.lookup_timeout_secs, self.query_timeout_secs
            )));
        }
        if self.check_timeout_secs == 0 {
            return Err(crate::Error::config("Check timeout must be > 0"));
        }
        if self.max_message_chars == 0 {
            return Err(crate::Error::config("Maximum message length must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
            check_timeout_secs: default_check_timeout_secs(),
            max_message_chars: default_max_message_chars(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_query_timeout_secs() -> u64 {
    5
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

fn default_check_timeout_secs() -> u64 {
    15
}

fn default_max_message_chars() -> usize {
    4000
}

fn default_event_channel_capacity() -> usize {
    100
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, characters and
/// hyphen placement. A single trailing dot (FQDN form) is accepted.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        // Underscore is allowed for service labels such as _dmarc
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram() -> NotifierConfig {
        NotifierConfig::Telegram {
            bot_token: "123456:ABCdefGhIJKlmNoPQRsTUVwxyZ".to_string(),
            chat_id: "-1001234567890".to_string(),
        }
    }

    #[test]
    fn test_defaults_match_reference_cadence() {
        let engine = EngineConfig::default();
        assert_eq!(engine.poll_interval(), Duration::from_secs(30));
        assert_eq!(engine.query_timeout(), Duration::from_secs(5));
        assert_eq!(engine.lookup_timeout(), Duration::from_secs(10));
        assert_eq!(engine.max_message_chars, 4000);
    }

    #[test]
    fn test_valid_config() {
        let config = MonitorConfig::new("example.com", telegram());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = MonitorConfig::new("example.com", telegram());
        config.engine.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lookup_timeout_shorter_than_query_rejected() {
        let mut config = MonitorConfig::new("example.com", telegram());
        config.engine.lookup_timeout_secs = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_chat_rejected() {
        let notifier = NotifierConfig::Telegram {
            bot_token: "123456:secret".to_string(),
            chat_id: String::new(),
        };
        assert!(notifier.validate().is_err());
    }

    #[test]
    fn test_domain_validation() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("yearn.fi.").is_ok());
        assert!(validate_domain_name("_dmarc.example.com").is_ok());
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("example..com").is_err());
        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name("bad domain.com").is_err());
        assert!(validate_domain_name(&format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_engine_defaults_from_json() {
        let config: MonitorConfig = serde_json::from_value(serde_json::json!({
            "domain": "example.com",
            "notifier": { "type": "telegram", "bot_token": "1:x", "chat_id": "42" }
        }))
        .unwrap();
        assert_eq!(config.engine.poll_interval_secs, 30);
        assert_eq!(config.notifier.type_name(), "telegram");
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let debug_str = format!("{:?}", telegram());
        assert!(!debug_str.contains("ABCdef"));
        assert!(debug_str.contains("<REDACTED>"));
    }
}
