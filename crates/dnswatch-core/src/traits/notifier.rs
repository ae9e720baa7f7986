// # Notifier Trait
//
// Defines the interface for delivering change alerts.
//
// ## Implementations
//
// - Telegram: `dnswatch-telegram` crate
//
// ## Usage
//
// ```rust,ignore
// use dnswatch_core::Notifier;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let notifier = /* Notifier implementation */;
//
//     notifier.notify("[ALERT] DNS changes detected for example.com!").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for notification transports
///
/// The destination (chat, channel, address) is bound when the notifier is
/// constructed; the monitor only hands over text.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform API calls to their own endpoint only
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (a failed alert is logged by `DnsMonitor` and
///   the snapshot still advances)
/// - ❌ Truncate or rewrite the text (the formatter already bounded it)
/// - ❌ Spawn tasks
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the configured destination
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The transport accepted the message
    /// - `Err(Error)`: Delivery failed, transiently or permanently
    async fn notify(&self, text: &str) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}
