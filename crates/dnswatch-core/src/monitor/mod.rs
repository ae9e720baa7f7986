//! DNS monitor loop
//!
//! The DnsMonitor is responsible for:
//! - Taking the initial snapshot of the monitored domain
//! - Re-snapshotting on a fixed interval
//! - Diffing each snapshot against the last known one
//! - Alerting through the Notifier when something changed
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────┐    tick     ┌──────────────┐
//!   │   interval   │────────────▶│  DnsMonitor  │
//!   └──────────────┘             └──────────────┘
//!                                       │
//!        ┌──────────────────────────────┼──────────────────────────┐
//!        │                              │                          │
//!        ▼                              ▼                          ▼
//! ┌─────────────────┐           ┌──────────────┐          ┌──────────────┐
//! │ SnapshotBuilder │           │ SharedState  │          │   Notifier   │
//! │ (resolve_all)   │           │ (diff base)  │          │   (alert)    │
//! └─────────────────┘           └──────────────┘          └──────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Take a snapshot (failed types are simply absent)
//! 2. Record activity in SharedState
//! 3. Diff against the last known snapshot
//! 4. If changed, format and send one alert
//! 5. Replace the last known snapshot, whether or not the alert went out
//!
//! A failed cycle is logged and the next one runs on the following tick:
//! failures neither shorten nor stretch the cadence.

pub mod state;

pub use state::{MonitorState, SharedState};

use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::format;
use crate::snapshot::{ChangeRecord, Snapshot, SnapshotBuilder, diff};
use crate::traits::{Notifier, RecordResolver};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Events emitted by the DnsMonitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Monitor started
    Started {
        domain: String,
        poll_interval_secs: u64,
    },

    /// Initial snapshot taken
    InitialSnapshot {
        record_types: usize,
    },

    /// A poll cycle finished its comparison
    CycleCompleted {
        changes: usize,
    },

    /// At least one record type changed
    ChangeDetected {
        changes: Vec<ChangeRecord>,
    },

    /// The notifier accepted the alert
    AlertSent,

    /// The notifier rejected the alert
    AlertFailed {
        error: String,
    },

    /// Monitor stopped
    Stopped {
        reason: String,
    },
}

/// Periodic DNS change monitor
///
/// ## Lifecycle
///
/// 1. Create with [`DnsMonitor::new()`]
/// 2. Hand [`DnsMonitor::state()`] and [`DnsMonitor::snapshot_builder()`]
///    to the command handlers
/// 3. Start with [`DnsMonitor::run()`]
/// 4. Runs until a shutdown signal is received
///
/// ## Load Resistance
///
/// - **Bounded event channel**: a full channel drops events (logged)
/// - **No re-alerting**: the last known snapshot advances even when the
///   alert could not be delivered
/// - **Isolated delivery**: the notifier runs on its own task, so a panicking
///   notifier counts as a failed delivery
pub struct DnsMonitor {
    /// Snapshot source for the monitored domain
    builder: SnapshotBuilder,

    /// Alert transport
    notifier: Arc<dyn Notifier>,

    /// Last known snapshot and activity
    state: SharedState,

    /// Time between poll cycles
    poll_interval: Duration,

    /// Alert length ceiling
    max_message_chars: usize,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<MonitorEvent>,
}

impl DnsMonitor {
    /// Create a new monitor
    ///
    /// # Parameters
    ///
    /// - `resolver`: Resolver implementation
    /// - `notifier`: Notifier implementation
    /// - `config`: Monitor configuration
    ///
    /// # Returns
    ///
    /// A tuple of (monitor, event_receiver) where event_receiver yields monitor events
    pub fn new(
        resolver: Arc<dyn RecordResolver>,
        notifier: Arc<dyn Notifier>,
        config: &MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<MonitorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let monitor = Self {
            builder: SnapshotBuilder::new(
                resolver,
                config.domain.clone(),
                config.engine.lookup_timeout(),
            ),
            notifier,
            state: SharedState::new(),
            poll_interval: config.engine.poll_interval(),
            max_message_chars: config.engine.max_message_chars,
            event_tx: tx,
        };

        Ok((monitor, rx))
    }

    /// Read handle on the monitor state
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// The snapshot builder the monitor polls with
    pub fn snapshot_builder(&self) -> SnapshotBuilder {
        self.builder.clone()
    }

    /// The monitored domain
    pub fn domain(&self) -> &str {
        self.builder.domain()
    }

    /// Run the monitor until SIGINT
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the monitor until `shutdown_rx` fires (or SIGINT when `None`)
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(MonitorEvent::Started {
            domain: self.domain().to_string(),
            poll_interval_secs: self.poll_interval.as_secs(),
        });

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

        tokio::select! {
            _ = self.initialize() => {}
            _ = &mut shutdown => {
                self.stopped();
                return Ok(());
            }
        }

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial snapshot covers it
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        result = self.poll_cycle() => {
                            if let Err(e) = result {
                                error!("Poll cycle for {} failed: {}", self.domain(), e);
                                // Continue running despite errors
                            }
                        }
                        _ = &mut shutdown => break,
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        self.stopped();
        Ok(())
    }

    /// Take the initial snapshot and make it the comparison base
    pub async fn initialize(&self) -> Snapshot {
        let snapshot = self.builder.snapshot().await;
        self.log_failures(&snapshot);

        info!(
            "Initial DNS for {}:\n{}",
            self.domain(),
            format::format_snapshot(&snapshot)
        );

        self.state.initialize(snapshot.clone(), Utc::now()).await;
        self.emit_event(MonitorEvent::InitialSnapshot {
            record_types: snapshot.len(),
        });

        snapshot
    }

    /// Run one poll cycle
    ///
    /// # Returns
    ///
    /// - `Ok(changes)`: The detected changes (empty when nothing changed),
    ///   alert delivered if there were any
    /// - `Err(Error)`: The alert could not be delivered; the snapshot has
    ///   still been advanced
    pub async fn poll_cycle(&self) -> Result<Vec<ChangeRecord>> {
        let snapshot = self.builder.snapshot().await;
        self.log_failures(&snapshot);

        self.state.record_activity(Utc::now()).await;

        let previous = self.state.last_snapshot().await;
        let changes = diff(&previous, &snapshot);

        self.emit_event(MonitorEvent::CycleCompleted {
            changes: changes.len(),
        });

        if changes.is_empty() {
            debug!("No changes detected for {}", self.domain());
            return Ok(changes);
        }

        info!(
            "DNS changes detected for {}: {}",
            self.domain(),
            changes
                .iter()
                .map(|c| c.record_type.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.emit_event(MonitorEvent::ChangeDetected {
            changes: changes.clone(),
        });

        let message = format::truncate(
            &format::format_diff(self.domain(), &changes),
            self.max_message_chars,
        );
        let delivery = self.deliver(message).await;

        // Advance even on failed delivery so the same change is not re-alerted
        self.state.replace_snapshot(snapshot).await;

        match delivery {
            Ok(()) => {
                self.state.record_alert().await;
                info!("Alert sent via {}", self.notifier.notifier_name());
                self.emit_event(MonitorEvent::AlertSent);
                Ok(changes)
            }
            Err(e) => {
                self.emit_event(MonitorEvent::AlertFailed {
                    error: e.to_string(),
                });
                Err(Error::notifier(format!(
                    "failed to send alert via {}: {}",
                    self.notifier.notifier_name(),
                    e
                )))
            }
        }
    }

    /// Send `message` on a separate task
    ///
    /// Dropping the returned future (shutdown mid-cycle) aborts the send.
    async fn deliver(&self, message: String) -> Result<()> {
        let notifier = Arc::clone(&self.notifier);
        let mut delivery = JoinSet::new();
        delivery.spawn(async move { notifier.notify(&message).await });

        match delivery.join_next().await {
            Some(Ok(result)) => result,
            Some(Err(e)) => Err(Error::notifier(format!("delivery task failed: {}", e))),
            None => Err(Error::notifier("delivery task missing")),
        }
    }

    fn log_failures(&self, snapshot: &Snapshot) {
        for (record_type, reason) in snapshot.failures() {
            warn!("{} {} lookup failed: {}", self.domain(), record_type, reason);
        }
    }

    fn stopped(&self) {
        info!("Shutdown signal received, monitor for {} stopped", self.domain());
        self.emit_event(MonitorEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
    }

    /// Emit a monitor event
    fn emit_event(&self, event: MonitorEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
