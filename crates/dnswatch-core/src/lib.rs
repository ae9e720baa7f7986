// # dnswatch-core
//
// Core library for the DNS change monitor.
//
// ## Architecture Overview
//
// - **RecordResolver**: Trait for typed DNS queries rendered as display strings
// - **Snapshot / resolve_all**: Multi-type snapshot of one domain, with
//   per-type failure isolation
// - **diff**: Order-insensitive comparison of two snapshots
// - **format**: Bounded-length rendering for transports
// - **DnsMonitor**: Polling loop that alerts through a **Notifier**
// - **CommandHandler / CommandDispatcher**: `check` and `status` over a
//   **CommandSource**
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from transports
// 2. **Failure Isolation**: One failing record type never hides the others
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Single Writer**: Only the monitor loop mutates monitor state

pub mod traits;
pub mod snapshot;
pub mod format;
pub mod monitor;
pub mod commands;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{RecordResolver, Notifier, CommandSource, CommandRequest};
pub use snapshot::{ChangeRecord, LookupOutcome, RecordType, Snapshot, SnapshotBuilder, diff, resolve_all};
pub use monitor::{DnsMonitor, MonitorEvent, SharedState};
pub use commands::{Command, CommandDispatcher, CommandHandler};
pub use config::{EngineConfig, MonitorConfig, NotifierConfig};
pub use error::{Error, Result};
