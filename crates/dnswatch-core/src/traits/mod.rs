//! Core traits for the DNS monitor
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`RecordResolver`]: Typed DNS queries rendered as display strings
//! - [`Notifier`]: Change alert delivery
//! - [`CommandSource`]: Request/response command transport

pub mod resolver;
pub mod notifier;
pub mod command_source;

pub use resolver::RecordResolver;
pub use notifier::Notifier;
pub use command_source::{CommandSource, CommandRequest};
