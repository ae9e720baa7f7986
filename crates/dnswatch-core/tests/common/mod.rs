//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that script DNS answers and
//! record what the monitor sends, without touching the network.

#![allow(dead_code)]

use dnswatch_core::error::{Error, Result};
use dnswatch_core::{
    CommandRequest, CommandSource, MonitorConfig, MonitorEvent, Notifier, NotifierConfig,
    RecordResolver, RecordType,
};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// Scripted answer for one record type
#[derive(Debug, Clone)]
pub enum Answer {
    Records(Vec<String>),
    NoRecords,
    Fail(String),
    /// Never answers within any reasonable timeout
    Hang,
}

/// A resolver whose answers the test controls
///
/// Clones share the script and the call counter. Types without a script
/// answer `NoRecords`.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    answers: Arc<Mutex<HashMap<RecordType, Answer>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `record_type` with `values`
    pub fn set(&self, record_type: RecordType, values: &[&str]) -> &Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        self.answer(record_type, Answer::Records(values))
    }

    /// Make `record_type` fail
    pub fn fail(&self, record_type: RecordType) -> &Self {
        self.answer(record_type, Answer::Fail("SERVFAIL".to_string()))
    }

    /// Make `record_type` hang
    pub fn hang(&self, record_type: RecordType) -> &Self {
        self.answer(record_type, Answer::Hang)
    }

    /// Make `record_type` answer with no records
    pub fn clear(&self, record_type: RecordType) -> &Self {
        self.answer(record_type, Answer::NoRecords)
    }

    pub fn answer(&self, record_type: RecordType, answer: Answer) -> &Self {
        self.answers.lock().unwrap().insert(record_type, answer);
        self
    }

    /// Number of resolve() calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordResolver for ScriptedResolver {
    async fn resolve(&self, domain: &str, record_type: RecordType) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let answer = self
            .answers
            .lock()
            .unwrap()
            .get(&record_type)
            .cloned()
            .unwrap_or(Answer::NoRecords);

        match answer {
            Answer::Records(values) => Ok(values),
            Answer::NoRecords => Err(Error::no_records(format!("{} {}", domain, record_type))),
            Answer::Fail(reason) => Err(Error::resolver(reason)),
            Answer::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::timeout("hung"))
            }
        }
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// A notifier that records every message and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<String>>>,
    attempts: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    panicking: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message until told otherwise
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Panic inside notify() until told otherwise
    pub fn set_panicking(&self, panicking: bool) {
        self.panicking.store(panicking, Ordering::SeqCst);
    }

    /// Messages the notifier accepted
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }

    /// Number of notify() calls, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.panicking.load(Ordering::SeqCst) {
            panic!("notifier blew up");
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::provider("recording", "delivery refused"));
        }
        self.delivered.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// A command source fed by the test through a channel
pub struct ChannelCommandSource {
    requests_rx: Mutex<Option<mpsc::UnboundedReceiver<CommandRequest>>>,
    replies_tx: mpsc::UnboundedSender<(String, String)>,
}

impl ChannelCommandSource {
    /// Returns the source, a sender for requests and a receiver of
    /// `(reply_to, text)` replies
    pub fn new() -> (
        Self,
        mpsc::UnboundedSender<CommandRequest>,
        mpsc::UnboundedReceiver<(String, String)>,
    ) {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();

        let source = Self {
            requests_rx: Mutex::new(Some(requests_rx)),
            replies_tx,
        };

        (source, requests_tx, replies_rx)
    }
}

#[async_trait::async_trait]
impl CommandSource for ChannelCommandSource {
    fn requests(&self) -> Pin<Box<dyn Stream<Item = CommandRequest> + Send + 'static>> {
        let rx = self
            .requests_rx
            .lock()
            .unwrap()
            .take()
            .expect("requests() can only be called once");

        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }

    async fn reply(&self, request: &CommandRequest, text: &str) -> Result<()> {
        self.replies_tx
            .send((request.reply_to.clone(), text.to_string()))
            .map_err(|_| Error::command("reply channel closed"))
    }

    fn source_name(&self) -> &'static str {
        "channel"
    }
}

/// Helper to create a minimal MonitorConfig for testing
pub fn minimal_config(domain: &str) -> MonitorConfig {
    let mut config = MonitorConfig::new(
        domain,
        NotifierConfig::Telegram {
            bot_token: "123456:test-token".to_string(),
            chat_id: "-100123".to_string(),
        },
    );
    config.engine.event_channel_capacity = 1000;
    config
}

/// Wait for the first event matching `predicate`, skipping the others
pub async fn wait_for_event(
    rx: &mut mpsc::Receiver<MonitorEvent>,
    predicate: impl Fn(&MonitorEvent) -> bool,
) -> MonitorEvent {
    loop {
        let event = rx.recv().await.expect("event channel open");
        if predicate(&event) {
            return event;
        }
    }
}
