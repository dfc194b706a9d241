//! Inspection and replay tools for widgetsync protocol messages.
//!
//! This crate provides utilities for understanding what goes over the wire:
//!
//! - Summarize a message: head fields, operation counts by kind, targets
//! - Replay a sequence of client messages against the demo application
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see what the engine sent and why.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use engine::EngineConfig;
use protocol::{
    decode_client_message, decode_protocol_message, ErrorNote, Limits, Operation,
};
use serde::Deserialize;
use sessions::{ManagerConfig, SessionManager};
use tracing::debug;
use widgets::demo_application;

/// Configuration file of the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub engine: EngineConfig,
    pub sessions: ManagerConfig,
}

impl ToolsConfig {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("parse config json")
    }
}

/// Which side produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Client,
    Server,
}

/// Summary of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub origin: Origin,
    pub byte_len: usize,
    pub request_counter: Option<u64>,
    pub types: Option<String>,
    pub operations: usize,
    pub by_kind: BTreeMap<&'static str, usize>,
    pub targets: BTreeSet<String>,
    pub errors: Vec<ErrorNote>,
    pub error: Option<ErrorNote>,
}

impl InspectReport {
    fn from_operations(origin: Origin, byte_len: usize, operations: &[Operation]) -> Self {
        let mut by_kind = BTreeMap::new();
        let mut targets = BTreeSet::new();
        for operation in operations {
            *by_kind.entry(operation.kind().as_str()).or_insert(0) += 1;
            targets.insert(operation.target().to_string());
        }
        Self {
            origin,
            byte_len,
            request_counter: None,
            types: None,
            operations: operations.len(),
            by_kind,
            targets,
            errors: Vec::new(),
            error: None,
        }
    }
}

/// Summarizes a message.
///
/// Server messages are tried first. A message that only parses as a client
/// message (it carries `notify`, for instance) is reported as such.
pub fn inspect_message(bytes: &[u8], limits: &Limits) -> Result<InspectReport> {
    match decode_protocol_message(bytes, limits) {
        Ok(message) => {
            let mut report =
                InspectReport::from_operations(Origin::Server, bytes.len(), &message.operations);
            report.request_counter = message.head.request_counter;
            report.types = message.head.types;
            report.errors = message.head.errors;
            report.error = message.head.error;
            Ok(report)
        }
        Err(server_err) => {
            debug!(error = %server_err, "not a server message");
            let message = decode_client_message(bytes, limits).context("decode message")?;
            let mut report =
                InspectReport::from_operations(Origin::Client, bytes.len(), &message.operations);
            report.request_counter = message.request_counter();
            Ok(report)
        }
    }
}

/// Renders a report for the terminal.
#[must_use]
pub fn format_report(report: &InspectReport) -> String {
    let mut out = String::new();
    let origin = match report.origin {
        Origin::Client => "client",
        Origin::Server => "server",
    };
    let _ = writeln!(out, "origin: {origin} ({} bytes)", report.byte_len);
    if let Some(counter) = report.request_counter {
        let _ = writeln!(out, "request counter: {counter}");
    }
    if let Some(types) = &report.types {
        let _ = writeln!(out, "types: {types}");
    }
    let _ = writeln!(
        out,
        "operations: {} on {} objects",
        report.operations,
        report.targets.len()
    );
    for (kind, count) in &report.by_kind {
        let _ = writeln!(out, "  {kind}: {count}");
    }
    if let Some(error) = &report.error {
        let _ = writeln!(out, "aborted: {} {}", error.kind, error.message);
    }
    if !report.errors.is_empty() {
        let _ = writeln!(out, "errors:");
        for note in &report.errors {
            let target = note.target.as_deref().unwrap_or("-");
            let _ = writeln!(out, "  {} {target}: {}", note.kind, note.message);
        }
    }
    out
}

/// Feeds client messages to one session of the demo application and
/// returns the raw responses in order.
pub fn replay(messages: &[Vec<u8>], config: &ToolsConfig) -> Result<Vec<Vec<u8>>> {
    let app = demo_application()
        .context("build demo application")?
        .with_config(config.engine.clone());
    let manager = SessionManager::new(Arc::new(app), &config.sessions);
    let session = manager.create_session();
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            manager
                .handle(session, message)
                .with_context(|| format!("replay message {}", index + 1))
        })
        .collect()
}
