//! Structured JSONL event log for dispatch decisions.
//!
//! One JSON object per line, appended to the file named by `SANIDUMP_LOG`.
//! Emission runs inside the sanitizer's report path, so it never waits: a
//! record that finds the writer busy is dropped, and write errors are ignored
//! once the file is open.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;

use crate::dispatch::Dispatch;
use crate::error::HookError;
use crate::summary::{SanitizerKind, classify};

/// Longest report excerpt copied into a record.
pub const MAX_REPORT_BYTES: usize = 512;

/// One dispatched error summary.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub timestamp_ms: u64,
    pub event: &'static str,
    pub sanitizer: SanitizerKind,
    pub outcome: &'static str,
    pub report: String,
}

impl DispatchRecord {
    #[must_use]
    pub fn new(report: &[u8], dispatch: Dispatch) -> Self {
        let excerpt = &report[..report.len().min(MAX_REPORT_BYTES)];
        Self {
            timestamp_ms: now_ms(),
            event: "error_summary",
            sanitizer: classify(report).kind,
            outcome: dispatch.label(),
            report: String::from_utf8_lossy(excerpt).into_owned(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Append-only JSONL sink.
#[derive(Debug, Default)]
pub struct EventLog {
    writer: Option<Mutex<File>>,
}

impl EventLog {
    /// A log that discards every record.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { writer: None }
    }

    /// Open (or create) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HookError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            writer: Some(Mutex::new(file)),
        })
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Append one record. Returns whether it was written.
    pub fn emit(&self, record: &DispatchRecord) -> bool {
        let Some(writer) = &self.writer else {
            return false;
        };
        let Ok(mut line) = serde_json::to_vec(record) else {
            return false;
        };
        line.push(b'\n');
        let Some(mut file) = writer.try_lock() else {
            return false;
        };
        file.write_all(&line).is_ok()
    }
}
