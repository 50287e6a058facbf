//! Audit sink for structural inventory events.
//!
//! # Responsibility
//! - Define the fire-and-forget journal contract used by lifecycle operations.
//! - Provide a log-backed sink and a SQLite `Journal` table sink.
//!
//! # Invariants
//! - Recording never fails the calling operation; sink errors are logged.
//! - Field-level edits are not journaled.

use log::{error, info, warn};
use rusqlite::{params, Connection};

/// Severity of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Warning,
    Error,
}

impl AuditLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Receiver of append-only journal requests.
pub trait AuditSink {
    fn record(&self, level: AuditLevel, event: &str, message: &str);
}

/// Sink that forwards entries to the process log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, level: AuditLevel, event: &str, message: &str) {
        match level {
            AuditLevel::Info => info!("event={event} module=journal status=ok message={message}"),
            AuditLevel::Warning => {
                warn!("event={event} module=journal status=warning message={message}")
            }
            AuditLevel::Error => {
                error!("event={event} module=journal status=error message={message}")
            }
        }
    }
}

/// Sink appending to the `Journal` table on the shared connection.
pub struct SqliteJournal<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournal<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuditSink for SqliteJournal<'_> {
    fn record(&self, level: AuditLevel, event: &str, message: &str) {
        let result = self.conn.execute(
            "INSERT INTO Journal (Level, Event, Message) VALUES (?1, ?2, ?3);",
            params![level.as_str(), event, message],
        );
        if let Err(err) = result {
            warn!(
                "event=journal_append module=journal status=error journal_event={} error={}",
                event, err
            );
        }
    }
}
