//! Import progress streaming via Server-Sent Events (SSE).
//!
//! The pipeline reports each stage through a broadcast channel; connected
//! clients follow a long-running import without polling. Entries are also
//! mirrored to stdout.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity for client display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single progress entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Global progress broadcaster.
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans progress entries out to all connected SSE clients.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => " ",
            LogLevel::Success => "+",
            LogLevel::Warning => "!",
            LogLevel::Error => "x",
        };
        println!("[{}] {}", prefix, entry.message);

        // No subscribers is fine; stdout already has it.
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(message: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry { level: LogLevel::Info, message: message.into() });
}

pub fn log_success(message: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry { level: LogLevel::Success, message: message.into() });
}

pub fn log_warning(message: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry { level: LogLevel::Warning, message: message.into() });
}

pub fn log_error(message: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry { level: LogLevel::Error, message: message.into() });
}
