//! Load diagnostics, echoed to stderr and streamed over SSE.
//!
//! Entries go to stderr so CLI output on stdout stays clean JSON, and to a
//! broadcast channel that `/api/logs` subscribers read from. A diagnostic
//! about one CSV row carries its source line so the page can point at it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Entries kept for slow SSE clients before they start lagging.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    /// Short tag printed in front of stderr lines.
    pub fn tag(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "done",
            LogLevel::Warning => "warn",
            LogLevel::Error => "fail",
        }
    }
}

/// One diagnostic from loading or serving a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// CSV line the message is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }
}

/// `[warn] line 4: empty country`
impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.level.tag())?;
        if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        f.write_str(&self.message)
    }
}

pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans diagnostics out to stderr and every `/api/logs` subscriber.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, entry: LogEntry) {
        eprintln!("reshaper {}", entry);
        // Nobody subscribed yet during CLI runs and at startup
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

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.emit(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.emit(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.emit(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.emit(LogEntry::new(LogLevel::Error, msg));
}

/// Warn about a single CSV row.
pub fn log_row_warning(line: u64, reason: impl Into<String>) {
    LOG_BROADCASTER.emit(LogEntry::new(LogLevel::Warning, reason).at_line(line));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_row_warning() {
        let broadcaster = LogBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.emit(LogEntry::new(LogLevel::Warning, "empty country").at_line(4));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.line, Some(4));
        assert_eq!(entry.to_string(), "[warn] line 4: empty country");
    }

    #[test]
    fn test_emit_without_subscribers() {
        LogBroadcaster::default().emit(LogEntry::new(LogLevel::Info, "nobody listening"));
    }

    #[test]
    fn test_display_tags() {
        assert_eq!(
            LogEntry::new(LogLevel::Success, "3 values over 2 years").to_string(),
            "[done] 3 values over 2 years"
        );
        assert_eq!(LogEntry::new(LogLevel::Error, "no dataset").to_string(), "[fail] no dataset");
    }

    #[test]
    fn test_entry_json() {
        let json = serde_json::to_value(LogEntry::new(LogLevel::Success, "ok")).unwrap();
        assert_eq!(json["level"], "success");
        assert!(json.get("line").is_none());

        let json = serde_json::to_value(LogEntry::new(LogLevel::Warning, "bad year").at_line(7)).unwrap();
        assert_eq!(json["line"], 7);
    }
}
