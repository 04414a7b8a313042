//! Status log kept by front-ends
//!
//! Every action outcome and history event becomes a timestamped entry so a
//! front-end can show the latest status line and a short backlog.
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::core::session::{Action, SessionOutcome, Severity};

/// A log entry with timestamp and message
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub level: LogLevel,
    pub metadata: Option<LogMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Info,
    Error,
}

impl From<Severity> for LogLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => LogLevel::Info,
            Severity::Error => LogLevel::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogMetadata {
    /// Result of a check-port or run-test action
    Exchange { action: Action, port: Option<String> },
    /// History view refresh
    History { records: usize },
}

impl LogEntry {
    pub fn new(message: String, level: LogLevel) -> Self {
        Self {
            timestamp: Local::now(),
            message,
            level,
            metadata: None,
        }
    }

    pub fn with_metadata(message: String, level: LogLevel, metadata: LogMetadata) -> Self {
        Self {
            timestamp: Local::now(),
            message,
            level,
            metadata: Some(metadata),
        }
    }

    pub fn from_outcome(action: Action, port: Option<String>, outcome: &SessionOutcome) -> Self {
        Self::with_metadata(
            outcome.message().to_string(),
            outcome.severity().into(),
            LogMetadata::Exchange { action, port },
        )
    }

    pub fn info(message: String) -> Self {
        Self::new(message, LogLevel::Info)
    }

    pub fn error(message: String) -> Self {
        Self::new(message, LogLevel::Error)
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{:?}] {}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// A simple log buffer that stores recent log entries
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    max_entries: usize,
}

impl LogBuffer {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);

        // Trim oldest entries if we exceed the max
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(0..excess);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_drops_oldest_entries() {
        let mut buffer = LogBuffer::new(2);
        buffer.push(LogEntry::info("one".into()));
        buffer.push(LogEntry::info("two".into()));
        buffer.push(LogEntry::error("three".into()));
        let messages: Vec<_> = buffer.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(buffer.entries()[1].level, LogLevel::Error);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn outcome_entry_carries_severity() {
        let ok = LogEntry::from_outcome(
            Action::CheckPort,
            Some("COM3".into()),
            &SessionOutcome::Success("Port is working".into()),
        );
        assert_eq!(ok.level, LogLevel::Info);
        assert_eq!(ok.message, "Port is working");

        let bad = LogEntry::from_outcome(
            Action::RunTest,
            None,
            &SessionOutcome::Error("No ports available".into()),
        );
        assert_eq!(bad.level, LogLevel::Error);
        assert!(matches!(
            bad.metadata,
            Some(LogMetadata::Exchange { action: Action::RunTest, port: None })
        ));
    }
}
