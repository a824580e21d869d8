use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub const NO_FILE_INDEX: i64 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LogLevel {
    Information,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Information => "information",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogEntryError {
    #[error("critical log entries take no file index, got {0}")]
    CriticalWithIndex(i64),
    #[error("{level} log entries need a file index of at least 1, got {index}")]
    InvalidIndex { level: LogLevel, index: i64 },
    #[error("additional data key is empty")]
    EmptyKey,
    #[error("additional data key '{0}' is already present")]
    DuplicateKey(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    message: String,
    timestamp: DateTime<Utc>,
    level: LogLevel,
    index: i64,
    additional_data: BTreeMap<String, String>,
}

impl LogEntry {
    /// Critical entries must use [`NO_FILE_INDEX`]; every other level needs a
    /// 1-based file index.
    pub fn new(level: LogLevel, index: i64, message: impl Into<String>) -> Result<Self, LogEntryError> {
        match level {
            LogLevel::Critical if index != NO_FILE_INDEX => {
                return Err(LogEntryError::CriticalWithIndex(index));
            }
            LogLevel::Critical => {}
            _ if index < 1 => return Err(LogEntryError::InvalidIndex { level, index }),
            _ => {}
        }
        Ok(Self {
            message: message.into(),
            timestamp: Utc::now(),
            level,
            index,
            additional_data: BTreeMap::new(),
        })
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
            level: LogLevel::Critical,
            index: NO_FILE_INDEX,
            additional_data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<String>) -> Result<Self, LogEntryError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LogEntryError::EmptyKey);
        }
        if self.additional_data.contains_key(key) {
            return Err(LogEntryError::DuplicateKey(key.to_string()));
        }
        self.additional_data.insert(key.to_string(), value.into());
        Ok(self)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn additional_data(&self) -> &BTreeMap<String, String> {
        &self.additional_data
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.additional_data.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_rules_follow_level() {
        assert!(LogEntry::new(LogLevel::Information, 1, "ok").is_ok());
        assert_eq!(
            LogEntry::new(LogLevel::Warning, 0, "bad").unwrap_err(),
            LogEntryError::InvalidIndex {
                level: LogLevel::Warning,
                index: 0
            }
        );
        assert_eq!(
            LogEntry::new(LogLevel::Critical, 3, "bad").unwrap_err(),
            LogEntryError::CriticalWithIndex(3)
        );
        let entry = LogEntry::new(LogLevel::Critical, NO_FILE_INDEX, "root failed").unwrap();
        assert_eq!(entry.index(), NO_FILE_INDEX);
        assert_eq!(LogEntry::critical("x").index(), NO_FILE_INDEX);
    }

    #[test]
    fn data_keys_are_trimmed_and_unique() {
        let entry = LogEntry::new(LogLevel::Error, 2, "failed")
            .and_then(|entry| entry.with_data(" path ", "/music/a.mp3"))
            .unwrap();
        assert_eq!(entry.data("path"), Some("/music/a.mp3"));
        assert_eq!(
            entry.clone().with_data("path", "again").unwrap_err(),
            LogEntryError::DuplicateKey("path".to_string())
        );
        assert_eq!(entry.with_data("   ", "x").unwrap_err(), LogEntryError::EmptyKey);
    }
}
