//! Run log: levelled entries printed to stdout and broadcast to subscribers.
//!
//! Every component that reports progress holds a [`LogBroadcaster`] handle.
//! Clones share the same channel, so a subscriber sees entries from the
//! fetcher, the registration client and the aggregator in emission order.

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Process-wide log broadcaster used by the CLI
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Channel capacity; lagging subscribers lose the oldest entries.
const CHANNEL_CAPACITY: usize = 1024;

/// Prints log entries and broadcasts them to all subscribers
#[derive(Debug, Clone)]
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Print a log entry and send it to all subscribers
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        println!("{}{} {}", indent, prefix, entry.message);

        // No subscribers is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for every entry logged from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.log(LogEntry::info(msg));
    }

    pub fn success(&self, msg: impl Into<String>) {
        self.log(LogEntry::success(msg));
    }

    pub fn warning(&self, msg: impl Into<String>) {
        self.log(LogEntry::warning(msg));
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.log(LogEntry::error(msg));
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Log to the process-wide broadcaster
pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.info(msg);
}

/// Render an error with its whole `source()` chain, outermost first.
///
/// A cause whose message is already part of the rendered text is not repeated.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !rendered.contains(&message) {
            rendered.push_str(": ");
            rendered.push_str(&message);
        }
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_entries_in_order() {
        let logs = LogBroadcaster::new();
        let mut rx = logs.subscribe();

        logs.info("first");
        logs.error("second");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, LogLevel::Info);
        assert_eq!(first.message, "first");
        let second = rx.try_recv().unwrap();
        assert_eq!(second.level, LogLevel::Error);
        assert_eq!(second.message, "second");
    }

    #[test]
    fn test_clones_share_channel() {
        let logs = LogBroadcaster::new();
        let mut rx = logs.subscribe();
        logs.clone().warning("from clone");
        assert_eq!(rx.try_recv().unwrap().message, "from clone");
    }

    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct Opaque(#[source] std::io::Error);

    #[test]
    fn test_error_chain_appends_hidden_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
        assert_eq!(error_chain(&Opaque(inner)), "request failed: connection refused");
    }

    #[test]
    fn test_error_chain_does_not_repeat_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let outer = crate::error::FetchError::from(inner);
        assert_eq!(error_chain(&outer), "IO error: disk gone");
    }

    #[test]
    fn test_indented_entry_keeps_level() {
        let logs = LogBroadcaster::new();
        let mut rx = logs.subscribe();
        logs.log(LogEntry::error("Response: nope").with_indent(1));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.indent, 1);
    }
}
