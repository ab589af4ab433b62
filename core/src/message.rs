//! Error/message sink (`spec.md` component H): a process-wide callback that
//! every other component reports through. "No message emission is fatal by
//! itself" — this module never panics or returns `Result`.

use chrono::Local;

/// Severity of a message passed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A callback accepting `(severity, message)`. Stored in the `Context` and
/// invoked by every component; if unset, messages are dropped.
pub type MessageSink = Box<dyn Fn(Severity, &str) + Send + Sync>;

/// Formats `[MM::DD::YYYY HH::MM::SS] message` per `spec.md` §4.7.
pub fn timestamped(message: &str) -> String {
    format!("[{}] {}", Local::now().format("%m::%d::%Y %H::%M::%S"), message)
}

/// Owns the optional sink callback and dispatches to it.
pub struct MessageBus {
    sink: Option<MessageSink>,
}

impl MessageBus {
    pub fn new() -> Self {
        MessageBus { sink: None }
    }

    pub fn set_sink(&mut self, sink: Option<MessageSink>) {
        self.sink = sink;
    }

    pub fn emit(&self, severity: Severity, message: impl AsRef<str>) {
        if let Some(sink) = &self.sink {
            sink(severity, &timestamped(message.as_ref()));
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(Severity::Info, message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Severity::Error, message);
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
