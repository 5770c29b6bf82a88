use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// One leveled message emitted during a sync or dependency build.
#[derive(Debug, Clone)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Destination for user-visible output. The editor layer installs its own
/// sink; the default routes through tracing.
pub trait OutputSink: Send + Sync {
    fn output(&self, message: &Message);
}

struct TracingSink;

impl OutputSink for TracingSink {
    fn output(&self, message: &Message) {
        match message.level {
            MessageLevel::Info => info!("{}", message.text),
            MessageLevel::Warning => warn!("{}", message.text),
            MessageLevel::Error => error!("{}", message.text),
        }
    }
}

/// Reporting and cancellation state for one request.
///
/// Partial failures never abort a request; they accumulate on the sticky
/// `has_warnings` flag and are summarized through the sink. Contexts are
/// cheap to clone and share their state.
#[derive(Clone)]
pub struct SyncContext {
    sink: Arc<dyn OutputSink>,
    has_warnings: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl SyncContext {
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    pub fn with_sink(sink: Arc<dyn OutputSink>) -> Self {
        Self {
            sink,
            has_warnings: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn output(&self, message: Message) {
        self.sink.output(&message);
    }

    pub fn set_has_warnings(&self) {
        self.has_warnings.store(true, Ordering::Release);
    }

    pub fn has_warnings(&self) -> bool {
        self.has_warnings.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for SyncContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Sink that records every message, for tests and for surfacing a summary in
/// the editor's console.
#[derive(Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<Message>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

impl OutputSink for CollectingSink {
    fn output(&self, message: &Message) {
        self.messages.lock().unwrap().push(message.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_flag_is_sticky_across_clones() {
        let context = SyncContext::new();
        let clone = context.clone();
        clone.set_has_warnings();
        assert!(context.has_warnings());
    }

    #[test]
    fn test_collecting_sink_records_messages() {
        let sink = Arc::new(CollectingSink::new());
        let context = SyncContext::with_sink(sink.clone());
        context.output(Message::warning("two targets had build errors"));
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, MessageLevel::Warning);
    }

    #[test]
    fn test_cancellation_is_shared() {
        let context = SyncContext::new();
        let clone = context.clone();
        context.cancel();
        assert!(clone.is_cancelled());
    }
}
