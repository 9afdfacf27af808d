//! Log collectors.
//!
//! The runtime writes every authored `log` step and every caught failure to
//! a [`LogCollector`]. Hosts either read the buffer back, subscribe to it, or
//! bridge it to their own single-argument sink with [`CallbackCollector`].

use super::event::{LogEvent, LogLevel};
use crate::ids::DispatchId;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum number of events kept by default.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2_000;

/// Trait for log event collectors.
pub trait LogCollector: Send + Sync {
    /// Collect a log event.
    fn collect(&self, event: LogEvent);
}

type LogSubscribers = RwLock<Vec<Arc<dyn Fn(&LogEvent) + Send + Sync>>>;

/// Thread-safe collector with a bounded ring buffer.
pub struct BufferedCollector {
    buffer: RwLock<VecDeque<LogEvent>>,
    capacity: usize,
    next_id: AtomicU64,
    subscribers: LogSubscribers,
}

impl BufferedCollector {
    /// Create a collector with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Create a collector with default capacity.
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }

    /// Add a subscriber for real-time notifications.
    pub fn subscribe(&self, callback: Arc<dyn Fn(&LogEvent) + Send + Sync>) {
        self.subscribers.write().push(callback);
    }

    /// All buffered events, oldest first.
    pub fn all(&self) -> Vec<LogEvent> {
        self.buffer.read().iter().cloned().collect()
    }

    /// Messages only, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.buffer.read().iter().map(|e| e.message.clone()).collect()
    }

    /// Events at or above a level.
    pub fn by_level(&self, min_level: LogLevel) -> Vec<LogEvent> {
        self.buffer
            .read()
            .iter()
            .filter(|e| e.level >= min_level)
            .cloned()
            .collect()
    }

    /// Events of one dispatch.
    pub fn by_dispatch(&self, dispatch_id: DispatchId) -> Vec<LogEvent> {
        self.buffer
            .read()
            .iter()
            .filter(|e| e.dispatch_id == Some(dispatch_id))
            .cloned()
            .collect()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.buffer.read().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BufferedCollector {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl LogCollector for BufferedCollector {
    fn collect(&self, mut event: LogEvent) {
        event.id = self.next_id.fetch_add(1, Ordering::SeqCst);

        // Snapshot subscribers so a callback may log again without deadlocking
        let subscribers: Vec<_> = self.subscribers.read().iter().cloned().collect();
        for subscriber in &subscribers {
            subscriber(&event);
        }

        let mut buffer = self.buffer.write();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(event);
    }
}

/// Adapts a host `log(message)` function into a collector.
pub struct CallbackCollector {
    callback: Box<dyn Fn(&str) + Send + Sync>,
    min_level: LogLevel,
}

impl CallbackCollector {
    /// Forward every event's message to `callback`.
    pub fn new(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
            min_level: LogLevel::Debug,
        }
    }

    /// Drop events below `level`.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }
}

impl LogCollector for CallbackCollector {
    fn collect(&self, event: LogEvent) {
        if event.level >= self.min_level {
            (self.callback)(&event.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogCategory;
    use parking_lot::Mutex;

    #[test]
    fn buffered_collector_assigns_ids_and_evicts() {
        let collector = BufferedCollector::new(2);
        collector.collect(LogEvent::new(LogLevel::Info, LogCategory::User, "one"));
        collector.collect(LogEvent::new(LogLevel::Info, LogCategory::User, "two"));
        collector.collect(LogEvent::new(LogLevel::Info, LogCategory::User, "three"));

        let events = collector.all();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "two");
        assert_eq!(events[1].id, 3);
    }

    #[test]
    fn by_level_filters() {
        let collector = BufferedCollector::default();
        collector.collect(LogEvent::new(LogLevel::Info, LogCategory::User, "fine"));
        collector.collect(LogEvent::new(LogLevel::Warn, LogCategory::Address, "missing"));

        let warnings = collector.by_level(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, LogCategory::Address);
    }

    #[test]
    fn subscribers_receive_events() {
        let collector = BufferedCollector::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        collector.subscribe(Arc::new(move |e: &LogEvent| sink.lock().push(e.message.clone())));

        collector.collect(LogEvent::new(LogLevel::Info, LogCategory::User, "hello"));
        assert_eq!(seen.lock().as_slice(), ["hello".to_string()]);
    }

    #[test]
    fn callback_collector_forwards_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let collector = CallbackCollector::new(move |m: &str| sink.lock().push(m.to_string()))
            .with_min_level(LogLevel::Info);

        collector.collect(LogEvent::new(LogLevel::Debug, LogCategory::Graph, "noise"));
        collector.collect(LogEvent::new(LogLevel::Info, LogCategory::User, "shown"));
        assert_eq!(seen.lock().as_slice(), ["shown".to_string()]);
    }
}
