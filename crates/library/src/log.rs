use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryIter};

use common::{LogEntry, LogEntryError, LogLevel};
use parking_lot::Mutex;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct LogSubscription {
    id: SubscriptionId,
    receiver: Receiver<LogEntry>,
}

impl LogSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn try_iter(&self) -> TryIter<'_, LogEntry> {
        self.receiver.try_iter()
    }

    pub fn drain(&self) -> Vec<LogEntry> {
        self.receiver.try_iter().collect()
    }

    pub fn receiver(&self) -> &Receiver<LogEntry> {
        &self.receiver
    }
}

struct Subscriber {
    id: SubscriptionId,
    sender: Sender<LogEntry>,
}

#[derive(Default)]
pub struct LogChannel {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl LogChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> LogSubscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel();
        self.subscribers.lock().push(Subscriber { id, sender });
        LogSubscription { id, receiver }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn emit(&self, entry: LogEntry) {
        trace_entry(&entry);
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| subscriber.sender.send(entry.clone()).is_ok());
    }

    pub fn emit_with(&self, level: LogLevel, index: i64, message: &str, data: &[(&str, String)]) {
        match build_entry(level, index, message, data) {
            Ok(entry) => self.emit(entry),
            Err(err) => warn!("Dropped log entry '{}': {}", message, err),
        }
    }
}

pub(crate) fn build_entry(
    level: LogLevel,
    index: i64,
    message: &str,
    data: &[(&str, String)],
) -> Result<LogEntry, LogEntryError> {
    let mut entry = LogEntry::new(level, index, message)?;
    for (key, value) in data {
        entry = entry.with_data(key, value.clone())?;
    }
    Ok(entry)
}

fn trace_entry(entry: &LogEntry) {
    let data = entry.additional_data();
    match entry.level() {
        LogLevel::Information => info!(index = entry.index(), ?data, "{}", entry.message()),
        LogLevel::Warning => warn!(index = entry.index(), ?data, "{}", entry.message()),
        LogLevel::Error => error!(index = entry.index(), ?data, "{}", entry.message()),
        LogLevel::Critical => error!(critical = true, ?data, "{}", entry.message()),
    }
}
