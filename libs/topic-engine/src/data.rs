use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tokio::sync::futures::Notified;

use topic_api::TopicName;

/// Encoded `(key, value)` pair; `None` is the null marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub key: Option<Vec<u8>>,
    pub value: Option<Vec<u8>>,
}

impl RawRecord {
    pub fn new(key: Option<Vec<u8>>, value: Option<Vec<u8>>) -> Self {
        Self { key, value }
    }
}

/// Append-only log of one topic (partition 0).
///
/// The mutex covers only the append and the count update. Waiters are
/// woken after it is released.
pub struct TopicData {
    name: TopicName,
    records: Mutex<Vec<RawRecord>>,
    count: AtomicI64,
    /// Waiter set: every registered `Notified` is woken and dropped from the
    /// set on each append.
    appended: Notify,
}

impl std::fmt::Debug for TopicData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicData")
            .field("name", &self.name)
            .field("count", &self.count())
            .finish()
    }
}

impl TopicData {
    pub fn new(name: TopicName) -> Self {
        Self {
            name,
            records: Mutex::new(Vec::new()),
            count: AtomicI64::new(0),
            appended: Notify::new(),
        }
    }

    pub fn name(&self) -> &TopicName {
        &self.name
    }

    /// Number of successful appends so far.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Acquire)
    }

    /// Append one record and return its offset.
    pub fn add(&self, record: RawRecord) -> i64 {
        let count = {
            let mut records = self.lock();
            records.push(record);
            let count = records.len() as i64;
            self.count.store(count, Ordering::Release);
            count
        };
        self.appended.notify_waiters();
        count - 1
    }

    /// Append a batch and return the offset of its first record.
    ///
    /// One notification is sent for the whole batch.
    pub fn add_range(&self, batch: impl IntoIterator<Item = RawRecord>) -> i64 {
        let (first, count) = {
            let mut records = self.lock();
            let first = records.len() as i64;
            records.extend(batch);
            let count = records.len() as i64;
            self.count.store(count, Ordering::Release);
            (first, count)
        };
        if count > first {
            self.appended.notify_waiters();
        }
        first
    }

    /// Record at `offset`, if the log already holds it.
    pub fn get(&self, offset: i64) -> Option<RawRecord> {
        let index = usize::try_from(offset).ok()?;
        self.lock().get(index).cloned()
    }

    /// A fresh wake signal for the next append.
    ///
    /// The signal joins the waiter set once it is enabled or first polled;
    /// callers must re-check the log after enabling it.
    pub fn appended(&self) -> Notified<'_> {
        self.appended.notified()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RawRecord>> {
        match self.records.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!(topic = %self.name, "topic log lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
