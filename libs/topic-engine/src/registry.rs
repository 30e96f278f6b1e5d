use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use topic_api::TopicName;

use crate::data::{RawRecord, TopicData};

/// Registry of all simulated topics of one connection.
///
/// Logs are created on first reference to a name and live as long as the
/// registry; nothing is ever evicted.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: RwLock<HashMap<TopicName, Arc<TopicData>>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &TopicName) -> Option<Arc<TopicData>> {
        self.read().get(name).cloned()
    }

    /// The log for `name`, creating an empty one if needed.
    pub fn get_or_create(&self, name: &TopicName) -> Arc<TopicData> {
        if let Some(data) = self.get(name) {
            return data;
        }
        let mut guard = self.write();
        guard
            .entry(name.clone())
            .or_insert_with(|| {
                tracing::debug!(topic = %name, "created simulated topic");
                Arc::new(TopicData::new(name.clone()))
            })
            .clone()
    }

    pub fn topic_names(&self) -> Vec<TopicName> {
        self.read().keys().cloned().collect()
    }

    /// Test setup: append pre-encoded records directly to a topic's log,
    /// bypassing writers. Returns the offset of the first loaded record.
    pub fn bulk_load(&self, name: &TopicName, records: impl IntoIterator<Item = RawRecord>) -> i64 {
        let data = self.get_or_create(name);
        let first = data.add_range(records);
        tracing::debug!(topic = %name, first, count = data.count(), "bulk loaded topic");
        first
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TopicName, Arc<TopicData>>> {
        match self.topics.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("topic registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TopicName, Arc<TopicData>>> {
        match self.topics.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("topic registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_returns_the_same_log() {
        let registry = TopicRegistry::new();
        let name = TopicName::from("orders");
        assert!(registry.get(&name).is_none());

        let a = registry.get_or_create(&name);
        let b = registry.get_or_create(&name);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.topic_names(), vec![name]);
    }

    #[test]
    fn bulk_load_appends_after_existing_records() {
        let registry = TopicRegistry::new();
        let name = TopicName::from("orders");
        let first = registry.bulk_load(&name, vec![RawRecord::new(None, None); 3]);
        assert_eq!(first, 0);
        let first = registry.bulk_load(&name, vec![RawRecord::new(None, None); 2]);
        assert_eq!(first, 3);
        assert_eq!(registry.get_or_create(&name).count(), 5);
    }
}
