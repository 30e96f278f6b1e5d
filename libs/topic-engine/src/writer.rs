use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use topic_api::{Offset, Partition, TopicDefinition, TopicError, TopicPosition, TopicResult, TopicWriter};

use crate::data::{RawRecord, TopicData};
use crate::registry::TopicRegistry;

/// Writer over a simulated topic. An append is acknowledged as soon as it
/// is in the log.
pub struct MemoryTopicWriter<K, V> {
    definition: Arc<TopicDefinition<K, V>>,
    data: Arc<TopicData>,
    disposed: AtomicBool,
}

impl<K, V> MemoryTopicWriter<K, V> {
    pub fn new(definition: Arc<TopicDefinition<K, V>>, registry: &TopicRegistry) -> Self {
        let data = registry.get_or_create(definition.name());
        tracing::debug!(topic = %definition.name(), "opened simulated writer");
        Self {
            definition,
            data,
            disposed: AtomicBool::new(false),
        }
    }
}

impl<K, V> TopicWriter<K, V> for MemoryTopicWriter<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    fn write(
        &self,
        key: K,
        value: V,
    ) -> Pin<Box<dyn Future<Output = Result<TopicResult<K, V>, TopicError>> + Send + '_>> {
        Box::pin(async move {
            if self.disposed.load(Ordering::Acquire) {
                return Err(TopicError::disposed("writer"));
            }
            let record = RawRecord::new(
                self.definition.encode_key(&key)?,
                self.definition.encode_value(&value)?,
            );
            let offset = self.data.add(record);
            Ok(TopicResult {
                key,
                value,
                position: TopicPosition::new(
                    self.definition.name().clone(),
                    Partition::ZERO,
                    Offset::Offset(offset),
                ),
            })
        })
    }

    fn dispose(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if !self.disposed.swap(true, Ordering::AcqRel) {
                tracing::debug!(topic = %self.definition.name(), "disposed simulated writer");
            }
        })
    }
}
