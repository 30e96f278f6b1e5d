use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rdkafka::producer::{FutureProducer, FutureRecord, Producer};

use topic_api::{
    Offset, Partition, TopicDefinition, TopicError, TopicPosition, TopicResult, TopicWriter,
};

use crate::lock;
use crate::settings::KafkaSettings;

/// Writer that produces each record and awaits its delivery report.
pub struct KafkaTopicWriter<K, V> {
    definition: Arc<TopicDefinition<K, V>>,
    producer: Mutex<Option<Arc<FutureProducer>>>,
    message_timeout: Duration,
    disposed: AtomicBool,
}

impl<K, V> KafkaTopicWriter<K, V> {
    pub fn new(
        definition: Arc<TopicDefinition<K, V>>,
        bootstrap_servers: &str,
        settings: &KafkaSettings,
    ) -> Result<Self, TopicError> {
        let producer: FutureProducer = settings
            .producer_config(bootstrap_servers)
            .create()
            .map_err(|e| {
                TopicError::broker(format!("create producer for '{}': {e}", definition.name()))
            })?;
        tracing::info!(topic = %definition.name(), bootstrap = %bootstrap_servers, "opened kafka writer");
        Ok(Self {
            definition,
            producer: Mutex::new(Some(Arc::new(producer))),
            message_timeout: settings.message_timeout(),
            disposed: AtomicBool::new(false),
        })
    }

    fn producer(&self) -> Result<Arc<FutureProducer>, TopicError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(TopicError::disposed("writer"));
        }
        lock(&self.producer, "kafka writer")
            .clone()
            .ok_or_else(|| TopicError::disposed("writer"))
    }
}

impl<K, V> TopicWriter<K, V> for KafkaTopicWriter<K, V>
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
            let producer = self.producer()?;
            let key_bytes = self.definition.encode_key(&key)?;
            let value_bytes = self.definition.encode_value(&value)?;
            let topic = self.definition.name();

            let mut record = FutureRecord::<[u8], [u8]>::to(topic.as_str())
                .partition(Partition::ZERO.to_raw());
            if let Some(bytes) = key_bytes.as_deref() {
                record = record.key(bytes);
            }
            if let Some(bytes) = value_bytes.as_deref() {
                record = record.payload(bytes);
            }

            let (partition, offset) = producer
                .send(record, self.message_timeout)
                .await
                .map_err(|(e, _)| TopicError::broker(format!("produce to '{topic}': {e}")))?;

            Ok(TopicResult {
                key,
                value,
                position: TopicPosition::new(
                    topic.clone(),
                    Partition::from_raw(partition),
                    Offset::from_raw(offset),
                ),
            })
        })
    }

    fn dispose(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            let producer = lock(&self.producer, "kafka writer").take();
            let topic = self.definition.name().clone();
            let Some(producer) = producer else { return };

            let timeout = self.message_timeout;
            let flushed = tokio::task::spawn_blocking(move || producer.flush(timeout)).await;
            match flushed {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(topic = %topic, error = %e, "flush on dispose failed"),
                Err(e) => tracing::warn!(topic = %topic, error = %e, "flush task failed"),
            }
            tracing::info!(topic = %topic, "disposed kafka writer");
        })
    }
}
