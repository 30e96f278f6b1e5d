use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;
use std::time::Duration;

use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::{Message, TopicPartitionList};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use topic_api::{
    Offset, Partition, TopicDefinition, TopicError, TopicName, TopicPosition, TopicReader,
    TopicResult,
};

use crate::error::{LoopError, classify};
use crate::lock;
use crate::native::offset_to_native;
use crate::settings::KafkaSettings;

/// Capacity of the relay between the consume loop and `read`.
const RELAY_CAPACITY: usize = 1;

/// Owned copy of one consumed message, handed over the relay.
#[derive(Debug)]
struct RelayedRecord {
    partition: i32,
    offset: i64,
    key: Option<Vec<u8>>,
    value: Option<Vec<u8>>,
}

impl RelayedRecord {
    fn from_message<M: Message>(message: &M) -> Self {
        Self {
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(<[u8]>::to_vec),
            value: message.payload().map(<[u8]>::to_vec),
        }
    }
}

/// Reader over one Kafka partition.
///
/// `start` spawns a dedicated thread that blocks in `BaseConsumer::poll` and
/// pushes every message into a single-slot relay; `read` only dequeues. A
/// full relay blocks the thread, which throttles polling. Any number of
/// tasks may call `read`; they are served one at a time.
pub struct KafkaTopicReader<K, V> {
    definition: Arc<TopicDefinition<K, V>>,
    consumer: Mutex<Option<Arc<BaseConsumer>>>,
    poll_timeout: Duration,
    relay: tokio::sync::Mutex<mpsc::Receiver<RelayedRecord>>,
    /// Handed to the consume loop by `start`.
    relay_tx: Mutex<Option<mpsc::Sender<RelayedRecord>>>,
    /// Set by the consume loop before it closes the relay on a fatal error.
    failure: Arc<OnceLock<TopicError>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Raw offset (`Offset::to_raw`) of the next record `read` returns.
    position: AtomicI64,
    started: AtomicBool,
    disposed: AtomicBool,
    token: CancellationToken,
}

impl<K, V> KafkaTopicReader<K, V> {
    /// Create the consumer and assign it to partition 0 at `start`.
    /// Nothing is consumed until `start` is called.
    pub fn new(
        definition: Arc<TopicDefinition<K, V>>,
        bootstrap_servers: &str,
        settings: &KafkaSettings,
        start: Offset,
    ) -> Result<Self, TopicError> {
        let topic = definition.name().clone();
        let consumer: BaseConsumer = settings
            .consumer_config(bootstrap_servers, topic.as_str())
            .create()
            .map_err(|e| TopicError::broker(format!("create consumer for '{topic}': {e}")))?;

        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(topic.as_str(), Partition::ZERO.to_raw(), offset_to_native(start))
            .map_err(|e| TopicError::broker(format!("assign '{topic}' at {start}: {e}")))?;
        consumer
            .assign(&assignment)
            .map_err(|e| TopicError::broker(format!("assign '{topic}' at {start}: {e}")))?;

        let (relay_tx, relay_rx) = mpsc::channel(RELAY_CAPACITY);
        tracing::info!(topic = %topic, %start, bootstrap = %bootstrap_servers, "opened kafka reader");

        Ok(Self {
            definition,
            consumer: Mutex::new(Some(Arc::new(consumer))),
            poll_timeout: settings.poll_timeout(),
            relay: tokio::sync::Mutex::new(relay_rx),
            relay_tx: Mutex::new(Some(relay_tx)),
            failure: Arc::new(OnceLock::new()),
            worker: Mutex::new(None),
            position: AtomicI64::new(start.to_raw()),
            started: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            token: CancellationToken::new(),
        })
    }

    /// Spawn the consume loop. Fails with `InvalidOperation` when called
    /// more than once.
    pub fn start(&self) -> Result<(), TopicError> {
        self.ensure_live()?;
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(TopicError::invalid_operation(format!(
                "consume loop of '{}' already started",
                self.definition.name()
            )));
        }

        let consumer = self.consumer()?;
        let tx = lock(&self.relay_tx, "kafka reader relay")
            .take()
            .ok_or_else(|| TopicError::disposed("reader"))?;
        let ctx = LoopContext {
            topic: self.definition.name().clone(),
            consumer,
            tx,
            failure: self.failure.clone(),
            token: self.token.clone(),
            poll_timeout: self.poll_timeout,
        };

        let handle = std::thread::Builder::new()
            .name(format!("consume-{}", self.definition.name()))
            .spawn(move || consume_loop(ctx))
            .map_err(|e| TopicError::broker(format!("spawn consume loop: {e}")))?;
        *lock(&self.worker, "kafka reader worker") = Some(handle);
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), TopicError> {
        if self.disposed.load(Ordering::Acquire) {
            Err(TopicError::disposed("reader"))
        } else {
            Ok(())
        }
    }

    fn consumer(&self) -> Result<Arc<BaseConsumer>, TopicError> {
        lock(&self.consumer, "kafka reader consumer")
            .clone()
            .ok_or_else(|| TopicError::disposed("reader"))
    }

    fn owns(&self, topic: &TopicName, partition: Partition) -> bool {
        topic == self.definition.name() && matches!(partition, Partition::Any | Partition::ZERO)
    }
}

impl<K, V> TopicReader<K, V> for KafkaTopicReader<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    fn read(&self) -> Pin<Box<dyn Future<Output = Result<TopicResult<K, V>, TopicError>> + Send + '_>> {
        Box::pin(async move {
            self.ensure_live()?;
            if !self.started.load(Ordering::Acquire) {
                return Err(TopicError::invalid_operation(format!(
                    "reader of '{}' is not started",
                    self.definition.name()
                )));
            }

            let received = {
                let mut relay = self.relay.lock().await;
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => return Err(TopicError::disposed("reader")),
                    received = relay.recv() => received,
                }
            };

            let Some(record) = received else {
                // Relay closed: either a fatal loop error or disposal.
                return Err(self
                    .failure
                    .get()
                    .cloned()
                    .unwrap_or_else(|| TopicError::disposed("reader")));
            };

            self.position.store(record.offset + 1, Ordering::Release);
            let (key, value) = self
                .definition
                .decode(record.key.as_deref(), record.value.as_deref())?;
            Ok(TopicResult {
                key,
                value,
                position: TopicPosition::new(
                    self.definition.name().clone(),
                    Partition::from_raw(record.partition),
                    Offset::Offset(record.offset),
                ),
            })
        })
    }

    fn query_watermark_offsets<'a>(
        &'a self,
        topic: &'a TopicName,
        partition: Partition,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(i64, i64), TopicError>> + Send + 'a>> {
        Box::pin(async move {
            self.ensure_live()?;
            let consumer = self.consumer()?;
            let name = topic.to_string();
            // Only partition 0 exists.
            let index = match partition {
                Partition::Any => 0,
                Partition::Partition(index) => index,
            };
            tokio::task::spawn_blocking(move || consumer.fetch_watermarks(&name, index, timeout))
                .await
                .map_err(|e| TopicError::broker(format!("watermarks join error: {e}")))?
                .map_err(|e| TopicError::broker(format!("fetch watermarks of '{topic}': {e}")))
        })
    }

    fn position(&self, topic: &TopicName, partition: Partition) -> Result<Offset, TopicError> {
        self.ensure_live()?;
        if self.owns(topic, partition) {
            Ok(Offset::from_raw(self.position.load(Ordering::Acquire)))
        } else {
            Ok(Offset::Unset)
        }
    }

    fn dispose(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            let topic = self.definition.name().clone();
            self.token.cancel();

            // Pending reads leave on cancellation and release the relay.
            self.relay.lock().await.close();
            lock(&self.relay_tx, "kafka reader relay").take();

            let worker = lock(&self.worker, "kafka reader worker").take();
            if let Some(worker) = worker {
                match tokio::task::spawn_blocking(move || worker.join()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => tracing::error!(topic = %topic, "consume loop panicked"),
                    Err(e) => tracing::warn!(topic = %topic, error = %e, "consume loop join failed"),
                }
            }

            lock(&self.consumer, "kafka reader consumer").take();
            tracing::info!(topic = %topic, "disposed kafka reader");
        })
    }
}

impl<K, V> Drop for KafkaTopicReader<K, V> {
    fn drop(&mut self) {
        // The loop notices within one poll timeout; it is not joined here.
        self.token.cancel();
    }
}

// ---------------------------------------------------------------------------
// Consume loop
// ---------------------------------------------------------------------------

struct LoopContext {
    topic: TopicName,
    consumer: Arc<BaseConsumer>,
    tx: mpsc::Sender<RelayedRecord>,
    failure: Arc<OnceLock<TopicError>>,
    token: CancellationToken,
    poll_timeout: Duration,
}

fn consume_loop(ctx: LoopContext) {
    let LoopContext {
        topic,
        consumer,
        tx,
        failure,
        token,
        poll_timeout,
    } = ctx;
    tracing::info!(topic = %topic, "consume loop started");

    while !token.is_cancelled() {
        let record = match consumer.poll(poll_timeout) {
            None => continue,
            Some(Ok(message)) => RelayedRecord::from_message(&message),
            Some(Err(e)) => match classify(e) {
                LoopError::Record(e) => {
                    tracing::warn!(topic = %topic, error = %e, "consume error, skipping");
                    continue;
                }
                LoopError::EndOfPartition(partition) => {
                    let _ = failure.set(TopicError::NotImplemented(format!(
                        "end of partition {partition} of '{topic}' reached; \
                         no end-of-partition policy is defined"
                    )));
                    tracing::error!(topic = %topic, partition, "partition EOF, stopping consume loop");
                    break;
                }
                LoopError::Fatal(e) => {
                    tracing::error!(topic = %topic, error = %e, "fatal consume error, stopping consume loop");
                    let _ = failure.set(TopicError::broker(format!("consume '{topic}': {e}")));
                    break;
                }
            },
        };

        // Blocks while the relay slot is full.
        if tx.blocking_send(record).is_err() {
            break;
        }
    }

    // Dropping the sender closes the relay for every reader.
    drop(tx);
    tracing::info!(topic = %topic, "consume loop stopped");
}

