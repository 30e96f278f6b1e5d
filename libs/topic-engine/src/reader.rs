use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use topic_api::{
    Offset, Partition, TopicDefinition, TopicError, TopicName, TopicPosition, TopicReader,
    TopicResult,
};

use crate::data::TopicData;
use crate::registry::TopicRegistry;

/// Reader over a simulated topic.
///
/// Holds its own cursor into the shared log. `read` waits on the log's
/// append notification and re-checks the cursor after every wake, since one
/// notification fans out to all waiters regardless of the offset they need.
pub struct MemoryTopicReader<K, V> {
    definition: Arc<TopicDefinition<K, V>>,
    data: Arc<TopicData>,
    registry: Arc<TopicRegistry>,
    /// Serializes concurrent `read` calls on this reader.
    cursor: tokio::sync::Mutex<i64>,
    /// Mirror of `cursor` for `position`, which must not wait.
    position: AtomicI64,
    disposed: AtomicBool,
    token: CancellationToken,
}

impl<K, V> MemoryTopicReader<K, V> {
    pub fn new(
        definition: Arc<TopicDefinition<K, V>>,
        registry: Arc<TopicRegistry>,
        start: Offset,
    ) -> Self {
        let data = registry.get_or_create(definition.name());
        let cursor = resolve_start(start, &data);
        tracing::debug!(topic = %definition.name(), %start, cursor, "opened simulated reader");
        Self {
            definition,
            data,
            registry,
            cursor: tokio::sync::Mutex::new(cursor),
            position: AtomicI64::new(cursor),
            disposed: AtomicBool::new(false),
            token: CancellationToken::new(),
        }
    }

    fn ensure_live(&self) -> Result<(), TopicError> {
        if self.disposed.load(Ordering::Acquire) {
            Err(TopicError::disposed("reader"))
        } else {
            Ok(())
        }
    }

    fn owns(&self, topic: &TopicName, partition: Partition) -> bool {
        topic == self.definition.name() && matches!(partition, Partition::Any | Partition::ZERO)
    }
}

/// Concrete cursor for a start position. The simulation has no committed
/// offsets, so `Stored` and `Unset` start from the beginning like `Beginning`.
fn resolve_start(start: Offset, data: &TopicData) -> i64 {
    match start {
        Offset::Offset(n) => n.max(0),
        Offset::End => data.count(),
        Offset::Beginning | Offset::Stored | Offset::Unset => 0,
    }
}

impl<K, V> TopicReader<K, V> for MemoryTopicReader<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    fn read(&self) -> Pin<Box<dyn Future<Output = Result<TopicResult<K, V>, TopicError>> + Send + '_>> {
        Box::pin(async move {
            self.ensure_live()?;
            let mut cursor = self.cursor.lock().await;
            self.ensure_live()?;

            loop {
                if let Some(record) = self.data.get(*cursor) {
                    let offset = *cursor;
                    // A record that fails to decode is still consumed.
                    *cursor += 1;
                    self.position.store(*cursor, Ordering::Release);
                    let (key, value) = self
                        .definition
                        .decode(record.key.as_deref(), record.value.as_deref())?;
                    return Ok(TopicResult {
                        key,
                        value,
                        position: TopicPosition::new(
                            self.definition.name().clone(),
                            Partition::ZERO,
                            Offset::Offset(offset),
                        ),
                    });
                }

                let appended = self.data.appended();
                tokio::pin!(appended);
                appended.as_mut().enable();

                // An append between the miss above and the registration would
                // otherwise go unnoticed until the next one.
                if self.data.count() > *cursor {
                    continue;
                }

                tokio::select! {
                    _ = &mut appended => {}
                    _ = self.token.cancelled() => return Err(TopicError::disposed("reader")),
                }
            }
        })
    }

    fn query_watermark_offsets<'a>(
        &'a self,
        topic: &'a TopicName,
        partition: Partition,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(i64, i64), TopicError>> + Send + 'a>> {
        Box::pin(async move {
            self.ensure_live()?;
            if !matches!(partition, Partition::Any | Partition::ZERO) {
                return Ok((0, 0));
            }
            // The head is never trimmed.
            Ok((0, self.registry.get_or_create(topic).count()))
        })
    }

    fn position(&self, topic: &TopicName, partition: Partition) -> Result<Offset, TopicError> {
        self.ensure_live()?;
        if self.owns(topic, partition) {
            Ok(Offset::Offset(self.position.load(Ordering::Acquire)))
        } else {
            Ok(Offset::Unset)
        }
    }

    fn dispose(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            self.token.cancel();
            tracing::debug!(topic = %self.definition.name(), "disposed simulated reader");
        })
    }
}

impl<K, V> Drop for MemoryTopicReader<K, V> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
