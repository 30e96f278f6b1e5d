use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::TopicError;
use crate::position::{Offset, Partition, TopicName, TopicPosition};

/// Outcome of one read or one acknowledged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicResult<K, V> {
    pub key: K,
    pub value: V,
    pub position: TopicPosition,
}

/// Append records to one topic.
///
/// Implemented by the in-memory simulation and by the Kafka binding.
pub trait TopicWriter<K, V>: Send + Sync {
    /// Encode and append one record, wait for the acknowledgment and
    /// return where it landed.
    fn write(
        &self,
        key: K,
        value: V,
    ) -> Pin<Box<dyn Future<Output = Result<TopicResult<K, V>, TopicError>> + Send + '_>>;

    /// Release backend resources. Idempotent; afterwards every call fails
    /// with `TopicError::Disposed`.
    fn dispose(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Sequential cursor over one partition of a topic.
pub trait TopicReader<K, V>: Send + Sync {
    /// Next record after the cursor. Suspends until one is available.
    fn read(&self) -> Pin<Box<dyn Future<Output = Result<TopicResult<K, V>, TopicError>> + Send + '_>>;

    /// `(low, high)` watermarks of a partition.
    fn query_watermark_offsets<'a>(
        &'a self,
        topic: &'a TopicName,
        partition: Partition,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(i64, i64), TopicError>> + Send + 'a>>;

    /// The reader's own cursor: the offset the next `read` returns.
    fn position(&self, topic: &TopicName, partition: Partition) -> Result<Offset, TopicError>;

    /// Stop the reader. Idempotent; wakes pending reads with
    /// `TopicError::Disposed`.
    fn dispose(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
