use std::sync::Arc;

use topic_api::provision::ensure_topic;
use topic_api::{
    MissingTopicBehavior, Offset, TopicDefinition, TopicError, TopicName, TopicReader, TopicWriter,
};
use topic_engine::{MemoryTopicReader, MemoryTopicWriter, RawRecord, TopicRegistry};
use topic_kafka::{KafkaAdmin, KafkaSettings, KafkaTopicReader, KafkaTopicWriter};

use crate::config::{Backend, ConnectionConfig};

enum Inner {
    Memory(Arc<TopicRegistry>),
    Kafka(KafkaSettings),
}

/// Entry point for opening readers and writers.
///
/// A memory connection owns its own topic registry: readers and writers
/// opened from the same connection (or its clones) share topics, separate
/// connections never do.
pub struct Connection {
    bootstrap_servers: String,
    inner: Inner,
}

impl Connection {
    /// In-process simulation with an empty registry.
    pub fn memory() -> Self {
        Self {
            bootstrap_servers: String::new(),
            inner: Inner::Memory(Arc::new(TopicRegistry::new())),
        }
    }

    pub fn kafka(bootstrap_servers: impl Into<String>, settings: KafkaSettings) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            inner: Inner::Kafka(settings),
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        match config.backend {
            Backend::Memory => {
                let mut conn = Self::memory();
                conn.bootstrap_servers = config.bootstrap_servers.clone();
                conn
            }
            Backend::Kafka => Self::kafka(config.bootstrap_servers.clone(), config.kafka.clone()),
        }
    }

    pub fn backend(&self) -> Backend {
        match self.inner {
            Inner::Memory(_) => Backend::Memory,
            Inner::Kafka(_) => Backend::Kafka,
        }
    }

    pub fn bootstrap_servers(&self) -> &str {
        &self.bootstrap_servers
    }

    /// Takes effect for readers and writers opened afterwards.
    pub fn set_bootstrap_servers(&mut self, servers: impl Into<String>) {
        self.bootstrap_servers = servers.into();
    }

    /// Names of the simulated topics; empty for Kafka.
    pub fn topics(&self) -> Vec<TopicName> {
        match &self.inner {
            Inner::Memory(registry) => registry.topic_names(),
            Inner::Kafka(_) => Vec::new(),
        }
    }

    /// Open a reader positioned at `start` (`Beginning` when `None`).
    /// Kafka readers have their consume loop running on return.
    pub fn open_reader<K, V>(
        &self,
        definition: &Arc<TopicDefinition<K, V>>,
        start: Option<Offset>,
    ) -> Result<Box<dyn TopicReader<K, V>>, TopicError>
    where
        K: Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        let start = start.unwrap_or(Offset::Beginning);
        match &self.inner {
            Inner::Memory(registry) => Ok(Box::new(MemoryTopicReader::new(
                definition.clone(),
                registry.clone(),
                start,
            ))),
            Inner::Kafka(settings) => {
                let reader = KafkaTopicReader::new(
                    definition.clone(),
                    &self.bootstrap_servers,
                    settings,
                    start,
                )?;
                reader.start()?;
                Ok(Box::new(reader))
            }
        }
    }

    /// Open a writer. On Kafka a missing topic is handled per `behavior`
    /// (`FailIfNotExists` when `None`); the simulation creates topics on
    /// first use.
    pub async fn open_writer<K, V>(
        &self,
        definition: &Arc<TopicDefinition<K, V>>,
        behavior: Option<MissingTopicBehavior>,
    ) -> Result<Box<dyn TopicWriter<K, V>>, TopicError>
    where
        K: Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        match &self.inner {
            Inner::Memory(registry) => {
                Ok(Box::new(MemoryTopicWriter::new(definition.clone(), registry)))
            }
            Inner::Kafka(settings) => {
                let behavior = behavior.unwrap_or_default();
                if behavior != MissingTopicBehavior::FailIfNotExists {
                    let admin = KafkaAdmin::new(&self.bootstrap_servers, settings)?;
                    let outcome = ensure_topic(
                        &admin,
                        definition.name(),
                        definition.kind(),
                        behavior,
                        settings.operation_timeout(),
                    )
                    .await?;
                    tracing::debug!(topic = %definition.name(), ?outcome, "topic provisioned");
                }
                Ok(Box::new(KafkaTopicWriter::new(
                    definition.clone(),
                    &self.bootstrap_servers,
                    settings,
                )?))
            }
        }
    }

    /// Append `records` to a simulated topic without going through a
    /// writer; readers waiting on the topic are woken once. Returns the
    /// offset of the first loaded record.
    pub fn load<K, V>(
        &self,
        definition: &TopicDefinition<K, V>,
        records: impl IntoIterator<Item = (K, V)>,
    ) -> Result<i64, TopicError> {
        let Inner::Memory(registry) = &self.inner else {
            return Err(TopicError::invalid_operation(format!(
                "load into '{}' is only supported by the in-memory backend",
                definition.name()
            )));
        };
        let raw = records
            .into_iter()
            .map(|(key, value)| {
                Ok(RawRecord::new(
                    definition.encode_key(&key)?,
                    definition.encode_value(&value)?,
                ))
            })
            .collect::<Result<Vec<_>, TopicError>>()?;
        Ok(registry.bulk_load(definition.name(), raw))
    }
}

impl Clone for Connection {
    /// Clones share the simulated registry.
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            Inner::Memory(registry) => Inner::Memory(registry.clone()),
            Inner::Kafka(settings) => Inner::Kafka(settings.clone()),
        };
        Self {
            bootstrap_servers: self.bootstrap_servers.clone(),
            inner,
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("backend", &self.backend())
            .field("bootstrap_servers", &self.bootstrap_servers)
            .finish()
    }
}
