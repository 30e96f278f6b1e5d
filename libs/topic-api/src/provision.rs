use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::definition::TopicKind;
use crate::error::TopicError;
use crate::position::TopicName;

/// Upper bound on the replication factor of provisioned topics.
pub const MAX_REPLICATION_FACTOR: i32 = 3;

/// `retention.ms` value meaning "keep forever".
pub const INFINITE_RETENTION_MS: i64 = -1;

/// What to do when a writer targets a topic that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTopicBehavior {
    /// Create the topic, sizing replication for this many brokers.
    AutoCreate { min_brokers: i32 },
    /// Do nothing; the broker reports the failure on first use.
    #[default]
    FailIfNotExists,
}

/// Physical parameters of a topic to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: TopicName,
    pub kind: TopicKind,
    pub partitions: i32,
    pub replication_factor: i32,
    pub min_insync_replicas: i32,
    pub retention_ms: i64,
}

impl TopicSpec {
    /// Compute the spec of a topic for a cluster of `available_brokers`.
    ///
    /// Event and State topics currently provision identically: one
    /// partition, infinite retention.
    pub fn for_kind(name: TopicName, kind: TopicKind, available_brokers: i32) -> Self {
        let replication_factor = available_brokers.clamp(1, MAX_REPLICATION_FACTOR);
        let (partitions, retention_ms) = match kind {
            TopicKind::Event => (1, INFINITE_RETENTION_MS),
            TopicKind::State => (1, INFINITE_RETENTION_MS),
        };
        Self {
            name,
            kind,
            partitions,
            replication_factor,
            min_insync_replicas: replication_factor / 2 + 1,
            retention_ms,
        }
    }

    /// Topic-level broker configuration entries.
    pub fn configs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("retention.ms", self.retention_ms.to_string()),
            ("min.insync.replicas", self.min_insync_replicas.to_string()),
        ]
    }
}

/// Result of `ensure_topic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The topic was already listed (or a concurrent creator won the race).
    Existing,
    /// This call created the topic.
    Created,
    /// No check was made (`FailIfNotExists`).
    Skipped,
}

/// Broker administration needed for provisioning.
pub trait TopicAdmin: Send + Sync {
    /// Names of every topic in the cluster.
    fn list_topics(
        &self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, TopicError>> + Send + '_>>;

    /// Create a topic and wait for the acknowledgment. Returns
    /// `ProvisionOutcome::Existing` when the broker reports it already exists.
    fn create_topic<'a>(
        &'a self,
        spec: &'a TopicSpec,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<ProvisionOutcome, TopicError>> + Send + 'a>>;
}

/// Make sure `name` exists according to `behavior`.
///
/// Existence is decided from the full topic listing. Asking the broker for
/// the metadata of one named topic can itself auto-create that topic on
/// clusters with `auto.create.topics.enable`, so it is never used here.
pub async fn ensure_topic(
    admin: &dyn TopicAdmin,
    name: &TopicName,
    kind: TopicKind,
    behavior: MissingTopicBehavior,
    timeout: Duration,
) -> Result<ProvisionOutcome, TopicError> {
    let min_brokers = match behavior {
        MissingTopicBehavior::FailIfNotExists => return Ok(ProvisionOutcome::Skipped),
        MissingTopicBehavior::AutoCreate { min_brokers } => min_brokers,
    };

    let topics = admin
        .list_topics(timeout)
        .await
        .map_err(|e| e.with_context(format!("list topics for '{name}'")))?;
    if topics.iter().any(|t| t == name.as_str()) {
        tracing::debug!(topic = %name, "topic exists");
        return Ok(ProvisionOutcome::Existing);
    }

    let spec = TopicSpec::for_kind(name.clone(), kind, min_brokers);
    let outcome = admin
        .create_topic(&spec, timeout)
        .await
        .map_err(|e| e.with_context(format!("create topic '{name}'")))?;
    tracing::info!(
        topic = %name,
        %kind,
        replication = spec.replication_factor,
        min_isr = spec.min_insync_replicas,
        ?outcome,
        "provisioned topic"
    );
    Ok(outcome)
}
