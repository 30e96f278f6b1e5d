use std::collections::BTreeMap;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use serde::Deserialize;

fn default_poll_timeout_ms() -> u64 {
    100
}

fn default_message_timeout_ms() -> u64 {
    30_000
}

fn default_operation_timeout_ms() -> u64 {
    30_000
}

/// Kafka client tuning, shared by readers, writers and the admin client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KafkaSettings {
    /// Consumer group of readers. A unique group per reader when unset.
    #[serde(default)]
    pub group_id: Option<String>,

    /// How long one blocking `poll` in the consume loop may wait.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Producer delivery timeout (`message.timeout.ms`).
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,

    /// Admin operation timeout (topic creation, metadata).
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// Report partition EOF to the consume loop. The loop has no policy
    /// for it yet and stops with `NotImplemented`.
    #[serde(default)]
    pub enable_partition_eof: bool,

    /// Extra librdkafka properties (security, tuning), applied last.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Default for KafkaSettings {
    fn default() -> Self {
        Self {
            group_id: None,
            poll_timeout_ms: default_poll_timeout_ms(),
            message_timeout_ms: default_message_timeout_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
            enable_partition_eof: false,
            properties: BTreeMap::new(),
        }
    }
}

impl KafkaSettings {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Admin client config: bootstrap servers plus passthrough properties.
    pub fn client_config(&self, bootstrap_servers: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", bootstrap_servers);
        self.apply_properties(&mut config);
        config
    }

    pub fn producer_config(&self, bootstrap_servers: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", self.message_timeout_ms.to_string())
            .set("acks", "all");
        self.apply_properties(&mut config);
        config
    }

    /// Consumer config for a manually assigned reader. Offsets are never
    /// committed; the reader tracks its own cursor.
    pub fn consumer_config(&self, bootstrap_servers: &str, topic: &str) -> ClientConfig {
        let group_id = self
            .group_id
            .clone()
            .unwrap_or_else(|| format!("{topic}-reader-{}", uuid::Uuid::new_v4()));
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", bootstrap_servers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", self.enable_partition_eof.to_string());
        self.apply_properties(&mut config);
        config
    }

    fn apply_properties(&self, config: &mut ClientConfig) {
        for (key, value) in &self.properties {
            config.set(key, value);
        }
    }
}
