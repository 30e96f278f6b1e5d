use serde::Deserialize;

use topic_kafka::KafkaSettings;

use crate::error::ClientError;

/// Which broker a connection talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process simulation.
    #[default]
    Memory,
    Kafka,
}

/// Connection configuration, parsed from TOML.
///
/// ```toml
/// backend = "kafka"
/// bootstrap_servers = "kafka-1:9092,kafka-2:9092"
///
/// [kafka]
/// group_id = "billing"
/// poll_timeout_ms = 100
///
/// [kafka.properties]
/// "security.protocol" = "SASL_SSL"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,

    #[serde(default)]
    pub kafka: KafkaSettings,
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".into()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            bootstrap_servers: default_bootstrap_servers(),
            kafka: KafkaSettings::default(),
        }
    }
}

impl ConnectionConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path).map_err(|e| ClientError::Config {
            context: "read",
            detail: format!("'{path}': {e}"),
        })?;
        Self::parse(&content).map_err(|e| match e {
            ClientError::Config { context, detail } => ClientError::Config {
                context,
                detail: format!("'{path}': {detail}"),
            },
            other => other,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ClientError> {
        toml::from_str(toml_str).map_err(|e| ClientError::Config {
            context: "parse",
            detail: e.to_string(),
        })
    }
}
