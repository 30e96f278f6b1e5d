use std::time::Duration;

use clap::{Args, ValueEnum};

use topic_client::{Backend, ConnectionConfig, MissingTopicBehavior};

use super::error::ProbeError;

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BackendArg {
    Memory,
    Kafka,
}

#[derive(Args, Clone, Debug)]
pub struct ProbeArgs {
    /// Path to the connection config (TOML)
    #[arg(long, default_value = "topic-probe.toml", env = "TOPIC_PROBE_CONFIG")]
    pub config: String,

    /// Overrides `backend` from the config
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Overrides `bootstrap_servers` from the config
    #[arg(long, env = "TOPIC_PROBE_BOOTSTRAP_SERVERS")]
    pub bootstrap_servers: Option<String>,

    #[arg(long, default_value = "topic-probe")]
    pub topic: String,

    /// Records to write and read back
    #[arg(long, default_value_t = 10)]
    pub count: usize,

    /// Create the topic when missing, assuming this many brokers
    #[arg(long)]
    pub create_with_brokers: Option<i32>,

    /// Per-record read timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub read_timeout_ms: u64,
}

/// Config file merged with CLI overrides: file < env/CLI.
pub struct Effective {
    pub connection: ConnectionConfig,
    pub topic: String,
    pub count: usize,
    pub missing_topic: MissingTopicBehavior,
    pub read_timeout: Duration,
}

impl Effective {
    pub fn new(args: &ProbeArgs) -> Result<Self, ProbeError> {
        let mut connection = match ConnectionConfig::load(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e.into());
                }
                ConnectionConfig::default()
            }
        };

        if let Some(backend) = args.backend {
            connection.backend = match backend {
                BackendArg::Memory => Backend::Memory,
                BackendArg::Kafka => Backend::Kafka,
            };
        }
        if let Some(servers) = &args.bootstrap_servers {
            connection.bootstrap_servers = servers.clone();
        }

        let missing_topic = match args.create_with_brokers {
            Some(min_brokers) => MissingTopicBehavior::AutoCreate { min_brokers },
            None => MissingTopicBehavior::FailIfNotExists,
        };

        Ok(Self {
            connection,
            topic: args.topic.clone(),
            count: args.count,
            missing_topic,
            read_timeout: Duration::from_millis(args.read_timeout_ms),
        })
    }
}
