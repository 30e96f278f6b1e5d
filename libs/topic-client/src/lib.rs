pub mod config;
pub mod error;
mod connection;

pub use config::{Backend, ConnectionConfig};
pub use connection::Connection;
pub use error::ClientError;
pub use topic_kafka::KafkaSettings;

pub use topic_api::{
    MissingTopicBehavior, Offset, Partition, TopicDefinition, TopicError, TopicKind, TopicName,
    TopicPosition, TopicReader, TopicResult, TopicWriter, codec,
};
