use topic_client::{ClientError, TopicError};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("{0}")]
    Topic(#[from] TopicError),

    #[error("{0}")]
    Mismatch(String),
}
