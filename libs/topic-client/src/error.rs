#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("{0}")]
    Topic(#[from] topic_api::TopicError),
}
