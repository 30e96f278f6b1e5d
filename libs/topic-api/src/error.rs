use std::fmt;

use crate::codec::CodecError;

/// Which half of a record a codec failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPart {
    Key,
    Value,
}

impl fmt::Display for RecordPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordPart::Key => f.write_str("key"),
            RecordPart::Value => f.write_str("value"),
        }
    }
}

/// Error returned by every reader, writer and connection operation.
///
/// `Clone` so a consume loop can hand the same fatal error to every
/// pending and future `read`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TopicError {
    #[error("{resource} has been disposed")]
    Disposed { resource: &'static str },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("decode {part} of topic '{topic}': {source}")]
    Decode {
        topic: String,
        part: RecordPart,
        source: CodecError,
    },

    #[error("encode {part} for topic '{topic}': {source}")]
    Encode {
        topic: String,
        part: RecordPart,
        source: CodecError,
    },

    #[error("broker: {0}")]
    Broker(String),

    #[error("config: {0}")]
    Config(String),
}

impl TopicError {
    pub fn disposed(resource: &'static str) -> Self {
        TopicError::Disposed { resource }
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        TopicError::InvalidOperation(msg.into())
    }

    pub fn broker(msg: impl fmt::Display) -> Self {
        TopicError::Broker(msg.to_string())
    }

    /// Add context to the error.
    ///
    /// Message-carrying variants get the context prepended; structured
    /// variants are returned unchanged.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            TopicError::Broker(msg) => TopicError::Broker(format!("{ctx}: {msg}")),
            TopicError::Config(msg) => TopicError::Config(format!("{ctx}: {msg}")),
            TopicError::InvalidOperation(msg) => {
                TopicError::InvalidOperation(format!("{ctx}: {msg}"))
            }
            other => other,
        }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, TopicError::Disposed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_prepended_to_broker_errors() {
        let err = TopicError::broker("connection refused").with_context("topic 'orders'");
        assert_eq!(err.to_string(), "broker: topic 'orders': connection refused");
    }

    #[test]
    fn context_leaves_disposed_untouched() {
        let err = TopicError::disposed("reader").with_context("ignored");
        assert!(err.is_disposed());
        assert_eq!(err.to_string(), "reader has been disposed");
    }

    #[test]
    fn decode_error_names_topic_and_part() {
        let err = TopicError::Decode {
            topic: "orders".into(),
            part: RecordPart::Value,
            source: CodecError::new("expected 4 bytes, got 3"),
        };
        assert_eq!(
            err.to_string(),
            "decode value of topic 'orders': expected 4 bytes, got 3"
        );
    }
}
