use rdkafka::error::{KafkaError, RDKafkaErrorCode};

/// How the consume loop reacts to an error returned by `poll`.
#[derive(Debug)]
pub enum LoopError {
    /// Affects one record; log it and keep consuming.
    Record(KafkaError),
    /// The consumer reached the end of a partition.
    EndOfPartition(i32),
    /// The subscription is unusable; close the relay with this error.
    Fatal(KafkaError),
}

pub fn classify(err: KafkaError) -> LoopError {
    if let KafkaError::PartitionEOF(partition) = err {
        return LoopError::EndOfPartition(partition);
    }
    if is_fatal_code(err.rdkafka_error_code()) {
        LoopError::Fatal(err)
    } else {
        LoopError::Record(err)
    }
}

fn is_fatal_code(code: Option<RDKafkaErrorCode>) -> bool {
    matches!(
        code,
        Some(
            RDKafkaErrorCode::AllBrokersDown
                | RDKafkaErrorCode::Fatal
                | RDKafkaErrorCode::Authentication
                | RDKafkaErrorCode::SaslAuthenticationFailed
                | RDKafkaErrorCode::TopicAuthorizationFailed
        )
    )
}
