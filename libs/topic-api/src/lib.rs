pub mod client;
pub mod codec;
pub mod definition;
pub mod error;
pub mod position;
pub mod provision;

pub use client::{TopicReader, TopicResult, TopicWriter};
pub use codec::{Codec, CodecError};
pub use definition::{TopicDefinition, TopicKind};
pub use error::{RecordPart, TopicError};
pub use position::{Offset, Partition, TopicName, TopicPosition};
pub use provision::{MissingTopicBehavior, ProvisionOutcome, TopicAdmin, TopicSpec};
