use std::fmt;
use std::sync::Arc;

use crate::codec::Codec;
use crate::error::{RecordPart, TopicError};
use crate::position::TopicName;

/// Lifetime class of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    /// Ephemeral, typically consumed once.
    Event,
    /// Long-lived source of truth.
    State,
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicKind::Event => f.write_str("event"),
            TopicKind::State => f.write_str("state"),
        }
    }
}

/// Immutable description of a topic: its kind, name and the codecs for
/// keys and values. Built once at startup and shared by every reader and
/// writer of the topic.
pub struct TopicDefinition<K, V> {
    kind: TopicKind,
    name: TopicName,
    key_codec: Arc<dyn Codec<K>>,
    value_codec: Arc<dyn Codec<V>>,
}

impl<K, V> fmt::Debug for TopicDefinition<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicDefinition")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

impl<K, V> TopicDefinition<K, V> {
    pub fn new(
        kind: TopicKind,
        name: impl Into<TopicName>,
        key_codec: impl Codec<K> + 'static,
        value_codec: impl Codec<V> + 'static,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            key_codec: Arc::new(key_codec),
            value_codec: Arc::new(value_codec),
        }
    }

    pub fn event(
        name: impl Into<TopicName>,
        key_codec: impl Codec<K> + 'static,
        value_codec: impl Codec<V> + 'static,
    ) -> Self {
        Self::new(TopicKind::Event, name, key_codec, value_codec)
    }

    pub fn state(
        name: impl Into<TopicName>,
        key_codec: impl Codec<K> + 'static,
        value_codec: impl Codec<V> + 'static,
    ) -> Self {
        Self::new(TopicKind::State, name, key_codec, value_codec)
    }

    pub fn kind(&self) -> TopicKind {
        self.kind
    }

    pub fn name(&self) -> &TopicName {
        &self.name
    }

    pub fn encode_key(&self, key: &K) -> Result<Option<Vec<u8>>, TopicError> {
        self.key_codec
            .encode(key)
            .map_err(|source| self.encode_error(RecordPart::Key, source))
    }

    pub fn encode_value(&self, value: &V) -> Result<Option<Vec<u8>>, TopicError> {
        self.value_codec
            .encode(value)
            .map_err(|source| self.encode_error(RecordPart::Value, source))
    }

    /// Decode a raw `(key, value)` pair; `None` means the half is absent.
    pub fn decode(&self, key: Option<&[u8]>, value: Option<&[u8]>) -> Result<(K, V), TopicError> {
        let key = self
            .key_codec
            .decode(key.unwrap_or_default(), key.is_none())
            .map_err(|source| self.decode_error(RecordPart::Key, source))?;
        let value = self
            .value_codec
            .decode(value.unwrap_or_default(), value.is_none())
            .map_err(|source| self.decode_error(RecordPart::Value, source))?;
        Ok((key, value))
    }

    fn encode_error(&self, part: RecordPart, source: crate::codec::CodecError) -> TopicError {
        TopicError::Encode {
            topic: self.name.to_string(),
            part,
            source,
        }
    }

    fn decode_error(&self, part: RecordPart, source: crate::codec::CodecError) -> TopicError {
        TopicError::Decode {
            topic: self.name.to_string(),
            part,
            source,
        }
    }
}
