use std::fmt;

use crate::error::TopicError;

// ---------------------------------------------------------------------------
// Native sentinels (librdkafka numbering)
// ---------------------------------------------------------------------------

/// `RD_KAFKA_PARTITION_UA`.
pub const RAW_PARTITION_ANY: i32 = -1;
/// `RD_KAFKA_OFFSET_BEGINNING`.
pub const RAW_OFFSET_BEGINNING: i64 = -2;
/// `RD_KAFKA_OFFSET_END`.
pub const RAW_OFFSET_END: i64 = -1;
/// `RD_KAFKA_OFFSET_STORED`.
pub const RAW_OFFSET_STORED: i64 = -1000;
/// `RD_KAFKA_OFFSET_INVALID`.
pub const RAW_OFFSET_INVALID: i64 = -1001;

/// Globally unique name of a logical topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicName(String);

impl TopicName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TopicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TopicName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TopicName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Partition of a topic: either unassigned or an explicit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Let the broker choose.
    Any,
    Partition(i32),
}

impl Partition {
    /// The only partition modelled end-to-end.
    pub const ZERO: Partition = Partition::Partition(0);

    pub fn to_raw(self) -> i32 {
        match self {
            Partition::Any => RAW_PARTITION_ANY,
            Partition::Partition(index) => index,
        }
    }

    pub fn from_raw(raw: i32) -> Self {
        if raw < 0 {
            Partition::Any
        } else {
            Partition::Partition(raw)
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Any => f.write_str("any"),
            Partition::Partition(index) => write!(f, "{index}"),
        }
    }
}

/// Position of a record inside a partition.
///
/// The four symbolic variants are placeholders that the backend resolves;
/// only `Offset(n)` (with `n >= 0`) names a concrete record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Offset {
    Beginning,
    End,
    Stored,
    Unset,
    Offset(i64),
}

impl Offset {
    /// Numeric value of a concrete offset.
    pub fn value(self) -> Result<i64, TopicError> {
        match self {
            Offset::Offset(n) => Ok(n),
            symbolic => Err(TopicError::invalid_operation(format!(
                "offset {symbolic} is symbolic and has no numeric value"
            ))),
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            Offset::Beginning => RAW_OFFSET_BEGINNING,
            Offset::End => RAW_OFFSET_END,
            Offset::Stored => RAW_OFFSET_STORED,
            Offset::Unset => RAW_OFFSET_INVALID,
            Offset::Offset(n) => n,
        }
    }

    pub fn from_raw(raw: i64) -> Self {
        match raw {
            n if n >= 0 => Offset::Offset(n),
            RAW_OFFSET_BEGINNING => Offset::Beginning,
            RAW_OFFSET_END => Offset::End,
            RAW_OFFSET_STORED => Offset::Stored,
            _ => Offset::Unset,
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Beginning => f.write_str("beginning"),
            Offset::End => f.write_str("end"),
            Offset::Stored => f.write_str("stored"),
            Offset::Unset => f.write_str("unset"),
            Offset::Offset(n) => write!(f, "{n}"),
        }
    }
}

/// `(topic, partition, offset)` of a read or acknowledged write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPosition {
    pub topic: TopicName,
    pub partition: Partition,
    pub offset: Offset,
}

impl TopicPosition {
    pub fn new(topic: TopicName, partition: Partition, offset: Offset) -> Self {
        Self {
            topic,
            partition,
            offset,
        }
    }
}

impl fmt::Display for TopicPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.topic, self.partition, self.offset)
    }
}
