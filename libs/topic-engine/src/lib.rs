//! In-process broker simulation.
//!
//! Every topic is a single-partition append-only log (`TopicData`) held in a
//! connection-scoped `TopicRegistry`. Readers block on an append
//! notification instead of polling.

mod data;
mod reader;
mod registry;
mod writer;

pub use data::{RawRecord, TopicData};
pub use reader::MemoryTopicReader;
pub use registry::TopicRegistry;
pub use writer::MemoryTopicWriter;
