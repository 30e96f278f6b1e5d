//! Kafka binding of the topic client, on top of `rdkafka`.
//!
//! Writers produce one record at a time and await delivery. Readers run a
//! dedicated consume thread that hands records to `read` through a
//! single-slot relay queue.

mod admin;
mod error;
mod native;
mod reader;
mod settings;
mod writer;

use std::sync::{Mutex, MutexGuard};

pub use admin::KafkaAdmin;
pub use error::{LoopError, classify};
pub use native::{offset_from_native, offset_to_native};
pub use reader::KafkaTopicReader;
pub use settings::KafkaSettings;
pub use writer::KafkaTopicWriter;

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!(%what, "lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
