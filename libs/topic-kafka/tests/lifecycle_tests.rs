//! Lifecycle tests for the Kafka binding that need no running broker.
//!
//! librdkafka creates clients and assignments without connecting, so
//! start/dispose semantics can be exercised against an unreachable address.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use topic_api::codec::{Int32Codec, StringCodec};
use topic_api::{Offset, Partition, TopicDefinition, TopicError, TopicReader, TopicWriter};
use topic_kafka::{KafkaSettings, KafkaTopicReader, KafkaTopicWriter};

const UNREACHABLE: &str = "127.0.0.1:1";

fn settings() -> KafkaSettings {
    KafkaSettings {
        poll_timeout_ms: 20,
        message_timeout_ms: 500,
        ..Default::default()
    }
}

fn definition() -> Arc<TopicDefinition<String, i32>> {
    Arc::new(TopicDefinition::event("orders", StringCodec, Int32Codec))
}

#[tokio::test]
async fn test_start_twice_is_invalid() {
    let reader = KafkaTopicReader::new(definition(), UNREACHABLE, &settings(), Offset::Beginning)
        .unwrap();

    reader.start().unwrap();
    let err = reader.start().unwrap_err();
    assert!(matches!(err, TopicError::InvalidOperation(_)), "{err:?}");

    timeout(Duration::from_secs(5), reader.dispose())
        .await
        .expect("dispose did not join the consume loop");
}

#[tokio::test]
async fn test_read_before_start_is_invalid() {
    let reader = KafkaTopicReader::new(definition(), UNREACHABLE, &settings(), Offset::Beginning)
        .unwrap();
    let err = reader.read().await.unwrap_err();
    assert!(matches!(err, TopicError::InvalidOperation(_)), "{err:?}");
}

#[tokio::test]
async fn test_position_reports_start_until_first_read() {
    let def = definition();
    let reader =
        KafkaTopicReader::new(def.clone(), UNREACHABLE, &settings(), Offset::Offset(42)).unwrap();
    assert_eq!(reader.position(def.name(), Partition::ZERO).unwrap(), Offset::Offset(42));

    let reader =
        KafkaTopicReader::new(def.clone(), UNREACHABLE, &settings(), Offset::Beginning).unwrap();
    assert_eq!(reader.position(def.name(), Partition::ZERO).unwrap(), Offset::Beginning);
    assert_eq!(
        reader.position(&"payments".into(), Partition::ZERO).unwrap(),
        Offset::Unset
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispose_wakes_pending_read_and_is_idempotent() {
    let def = definition();
    let reader = Arc::new(
        KafkaTopicReader::new(def.clone(), UNREACHABLE, &settings(), Offset::Beginning).unwrap(),
    );
    reader.start().unwrap();

    let pending = tokio::spawn({
        let reader = reader.clone();
        async move { reader.read().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    timeout(Duration::from_secs(5), reader.dispose()).await.unwrap();
    reader.dispose().await;

    let err = timeout(Duration::from_secs(5), pending).await.unwrap().unwrap().unwrap_err();
    assert!(err.is_disposed() || matches!(err, TopicError::Broker(_)), "{err:?}");

    assert!(reader.read().await.unwrap_err().is_disposed());
    assert!(reader.position(def.name(), Partition::ZERO).unwrap_err().is_disposed());
    assert!(reader.start().unwrap_err().is_disposed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fatal_loop_error_reaches_every_read() {
    let def = definition();
    let reader = Arc::new(
        KafkaTopicReader::new(def.clone(), UNREACHABLE, &settings(), Offset::Beginning).unwrap(),
    );
    reader.start().unwrap();

    // Nothing listens on the address, so the consume loop stops on AllBrokersDown.
    let pending = tokio::spawn({
        let reader = reader.clone();
        async move { reader.read().await }
    });
    let first = timeout(Duration::from_secs(30), pending)
        .await
        .expect("consume loop never failed")
        .unwrap()
        .unwrap_err();
    let second = timeout(Duration::from_secs(5), reader.read())
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(first, TopicError::Broker(_)), "{first:?}");
    assert!(first.to_string().contains("consume 'orders'"), "{first}");
    assert_eq!(first.to_string(), second.to_string());

    timeout(Duration::from_secs(5), reader.dispose()).await.unwrap();
    assert!(reader.read().await.unwrap_err().is_disposed());
}

#[tokio::test]
async fn test_disposed_writer_rejects_writes() {
    let writer = KafkaTopicWriter::new(definition(), UNREACHABLE, &settings()).unwrap();

    timeout(Duration::from_secs(5), writer.dispose()).await.unwrap();
    writer.dispose().await;

    let err = writer.write("k".to_string(), 1).await.unwrap_err();
    assert!(err.is_disposed());
}

#[test]
fn test_settings_parse_from_toml() {
    let settings: KafkaSettings = toml::from_str(
        r#"
        group_id = "billing"
        poll_timeout_ms = 250

        [properties]
        "security.protocol" = "SASL_SSL"
        "#,
    )
    .unwrap();
    assert_eq!(settings.group_id.as_deref(), Some("billing"));
    assert_eq!(settings.poll_timeout(), Duration::from_millis(250));
    assert_eq!(settings.message_timeout_ms, 30_000);
    assert_eq!(
        settings.properties.get("security.protocol").map(String::as_str),
        Some("SASL_SSL")
    );
}
