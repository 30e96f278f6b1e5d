use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use uuid::Uuid;

use topic_client::codec::{IdCodec, Int32Codec, StringCodec};
use topic_client::{
    Backend, Connection, ConnectionConfig, KafkaSettings, MissingTopicBehavior, Offset, Partition,
    TopicDefinition, TopicError, TopicName, TopicPosition, TopicResult,
};

fn orders() -> Arc<TopicDefinition<Uuid, i32>> {
    Arc::new(TopicDefinition::event("orders", IdCodec, Int32Codec))
}

#[tokio::test]
async fn test_orders_round_trip() {
    let conn = Connection::memory();
    let def = orders();
    let (id1, id2) = (Uuid::new_v4(), Uuid::new_v4());

    let writer = conn
        .open_writer(&def, Some(MissingTopicBehavior::AutoCreate { min_brokers: 1 }))
        .await
        .unwrap();
    let first = writer.write(id1, 10).await.unwrap();
    let second = writer.write(id2, 20).await.unwrap();

    let reader = conn.open_reader(&def, None).unwrap();
    let expected = |key: Uuid, value: i32, offset: i64| TopicResult {
        key,
        value,
        position: TopicPosition::new(
            TopicName::from("orders"),
            Partition::Partition(0),
            Offset::Offset(offset),
        ),
    };
    assert_eq!(reader.read().await.unwrap(), expected(id1, 10, 0));
    assert_eq!(reader.read().await.unwrap(), expected(id2, 20, 1));
    assert_eq!(first, expected(id1, 10, 0));
    assert_eq!(second, expected(id2, 20, 1));

    assert_eq!(
        reader
            .query_watermark_offsets(def.name(), Partition::ZERO, Duration::from_secs(1))
            .await
            .unwrap(),
        (0, 2)
    );

    reader.dispose().await;
    writer.dispose().await;
}

#[tokio::test]
async fn test_reader_opened_at_offset() {
    let conn = Connection::memory();
    let def = Arc::new(TopicDefinition::event("names", StringCodec, Int32Codec));
    conn.load(&def, (0..5).map(|i| (format!("k{i}"), i))).unwrap();

    let reader = conn.open_reader(&def, Some(Offset::Offset(3))).unwrap();
    let next = reader.read().await.unwrap();
    assert_eq!(next.key, "k3");
    assert_eq!(next.position.offset, Offset::Offset(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_load_wakes_waiting_reader() {
    let conn = Connection::memory();
    let def = orders();
    let reader = conn.open_reader(&def, None).unwrap();

    let pending = tokio::spawn(async move { reader.read().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let id = Uuid::new_v4();
    let first = conn.load(&def, [(id, 7), (Uuid::new_v4(), 8)]).unwrap();
    assert_eq!(first, 0);

    let got = timeout(Duration::from_secs(1), pending).await.unwrap().unwrap().unwrap();
    assert_eq!((got.key, got.value), (id, 7));
}

#[tokio::test]
async fn test_separate_connections_do_not_share_topics() {
    let def = orders();
    let a = Connection::memory();
    let b = Connection::memory();
    a.load(&def, [(Uuid::new_v4(), 1)]).unwrap();

    assert_eq!(a.topics(), vec![TopicName::from("orders")]);
    assert!(b.topics().is_empty());

    // Clones share the registry.
    let c = a.clone();
    let reader = c.open_reader(&def, None).unwrap();
    assert_eq!(reader.read().await.unwrap().value, 1);
}

#[test]
fn test_load_on_kafka_is_invalid() {
    let conn = Connection::kafka("127.0.0.1:1", Default::default());
    let err = conn.load(&orders(), [(Uuid::new_v4(), 1)]).unwrap_err();
    assert!(matches!(err, TopicError::InvalidOperation(_)), "{err:?}");
}

#[test]
fn test_bootstrap_servers() {
    let mut conn = Connection::from_config(&ConnectionConfig::default());
    assert_eq!(conn.backend(), Backend::Memory);
    assert_eq!(conn.bootstrap_servers(), "localhost:9092");

    conn.set_bootstrap_servers("kafka-1:9092,kafka-2:9092");
    assert_eq!(conn.bootstrap_servers(), "kafka-1:9092,kafka-2:9092");
}

#[test]
fn test_from_kafka_config() {
    let config = ConnectionConfig::parse(
        r#"
        backend = "kafka"
        bootstrap_servers = "kafka-1:9092"
        "#,
    )
    .unwrap();
    let conn = Connection::from_config(&config);
    assert_eq!(conn.backend(), Backend::Kafka);
    assert_eq!(conn.bootstrap_servers(), "kafka-1:9092");
    assert!(conn.topics().is_empty());
}

#[tokio::test]
async fn test_kafka_reader_is_started_on_open() {
    let settings = KafkaSettings {
        poll_timeout_ms: 20,
        ..Default::default()
    };
    let conn = Connection::kafka("127.0.0.1:1", settings);
    let def = orders();
    let reader = conn.open_reader(&def, Some(Offset::Offset(5))).unwrap();
    assert_eq!(reader.position(def.name(), Partition::ZERO).unwrap(), Offset::Offset(5));
    timeout(Duration::from_secs(5), reader.dispose()).await.unwrap();
}
