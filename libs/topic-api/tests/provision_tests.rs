//! Tests for the create-if-missing decision in `ensure_topic`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use topic_api::provision::ensure_topic;
use topic_api::{MissingTopicBehavior, ProvisionOutcome, TopicAdmin, TopicError, TopicKind, TopicSpec};

const TIMEOUT: Duration = Duration::from_secs(1);

/// Admin double that records every call.
#[derive(Default)]
struct RecordingAdmin {
    topics: Mutex<Vec<String>>,
    list_calls: Mutex<usize>,
    created: Mutex<Vec<TopicSpec>>,
    fail_listing: bool,
    report_exists_on_create: bool,
}

impl RecordingAdmin {
    fn with_topics(names: &[&str]) -> Self {
        Self {
            topics: Mutex::new(names.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }
}

impl TopicAdmin for RecordingAdmin {
    fn list_topics(
        &self,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, TopicError>> + Send + '_>> {
        Box::pin(async move {
            *self.list_calls.lock().unwrap() += 1;
            if self.fail_listing {
                return Err(TopicError::broker("all brokers down"));
            }
            Ok(self.topics.lock().unwrap().clone())
        })
    }

    fn create_topic<'a>(
        &'a self,
        spec: &'a TopicSpec,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<ProvisionOutcome, TopicError>> + Send + 'a>> {
        Box::pin(async move {
            self.created.lock().unwrap().push(spec.clone());
            if self.report_exists_on_create {
                return Ok(ProvisionOutcome::Existing);
            }
            self.topics.lock().unwrap().push(spec.name.to_string());
            Ok(ProvisionOutcome::Created)
        })
    }
}

#[tokio::test]
async fn test_existing_topic_is_not_recreated() {
    let admin = RecordingAdmin::with_topics(&["payments", "orders"]);

    let outcome = ensure_topic(
        &admin,
        &"orders".into(),
        TopicKind::Event,
        MissingTopicBehavior::AutoCreate { min_brokers: 3 },
        TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ProvisionOutcome::Existing);
    assert_eq!(*admin.list_calls.lock().unwrap(), 1);
    assert!(admin.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_topic_is_created_with_computed_spec() {
    let admin = RecordingAdmin::with_topics(&["payments"]);

    let outcome = ensure_topic(
        &admin,
        &"orders".into(),
        TopicKind::State,
        MissingTopicBehavior::AutoCreate { min_brokers: 2 },
        TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ProvisionOutcome::Created);
    let created = admin.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name.as_str(), "orders");
    assert_eq!(created[0].kind, TopicKind::State);
    assert_eq!(created[0].partitions, 1);
    assert_eq!(created[0].replication_factor, 2);
    assert_eq!(created[0].min_insync_replicas, 2);
}

#[tokio::test]
async fn test_second_ensure_sees_the_created_topic() {
    let admin = RecordingAdmin::default();
    let behavior = MissingTopicBehavior::AutoCreate { min_brokers: 1 };

    let first = ensure_topic(&admin, &"orders".into(), TopicKind::Event, behavior, TIMEOUT)
        .await
        .unwrap();
    let second = ensure_topic(&admin, &"orders".into(), TopicKind::Event, behavior, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(first, ProvisionOutcome::Created);
    assert_eq!(second, ProvisionOutcome::Existing);
    assert_eq!(admin.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lost_creation_race_counts_as_existing() {
    let admin = RecordingAdmin {
        report_exists_on_create: true,
        ..Default::default()
    };

    let outcome = ensure_topic(
        &admin,
        &"orders".into(),
        TopicKind::Event,
        MissingTopicBehavior::AutoCreate { min_brokers: 3 },
        TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ProvisionOutcome::Existing);
}

#[tokio::test]
async fn test_fail_if_not_exists_never_touches_the_broker() {
    let admin = RecordingAdmin::default();

    let outcome = ensure_topic(
        &admin,
        &"orders".into(),
        TopicKind::Event,
        MissingTopicBehavior::FailIfNotExists,
        TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ProvisionOutcome::Skipped);
    assert_eq!(*admin.list_calls.lock().unwrap(), 0);
    assert!(admin.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_failure_propagates_with_context() {
    let admin = RecordingAdmin {
        fail_listing: true,
        ..Default::default()
    };

    let err = ensure_topic(
        &admin,
        &"orders".into(),
        TopicKind::Event,
        MissingTopicBehavior::AutoCreate { min_brokers: 1 },
        TIMEOUT,
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "broker: list topics for 'orders': all brokers down");
    assert!(admin.created.lock().unwrap().is_empty());
}
