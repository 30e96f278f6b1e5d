use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::RDKafkaErrorCode;

use topic_api::{ProvisionOutcome, TopicAdmin, TopicError, TopicSpec};

use crate::settings::KafkaSettings;

/// `TopicAdmin` over the rdkafka admin client.
pub struct KafkaAdmin {
    client: Arc<AdminClient<DefaultClientContext>>,
}

impl KafkaAdmin {
    pub fn new(bootstrap_servers: &str, settings: &KafkaSettings) -> Result<Self, TopicError> {
        let client: AdminClient<DefaultClientContext> = settings
            .client_config(bootstrap_servers)
            .create()
            .map_err(|e| TopicError::broker(format!("create admin client: {e}")))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

impl TopicAdmin for KafkaAdmin {
    fn list_topics(
        &self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, TopicError>> + Send + '_>> {
        let client = self.client.clone();
        Box::pin(async move {
            // `None` requests every topic. Naming a single topic here could
            // auto-create it on brokers that allow implicit creation.
            tokio::task::spawn_blocking(move || {
                let metadata = client
                    .inner()
                    .fetch_metadata(None, timeout)
                    .map_err(|e| TopicError::broker(format!("fetch metadata: {e}")))?;
                Ok(metadata
                    .topics()
                    .iter()
                    .map(|t| t.name().to_string())
                    .collect())
            })
            .await
            .map_err(|e| TopicError::broker(format!("list topics join error: {e}")))?
        })
    }

    fn create_topic<'a>(
        &'a self,
        spec: &'a TopicSpec,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<ProvisionOutcome, TopicError>> + Send + 'a>> {
        Box::pin(async move {
            let configs = spec.configs();
            let mut topic = NewTopic::new(
                spec.name.as_str(),
                spec.partitions,
                TopicReplication::Fixed(spec.replication_factor),
            );
            for (key, value) in &configs {
                topic = topic.set(key, value);
            }

            let opts = AdminOptions::new().operation_timeout(Some(timeout));
            let results = self
                .client
                .create_topics(&[topic], &opts)
                .await
                .map_err(|e| TopicError::broker(format!("create topics: {e}")))?;

            let mut outcome = ProvisionOutcome::Created;
            for result in results {
                match result {
                    Ok(_) => {}
                    Err((_, RDKafkaErrorCode::TopicAlreadyExists)) => {
                        outcome = ProvisionOutcome::Existing;
                    }
                    Err((name, code)) => {
                        return Err(TopicError::broker(format!(
                            "create topic '{name}': {code}"
                        )));
                    }
                }
            }
            Ok(outcome)
        })
    }
}
