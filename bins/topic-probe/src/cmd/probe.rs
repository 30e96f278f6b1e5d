use std::sync::Arc;

use uuid::Uuid;

use topic_client::codec::{IdCodec, Int32Codec};
use topic_client::{Connection, Offset, Partition, TopicDefinition};

use super::config::Effective;
use super::error::ProbeError;

/// Write `count` records, then read them back from the first written offset
/// and compare.
pub async fn run(eff: &Effective) -> Result<(), ProbeError> {
    let conn = Connection::from_config(&eff.connection);
    let def = Arc::new(TopicDefinition::event(eff.topic.as_str(), IdCodec, Int32Codec));
    tracing::info!(?conn, topic = %def.name(), count = eff.count, "probe starting");

    let writer = conn.open_writer(&def, Some(eff.missing_topic)).await?;
    let mut sent = Vec::with_capacity(eff.count);
    for i in 0..eff.count {
        let value = i32::try_from(i).unwrap_or(i32::MAX);
        let result = writer.write(Uuid::new_v4(), value).await?;
        tracing::debug!(position = %result.position, "written");
        sent.push(result);
    }
    writer.dispose().await;

    let Some(first) = sent.first() else {
        tracing::info!("nothing to probe");
        return Ok(());
    };

    let reader = conn.open_reader(&def, Some(first.position.offset))?;
    let outcome = verify(reader.as_ref(), &sent, eff).await;

    if outcome.is_ok() {
        let (low, high) = reader
            .query_watermark_offsets(def.name(), Partition::ZERO, eff.read_timeout)
            .await?;
        let position = reader.position(def.name(), Partition::ZERO)?;
        tracing::info!(low, high, %position, "probe succeeded");
    }
    reader.dispose().await;
    outcome
}

async fn verify(
    reader: &dyn topic_client::TopicReader<Uuid, i32>,
    sent: &[topic_client::TopicResult<Uuid, i32>],
    eff: &Effective,
) -> Result<(), ProbeError> {
    for expected in sent {
        let got = tokio::time::timeout(eff.read_timeout, reader.read())
            .await
            .map_err(|_| {
                ProbeError::Mismatch(format!(
                    "no record at {} within {:?}",
                    expected.position, eff.read_timeout
                ))
            })??;

        if got.key != expected.key || got.value != expected.value {
            return Err(ProbeError::Mismatch(format!(
                "at {}: wrote ({}, {}), read ({}, {})",
                expected.position, expected.key, expected.value, got.key, got.value
            )));
        }
        if let (Offset::Offset(want), Offset::Offset(have)) =
            (expected.position.offset, got.position.offset)
            && want != have
        {
            return Err(ProbeError::Mismatch(format!(
                "record {} came back at offset {have}",
                expected.position
            )));
        }
    }
    Ok(())
}
