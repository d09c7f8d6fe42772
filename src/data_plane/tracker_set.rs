//! Tracker-set construction: one primary-schema tracker plus the mandatory
//! connection-status tracker per source.

use crate::data_plane::producer_pool::ProducerPool;
use crate::data_plane::serialiser_tracker::SerialiserTracker;
use crate::producer::Producer;
use crate::serialisation::registry::{serialiser_for, UnsupportedSchema};
use crate::serialisation::CONNECTION_STATUS_SCHEMA;
use crate::update::{ConnectionState, SourceEvent};
use std::sync::Arc;
use tracing::debug;

/// Build the ordered tracker pair `[primary, connection-status]` for one
/// source.
///
/// The primary schema is resolved first; an unknown name fails with
/// [`UnsupportedSchema`] before any tracker is constructed or any producer
/// lease acquired. The connection-status tracker is always appended so every
/// source reports liveness independently of its data schema; both trackers
/// share the source name, topic, and periodic-update interval but keep
/// separate watermarks and caches.
///
/// One producer lease is acquired per tracker; the handler releases them on
/// teardown. On success the `never_connected` start marker has already been
/// pushed through the status tracker, so a consumer learns about the source
/// before its first live value.
pub async fn create_tracker_set(
    producer_pool: &ProducerPool,
    producer: Arc<dyn Producer>,
    source_name: &str,
    output_topic: &str,
    schema: &str,
    periodic_update_ms: Option<u64>,
) -> Result<Vec<SerialiserTracker>, UnsupportedSchema> {
    let primary_serialiser = serialiser_for(schema, source_name)?;
    let status_serialiser = serialiser_for(CONNECTION_STATUS_SCHEMA, source_name)?;

    let mut trackers = Vec::with_capacity(2);
    trackers.push(SerialiserTracker::new(
        primary_serialiser,
        producer_pool.acquire(producer.clone()).await,
        source_name,
        output_topic,
        periodic_update_ms,
    ));

    let mut status_tracker = SerialiserTracker::new(
        status_serialiser,
        producer_pool.acquire(producer).await,
        source_name,
        output_topic,
        periodic_update_ms,
    );
    // Initial liveness marker, flowing through the ordinary admission and
    // publish path.
    status_tracker
        .submit(&SourceEvent::Connection(ConnectionState::NeverConnected))
        .await;
    trackers.push(status_tracker);

    debug!(
        source = source_name,
        schema,
        topic = output_topic,
        "tracker set created"
    );
    Ok(trackers)
}

#[cfg(test)]
mod tests {
    use super::create_tracker_set;
    use crate::data_plane::producer_pool::ProducerPool;
    use crate::producer::{ProduceError, Producer};
    use crate::serialisation::CONNECTION_STATUS_SCHEMA;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Default)]
    struct RecordingProducer {
        payloads: StdMutex<Vec<Vec<u8>>>,
    }

    impl RecordingProducer {
        fn payloads(&self) -> Vec<Vec<u8>> {
            self.payloads.lock().expect("lock payloads").clone()
        }
    }

    #[async_trait]
    impl Producer for RecordingProducer {
        async fn produce(
            &self,
            _topic: &str,
            payload: &[u8],
            _timestamp_ms: i64,
            _key: &str,
        ) -> Result<(), ProduceError> {
            self.payloads
                .lock()
                .expect("lock payloads")
                .push(payload.to_vec());
            Ok(())
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn valid_schema_builds_primary_plus_status_pair() {
        let pool = ProducerPool::new();
        let producer: Arc<dyn Producer> = Arc::new(RecordingProducer::default());

        let trackers = create_tracker_set(
            &pool,
            producer.clone(),
            "some_pv",
            "output_topic",
            "f142",
            Some(60_000),
        )
        .await
        .expect("f142 is a supported schema");

        assert_eq!(trackers.len(), 2);
        assert_eq!(trackers[0].schema(), "f142");
        assert_eq!(trackers[1].schema(), CONNECTION_STATUS_SCHEMA);
        for tracker in &trackers {
            assert_eq!(tracker.source_name(), "some_pv");
            assert_eq!(tracker.output_topic(), "output_topic");
        }
        assert_eq!(pool.lease_count(&producer).await, 2);
    }

    #[tokio::test]
    async fn building_a_set_publishes_the_never_connected_marker() {
        let pool = ProducerPool::new();
        let recording = Arc::new(RecordingProducer::default());
        let producer: Arc<dyn Producer> = recording.clone();

        create_tracker_set(&pool, producer, "some_pv", "output_topic", "f142", None)
            .await
            .expect("f142 is a supported schema");

        let payloads = recording.payloads();
        assert_eq!(payloads.len(), 1);
        let body: serde_json::Value =
            serde_json::from_slice(&payloads[0]).expect("valid json payload");
        assert_eq!(body["schema"], CONNECTION_STATUS_SCHEMA);
        assert_eq!(body["status"], "never_connected");
        assert_eq!(body["source_name"], "some_pv");
    }

    #[tokio::test]
    async fn unknown_schema_fails_before_any_tracker_or_lease_exists() {
        let pool = ProducerPool::new();
        let recording = Arc::new(RecordingProducer::default());
        let producer: Arc<dyn Producer> = recording.clone();

        let err = create_tracker_set(
            &pool,
            producer.clone(),
            "some_pv",
            "output_topic",
            "unknown_schema",
            Some(60_000),
        )
        .await
        .expect_err("unknown schema must fail");

        assert_eq!(err.schema(), "unknown_schema");
        assert!(err.supported().contains(&"f142"));
        assert!(recording.payloads().is_empty());
        assert_eq!(pool.lease_count(&producer).await, 0);
    }
}
