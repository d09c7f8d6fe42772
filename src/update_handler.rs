//! Per-source handler owning a tracker set.

use crate::data_plane::producer_pool::ProducerPool;
use crate::data_plane::serialiser_tracker::SerialiserTracker;
use crate::data_plane::tracker_set::create_tracker_set;
use crate::producer::Producer;
use crate::serialisation::registry::UnsupportedSchema;
use crate::update::SourceEvent;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "update_handler";

/// Owns the tracker set for exactly one source and its teardown.
///
/// A thin aggregate: every incoming event is fanned out to each tracker,
/// which holds all serialisation and admission logic. The handler's lifetime
/// is bound to the source's active monitoring subscription, which is managed
/// externally.
pub struct UpdateHandler {
    source_name: String,
    trackers: Vec<SerialiserTracker>,
    producer: Arc<dyn Producer>,
    producer_pool: Arc<ProducerPool>,
    stopped: bool,
}

impl Debug for UpdateHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateHandler")
            .field("source_name", &self.source_name)
            .field("trackers", &self.trackers)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl UpdateHandler {
    /// Build the tracker set for one source and take ownership of it.
    ///
    /// Fails with [`UnsupportedSchema`] if `schema` is not registered; no
    /// tracker is constructed and no producer lease is held in that case.
    pub async fn new(
        producer_pool: Arc<ProducerPool>,
        producer: Arc<dyn Producer>,
        source_name: &str,
        output_topic: &str,
        schema: &str,
        periodic_update_ms: Option<u64>,
    ) -> Result<Self, UnsupportedSchema> {
        let trackers = create_tracker_set(
            &producer_pool,
            producer.clone(),
            source_name,
            output_topic,
            schema,
            periodic_update_ms,
        )
        .await?;

        Ok(Self {
            source_name: source_name.to_string(),
            trackers,
            producer,
            producer_pool,
            stopped: false,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Fan one source event out to every tracker in the set.
    ///
    /// A single connection event updates both the primary and the
    /// connection-status tracker consistently; each tracker decides for
    /// itself whether anything is emitted.
    pub async fn handle_event(&mut self, event: &SourceEvent) {
        if self.stopped {
            debug!(
                component = COMPONENT,
                source = %self.source_name,
                "dropping event delivered after stop"
            );
            return;
        }
        for tracker in &mut self.trackers {
            tracker.submit(event).await;
        }
    }

    /// Tear down every tracker: cancel all flush timers first, then release
    /// one producer lease per tracker so no in-flight flush can publish
    /// after the producer closes. Idempotent.
    pub async fn stop(&mut self) {
        if self.stopped {
            debug!(
                component = COMPONENT,
                source = %self.source_name,
                "stop called on already-stopped handler"
            );
            return;
        }
        self.stopped = true;

        for tracker in &mut self.trackers {
            tracker.stop();
        }
        for _ in 0..self.trackers.len() {
            self.producer_pool.release(self.producer.clone()).await;
        }

        debug!(
            component = COMPONENT,
            source = %self.source_name,
            "handler stopped"
        );
    }
}
