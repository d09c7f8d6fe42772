//! Per-(source, serialiser) update pipeline with timestamp admission control
//! and a republishable flush cache.

use crate::observability::{events, fields};
use crate::producer::{ProduceError, Producer};
use crate::runtime::repeat_timer::RepeatTimer;
use crate::serialisation::{SerialisedUpdate, Serialiser};
use crate::update::{wall_clock_ns, SourceEvent};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

const COMPONENT: &str = "serialiser_tracker";

/// Oldest admissible update age: 365.25 days, in nanoseconds.
const LOWER_AGE_LIMIT_NS: i64 = 31_557_600_000_000_000;
/// Largest admissible future skew: 10 minutes, in nanoseconds.
const UPPER_AGE_LIMIT_NS: i64 = 600_000_000_000;
/// Watermark before any update has been accepted: 1900-01-01T00:00:00Z,
/// far enough in the past that the ordering check never blocks the first
/// update.
const WATERMARK_SENTINEL_NS: i64 = -2_208_988_800_000_000_000;

#[derive(Clone)]
struct CachedUpdate {
    payload: Arc<[u8]>,
    timestamp_ns: i64,
}

/// The cache is the only state shared between the live-update path and the
/// flush-timer task. The lock is scoped to exactly the read/replace of the
/// cached pair and is never held across an await.
type SharedCache = Arc<Mutex<Option<CachedUpdate>>>;

fn lock_cache(cache: &SharedCache) -> MutexGuard<'_, Option<CachedUpdate>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Millisecond timestamp the broker expects, floored from nanoseconds.
/// One-way and lossy: sub-millisecond precision is truncated.
pub(crate) fn nanoseconds_to_milliseconds(timestamp_ns: i64) -> i64 {
    timestamp_ns.div_euclid(1_000_000)
}

async fn publish_update(
    producer: &Arc<dyn Producer>,
    output_topic: &str,
    source_name: &str,
    payload: &[u8],
    timestamp_ns: i64,
) -> Result<(), ProduceError> {
    producer
        .produce(
            output_topic,
            payload,
            nanoseconds_to_milliseconds(timestamp_ns),
            source_name,
        )
        .await
}

/// Republish the cached pair, if any. Shared by [`SerialiserTracker::flush_tick`]
/// and the flush-timer callback.
async fn flush_cached(
    cache: &SharedCache,
    producer: &Arc<dyn Producer>,
    output_topic: &str,
    source_name: &str,
) -> Result<(), ProduceError> {
    let Some(cached) = lock_cache(cache).clone() else {
        return Ok(());
    };
    publish_update(
        producer,
        output_topic,
        source_name,
        &cached.payload,
        cached.timestamp_ns,
    )
    .await
}

/// One pipeline instance: a serialiser bound to one source, publishing to
/// one topic, with its own watermark and flush cache.
///
/// `submit` takes `&mut self`, so the watermark has a single writer by
/// construction and needs no lock; only the flush cache is shared with the
/// background timer task.
pub struct SerialiserTracker {
    serialiser: Box<dyn Serialiser>,
    producer: Arc<dyn Producer>,
    source_name: String,
    output_topic: String,
    last_accepted_ns: i64,
    cache: SharedCache,
    flush_timer: Option<RepeatTimer>,
}

impl Debug for SerialiserTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialiserTracker")
            .field("source_name", &self.source_name)
            .field("schema", &self.serialiser.schema())
            .field("output_topic", &self.output_topic)
            .field("last_accepted_ns", &self.last_accepted_ns)
            .finish_non_exhaustive()
    }
}

impl SerialiserTracker {
    pub(crate) fn new(
        serialiser: Box<dyn Serialiser>,
        producer: Arc<dyn Producer>,
        source_name: &str,
        output_topic: &str,
        periodic_update_ms: Option<u64>,
    ) -> Self {
        let cache: SharedCache = Arc::new(Mutex::new(None));

        let flush_timer = periodic_update_ms.map(|period_ms| {
            let cache = cache.clone();
            let producer = producer.clone();
            let output_topic = output_topic.to_string();
            let source_name = source_name.to_string();
            RepeatTimer::spawn(period_ms, move || {
                let cache = cache.clone();
                let producer = producer.clone();
                let output_topic = output_topic.clone();
                let source_name = source_name.clone();
                Box::pin(async move {
                    flush_cached(&cache, &producer, &output_topic, &source_name)
                        .await
                        .map_err(Into::into)
                })
            })
        });

        Self {
            serialiser,
            producer,
            source_name: source_name.to_string(),
            output_topic: output_topic.to_string(),
            last_accepted_ns: WATERMARK_SENTINEL_NS,
            cache,
            flush_timer,
        }
    }

    /// Name of the schema this tracker publishes.
    pub fn schema(&self) -> &'static str {
        self.serialiser.schema()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn output_topic(&self) -> &str {
        &self.output_topic
    }

    /// Feed one event through serialisation and admission control against
    /// the wall clock.
    pub async fn submit(&mut self, event: &SourceEvent) {
        self.submit_at(event, wall_clock_ns()).await
    }

    /// [`submit`](Self::submit) with an explicit reference clock, so
    /// admission is deterministic under test.
    ///
    /// Rejections are non-fatal and alter no stored state; a subsequent
    /// in-window update is evaluated against the same watermark.
    pub async fn submit_at(&mut self, event: &SourceEvent, now_ns: i64) {
        let serialised = match self.serialiser.serialise(event) {
            Ok(Some(serialised)) => serialised,
            Ok(None) => {
                trace!(
                    component = COMPONENT,
                    source = %self.source_name,
                    schema = self.serialiser.schema(),
                    event_summary = %fields::format_event(event),
                    "serialiser elected to drop update"
                );
                return;
            }
            Err(err) => {
                warn!(
                    event = events::SUBMIT_DROP_UNSERIALISABLE,
                    component = COMPONENT,
                    source = %self.source_name,
                    schema = self.serialiser.schema(),
                    err = %err,
                    "dropping unserialisable update"
                );
                return;
            }
        };

        let candidate_ns = serialised.timestamp_ns;
        if candidate_ns < self.last_accepted_ns {
            warn!(
                event = events::SUBMIT_REJECT_OUT_OF_ORDER,
                component = COMPONENT,
                source = %self.source_name,
                candidate_ns,
                watermark_ns = self.last_accepted_ns,
                "rejecting update older than the previous accepted update from this source"
            );
            return;
        }
        if candidate_ns < now_ns - LOWER_AGE_LIMIT_NS {
            warn!(
                event = events::SUBMIT_REJECT_STALE,
                component = COMPONENT,
                source = %self.source_name,
                candidate_ns,
                now_ns,
                "rejecting update older than the retention horizon"
            );
            return;
        }
        if candidate_ns > now_ns + UPPER_AGE_LIMIT_NS {
            warn!(
                event = events::SUBMIT_REJECT_FUTURE,
                component = COMPONENT,
                source = %self.source_name,
                candidate_ns,
                now_ns,
                "rejecting update timestamped further into the future than allowed"
            );
            return;
        }

        self.last_accepted_ns = candidate_ns;

        if self.publish(&serialised).await && self.flush_timer.is_some() {
            *lock_cache(&self.cache) = Some(CachedUpdate {
                payload: serialised.payload.clone(),
                timestamp_ns: candidate_ns,
            });
        }
    }

    /// Republish the cached update, if any. Driven by the flush timer on its
    /// own schedule, never by `submit`; exposed so tests can trigger a tick
    /// deterministically.
    pub async fn flush_tick(&self) {
        if let Err(err) = flush_cached(
            &self.cache,
            &self.producer,
            &self.output_topic,
            &self.source_name,
        )
        .await
        {
            warn!(
                event = events::FLUSH_PUBLISH_FAILED,
                component = COMPONENT,
                source = %self.source_name,
                err = %err,
                "cached republish failed, cache kept for next tick"
            );
        }
    }

    /// Cancel the flush timer, if one is configured. Idempotent. The shared
    /// producer is released by the owner through the pool, not here.
    pub fn stop(&mut self) {
        if let Some(timer) = self.flush_timer.take() {
            timer.cancel();
            debug!(
                event = events::TRACKER_STOPPED,
                component = COMPONENT,
                source = %self.source_name,
                schema = self.serialiser.schema(),
                "tracker stopped"
            );
        }
    }

    async fn publish(&self, serialised: &SerialisedUpdate) -> bool {
        match publish_update(
            &self.producer,
            &self.output_topic,
            &self.source_name,
            &serialised.payload,
            serialised.timestamp_ns,
        )
        .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    event = events::SUBMIT_PUBLISH_FAILED,
                    component = COMPONENT,
                    source = %self.source_name,
                    err = %err,
                    "live publish failed, update not cached"
                );
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn watermark_ns(&self) -> i64 {
        self.last_accepted_ns
    }

    #[cfg(test)]
    pub(crate) fn cached_payload(&self) -> Option<(Arc<[u8]>, i64)> {
        lock_cache(&self.cache)
            .as_ref()
            .map(|cached| (cached.payload.clone(), cached.timestamp_ns))
    }
}
