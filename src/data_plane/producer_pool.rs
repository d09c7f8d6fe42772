//! Refcounted shared-producer ownership.

use crate::producer::Producer;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const PRODUCER_POOL_TAG: &str = "ProducerPool:";
const PRODUCER_POOL_FN_ACQUIRE_TAG: &str = "acquire:";
const PRODUCER_POOL_FN_RELEASE_TAG: &str = "release:";

/// Pointer-identity key for a shared producer.
pub(crate) struct ComparableProducer {
    producer: Arc<dyn Producer>,
}

impl ComparableProducer {
    pub(crate) fn new(producer: Arc<dyn Producer>) -> Self {
        Self { producer }
    }
}

impl Hash for ComparableProducer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.producer).hash(state);
    }
}

impl PartialEq for ComparableProducer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.producer, &other.producer)
    }
}

impl Eq for ComparableProducer {}

impl Debug for ComparableProducer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparableProducer").finish_non_exhaustive()
    }
}

type ProducerLeases = Mutex<HashMap<ComparableProducer, usize>>;

/// Coordinates release-on-last-use of broker producers shared by many
/// trackers across many sources.
///
/// A tracker never closes the producer itself; the owner that constructs
/// trackers acquires one lease per tracker and releases them on teardown.
/// `close()` runs exactly once, when the last lease is released.
pub struct ProducerPool {
    leases: ProducerLeases,
}

impl ProducerPool {
    pub fn new() -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// Register one more user of `producer` and hand back a clone to hold.
    pub async fn acquire(&self, producer: Arc<dyn Producer>) -> Arc<dyn Producer> {
        let mut leases = self.leases.lock().await;
        let active = leases
            .entry(ComparableProducer::new(producer.clone()))
            .or_insert_with(|| {
                debug!("{PRODUCER_POOL_TAG}:{PRODUCER_POOL_FN_ACQUIRE_TAG} first lease for producer");
                0
            });
        *active += 1;
        producer
    }

    /// Drop one lease; closes the producer when the last lease goes.
    pub async fn release(&self, producer: Arc<dyn Producer>) {
        let key = ComparableProducer::new(producer.clone());

        let remaining = {
            let mut leases = self.leases.lock().await;
            let Some(active) = leases.get_mut(&key) else {
                warn!("{PRODUCER_POOL_TAG}:{PRODUCER_POOL_FN_RELEASE_TAG} no lease held for this producer");
                return;
            };
            *active -= 1;
            let remaining = *active;
            if remaining == 0 {
                leases.remove(&key);
            }
            remaining
        };

        if remaining == 0 {
            debug!("{PRODUCER_POOL_TAG}:{PRODUCER_POOL_FN_RELEASE_TAG} last lease released, closing producer");
            producer.close().await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn lease_count(&self, producer: &Arc<dyn Producer>) -> usize {
        self.leases
            .lock()
            .await
            .get(&ComparableProducer::new(producer.clone()))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for ProducerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ProducerPool;
    use crate::producer::{ProduceError, Producer};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingProducer {
        close_calls: AtomicUsize,
    }

    #[async_trait]
    impl Producer for CountingProducer {
        async fn produce(
            &self,
            _topic: &str,
            _payload: &[u8],
            _timestamp_ms: i64,
            _key: &str,
        ) -> Result<(), ProduceError> {
            Ok(())
        }

        async fn close(&self) {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn acquire_same_producer_increments_single_lease_entry() {
        let pool = ProducerPool::new();
        let counting = Arc::new(CountingProducer::default());
        let producer: Arc<dyn Producer> = counting.clone();

        pool.acquire(producer.clone()).await;
        pool.acquire(producer.clone()).await;

        assert_eq!(pool.lease_count(&producer).await, 2);
        assert_eq!(counting.close_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_runs_once_when_last_lease_is_released() {
        let pool = ProducerPool::new();
        let counting = Arc::new(CountingProducer::default());
        let producer: Arc<dyn Producer> = counting.clone();

        pool.acquire(producer.clone()).await;
        pool.acquire(producer.clone()).await;

        pool.release(producer.clone()).await;
        assert_eq!(counting.close_calls.load(Ordering::SeqCst), 0);

        pool.release(producer.clone()).await;
        assert_eq!(counting.close_calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool.lease_count(&producer).await, 0);
    }

    #[tokio::test]
    async fn release_without_lease_is_a_logged_no_op() {
        let pool = ProducerPool::new();
        let counting = Arc::new(CountingProducer::default());
        let producer: Arc<dyn Producer> = counting.clone();

        pool.release(producer).await;
        assert_eq!(counting.close_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn distinct_producers_get_distinct_leases() {
        let pool = ProducerPool::new();
        let first: Arc<dyn Producer> = Arc::new(CountingProducer::default());
        let second: Arc<dyn Producer> = Arc::new(CountingProducer::default());

        pool.acquire(first.clone()).await;
        pool.acquire(second.clone()).await;

        assert_eq!(pool.lease_count(&first).await, 1);
        assert_eq!(pool.lease_count(&second).await, 1);
    }
}
