//! Broker-producer contract consumed by the pipeline.

use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

/// Error returned by a producer when a message hand-off fails.
///
/// Partitioning, batching, and retries are the producer's own business; by
/// the time this error surfaces the pipeline treats the update as lost and
/// moves on.
pub struct ProduceError {
    message: String,
}

impl ProduceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Debug for ProduceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ProduceError({})", self.message)
    }
}

impl Display for ProduceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "producer failed: {}", self.message)
    }
}

impl Error for ProduceError {}

/// The message-broker producer the pipeline hands accepted updates to.
///
/// Implementations are expected to be non-blocking or internally buffered;
/// the pipeline awaits the hand-off but performs no other network I/O.
/// A single producer is typically shared by many trackers across many
/// sources (fan-in to one broker connection) and must only be closed once
/// the last user has released it; see
/// [`ProducerPool`](crate::ProducerPool).
#[async_trait]
pub trait Producer: Send + Sync {
    /// Hand one message to the broker, keyed by source name.
    async fn produce(
        &self,
        topic: &str,
        payload: &[u8],
        timestamp_ms: i64,
        key: &str,
    ) -> Result<(), ProduceError>;

    /// Release the underlying broker connection.
    async fn close(&self);
}
