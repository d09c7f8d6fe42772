//! Schema serialisation layer.
//!
//! Serialisers map one incoming [`SourceEvent`] to at most one
//! broker-bound payload. Their binary encoding is deliberately lightweight
//! (JSON bodies); the pipeline only depends on the call contract: an event
//! in, an optional `(payload, timestamp)` out.
//!
//! The schema set is fixed and known at build time, so schema resolution is
//! a registry of constructible variants rather than open-ended dynamic
//! dispatch; see [`supported_schemas`].

use crate::update::SourceEvent;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

mod ep00;
mod f142;
pub(crate) mod registry;
mod tdct;

pub use registry::{supported_schemas, UnsupportedSchema, CONNECTION_STATUS_SCHEMA};

/// One serialised update, ready to hand to the producer.
///
/// The payload is `Arc`-shared so the flush cache can clone it cheaply.
#[derive(Clone, Debug, PartialEq)]
pub struct SerialisedUpdate {
    pub payload: Arc<[u8]>,
    pub timestamp_ns: i64,
}

/// A serialiser failed on an event it should have been able to handle.
pub struct SerialiseError {
    schema: &'static str,
    message: String,
}

impl SerialiseError {
    pub fn new(schema: &'static str, message: impl Into<String>) -> Self {
        Self {
            schema,
            message: message.into(),
        }
    }
}

impl Debug for SerialiseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SerialiseError({}: {})", self.schema, self.message)
    }
}

impl Display for SerialiseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} serialiser failed: {}",
            self.schema, self.message
        )
    }
}

impl Error for SerialiseError {}

/// Per-schema serialisation behavior bound to one source.
///
/// `Ok(None)` is the serialiser's signal that the event is not worth
/// emitting (e.g. a duplicate connection state) and must be dropped
/// silently. Serialisers may carry internal state (the connection-status
/// serialiser deduplicates), hence `&mut self`.
pub trait Serialiser: Send {
    /// Name of the schema this serialiser produces.
    fn schema(&self) -> &'static str;

    fn serialise(
        &mut self,
        event: &SourceEvent,
    ) -> Result<Option<SerialisedUpdate>, SerialiseError>;
}

impl Debug for dyn Serialiser {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serialiser")
            .field("schema", &self.schema())
            .finish_non_exhaustive()
    }
}
