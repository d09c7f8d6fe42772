//! Connection-status (`ep00`) serialiser.
//!
//! Every tracker set carries one of these alongside its primary schema so a
//! source reports liveness independently of its data schema. Repeated states
//! are deduplicated: only a transition produces a payload. A live value
//! update implies the source is connected.

use crate::serialisation::{SerialiseError, SerialisedUpdate, Serialiser};
use crate::update::{wall_clock_ns, ConnectionState, SourceEvent};
use serde_json::json;
use std::sync::Arc;

const SCHEMA: &str = "ep00";

pub(crate) struct Ep00Serialiser {
    source_name: String,
    last_state: Option<ConnectionState>,
}

impl Ep00Serialiser {
    pub(crate) fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            last_state: None,
        }
    }

    fn serialise_state(
        &self,
        state: ConnectionState,
        timestamp_ns: i64,
    ) -> Result<SerialisedUpdate, SerialiseError> {
        let body = json!({
            "schema": SCHEMA,
            "source_name": self.source_name,
            "status": state.label(),
            "timestamp_ns": timestamp_ns,
        });
        let payload = serde_json::to_vec(&body)
            .map_err(|err| SerialiseError::new(SCHEMA, err.to_string()))?;
        Ok(SerialisedUpdate {
            payload: Arc::from(payload),
            timestamp_ns,
        })
    }
}

impl Serialiser for Ep00Serialiser {
    fn schema(&self) -> &'static str {
        SCHEMA
    }

    fn serialise(
        &mut self,
        event: &SourceEvent,
    ) -> Result<Option<SerialisedUpdate>, SerialiseError> {
        // Connection transitions are stamped at observation time; a value
        // update carries the source's own timestamp.
        let (state, timestamp_ns) = match event {
            SourceEvent::Connection(state) => (*state, wall_clock_ns()),
            SourceEvent::Value(update) => (ConnectionState::Connected, update.timestamp_ns),
        };

        if self.last_state == Some(state) {
            return Ok(None);
        }
        self.last_state = Some(state);

        self.serialise_state(state, timestamp_ns).map(Some)
    }
}
