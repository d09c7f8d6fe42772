//! Timestamp-chopper (`tdct`) serialiser.
//!
//! `tdct` carries detector timestamp lists, so only array-valued updates are
//! acceptable input; a scalar reaching this serialiser is a configuration
//! mistake and is surfaced as a [`SerialiseError`].

use crate::serialisation::{SerialiseError, SerialisedUpdate, Serialiser};
use crate::update::{PvValue, SourceEvent};
use serde_json::json;
use std::sync::Arc;

const SCHEMA: &str = "tdct";

pub(crate) struct TdctSerialiser {
    source_name: String,
}

impl TdctSerialiser {
    pub(crate) fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
        }
    }
}

impl Serialiser for TdctSerialiser {
    fn schema(&self) -> &'static str {
        SCHEMA
    }

    fn serialise(
        &mut self,
        event: &SourceEvent,
    ) -> Result<Option<SerialisedUpdate>, SerialiseError> {
        let update = match event {
            SourceEvent::Value(update) => update,
            SourceEvent::Connection(_) => return Ok(None),
        };

        let timestamps = match &update.value {
            PvValue::IntArray(timestamps) => json!(timestamps),
            PvValue::DoubleArray(timestamps) => json!(timestamps),
            PvValue::Int(_) | PvValue::Double(_) => {
                return Err(SerialiseError::new(
                    SCHEMA,
                    "tdct requires 1D array data, got a scalar",
                ))
            }
        };

        let body = json!({
            "schema": SCHEMA,
            "source_name": self.source_name,
            "timestamps": timestamps,
            "timestamp_ns": update.timestamp_ns,
        });
        let payload = serde_json::to_vec(&body)
            .map_err(|err| SerialiseError::new(SCHEMA, err.to_string()))?;

        Ok(Some(SerialisedUpdate {
            payload: Arc::from(payload),
            timestamp_ns: update.timestamp_ns,
        }))
    }
}
