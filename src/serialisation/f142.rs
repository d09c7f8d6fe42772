//! Log-data (`f142`) value serialiser.

use crate::serialisation::{SerialiseError, SerialisedUpdate, Serialiser};
use crate::update::{PvValue, SourceEvent};
use serde_json::json;
use std::sync::Arc;

const SCHEMA: &str = "f142";

/// Serialises scalar and array value updates. Connection-state transitions
/// are not its business and are dropped; the status tracker in the same set
/// reports those.
pub(crate) struct F142Serialiser {
    source_name: String,
}

impl F142Serialiser {
    pub(crate) fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
        }
    }
}

fn value_to_json(value: &PvValue) -> serde_json::Value {
    match value {
        PvValue::Int(v) => json!(v),
        PvValue::Double(v) => json!(v),
        PvValue::IntArray(v) => json!(v),
        PvValue::DoubleArray(v) => json!(v),
    }
}

impl Serialiser for F142Serialiser {
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

        let body = json!({
            "schema": SCHEMA,
            "source_name": self.source_name,
            "value": value_to_json(&update.value),
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

#[cfg(test)]
mod tests {
    use super::F142Serialiser;
    use crate::serialisation::Serialiser;
    use crate::update::{ConnectionState, PvUpdate, PvValue, SourceEvent};

    #[test]
    fn serialises_scalar_value_with_source_identity() {
        let mut serialiser = F142Serialiser::new("some_pv");
        let event = SourceEvent::Value(PvUpdate {
            value: PvValue::Int(-3),
            timestamp_ns: 10,
        });

        let serialised = serialiser
            .serialise(&event)
            .expect("serialise succeeds")
            .expect("value events produce a payload");
        assert_eq!(serialised.timestamp_ns, 10);

        let body: serde_json::Value =
            serde_json::from_slice(&serialised.payload).expect("valid json payload");
        assert_eq!(body["schema"], "f142");
        assert_eq!(body["source_name"], "some_pv");
        assert_eq!(body["value"], -3);
        assert_eq!(body["timestamp_ns"], 10);
    }

    #[test]
    fn serialises_array_value() {
        let mut serialiser = F142Serialiser::new("some_pv");
        let event = SourceEvent::Value(PvUpdate {
            value: PvValue::DoubleArray(vec![1.5, 2.5]),
            timestamp_ns: 20,
        });

        let serialised = serialiser
            .serialise(&event)
            .expect("serialise succeeds")
            .expect("array values produce a payload");
        let body: serde_json::Value =
            serde_json::from_slice(&serialised.payload).expect("valid json payload");
        assert_eq!(body["value"], serde_json::json!([1.5, 2.5]));
    }

    #[test]
    fn drops_connection_events() {
        let mut serialiser = F142Serialiser::new("some_pv");
        let dropped = serialiser
            .serialise(&SourceEvent::Connection(ConnectionState::Connected))
            .expect("serialise succeeds");
        assert!(dropped.is_none());
    }
}
