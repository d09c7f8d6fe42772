//! Event-name and field-format constants for data-plane logs.
//!
//! Library code emits `tracing` events; it never installs a global
//! subscriber. Binaries and tests own one-time `tracing_subscriber`
//! initialization at process boundaries.

pub mod events {
    pub const SUBMIT_DROP_UNSERIALISABLE: &str = "submit_drop_unserialisable";
    pub const SUBMIT_REJECT_OUT_OF_ORDER: &str = "submit_reject_out_of_order";
    pub const SUBMIT_REJECT_STALE: &str = "submit_reject_stale";
    pub const SUBMIT_REJECT_FUTURE: &str = "submit_reject_future";
    pub const SUBMIT_PUBLISH_FAILED: &str = "submit_publish_failed";
    pub const FLUSH_PUBLISH_FAILED: &str = "flush_publish_failed";
    pub const TRACKER_STOPPED: &str = "tracker_stopped";
}

pub mod fields {
    use crate::update::SourceEvent;

    /// Compact one-line description of an incoming event for log fields.
    pub fn format_event(event: &SourceEvent) -> String {
        match event {
            SourceEvent::Value(update) => {
                format!("value@{}ns", update.timestamp_ns)
            }
            SourceEvent::Connection(state) => format!("connection:{state}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fields::format_event;
    use crate::update::{ConnectionState, PvUpdate, PvValue, SourceEvent};

    #[test]
    fn format_event_summarizes_both_variants() {
        let value = SourceEvent::Value(PvUpdate {
            value: PvValue::Int(7),
            timestamp_ns: 42,
        });
        assert_eq!(format_event(&value), "value@42ns");

        let conn = SourceEvent::Connection(ConnectionState::Disconnected);
        assert_eq!(format_event(&conn), "connection:disconnected");
    }
}
