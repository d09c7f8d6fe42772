//! Typed input model for the update pipeline.

use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// A process-variable value carried by an update event.
#[derive(Clone, Debug, PartialEq)]
pub enum PvValue {
    Int(i64),
    Double(f64),
    IntArray(Vec<i64>),
    DoubleArray(Vec<f64>),
}

/// A raw value update delivered by the source-value provider.
///
/// The timestamp is nanoseconds since the Unix epoch, as stamped by the
/// source system, not by this process.
#[derive(Clone, Debug, PartialEq)]
pub struct PvUpdate {
    pub value: PvValue,
    pub timestamp_ns: i64,
}

/// Connection state of a monitored source, as reported by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    NeverConnected,
    Connected,
    Disconnected,
    Cancelled,
    Finished,
    RemoteError,
    Unknown,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::NeverConnected => "never_connected",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Cancelled => "cancelled",
            ConnectionState::Finished => "finished",
            ConnectionState::RemoteError => "remote_error",
            ConnectionState::Unknown => "unknown",
        }
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One event delivered to the pipeline: either a live value update or a
/// connection-state transition.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    Value(PvUpdate),
    Connection(ConnectionState),
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub(crate) fn wall_clock_ns() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => since_epoch.as_nanos() as i64,
        // Pre-epoch system clock; admission control will reject everything
        // against it, which is the safe outcome.
        Err(err) => -(err.duration().as_nanos() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::{wall_clock_ns, ConnectionState};

    #[test]
    fn connection_state_labels_are_stable() {
        assert_eq!(ConnectionState::NeverConnected.label(), "never_connected");
        assert_eq!(ConnectionState::RemoteError.label(), "remote_error");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }

    #[test]
    fn wall_clock_is_past_2020() {
        // 2020-01-01T00:00:00Z in nanoseconds.
        assert!(wall_clock_ns() > 1_577_836_800_000_000_000);
    }
}
