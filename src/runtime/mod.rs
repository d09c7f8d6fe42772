//! Runtime layer.
//!
//! Owns the scheduled-task boundary between the pipeline and the tokio
//! runtime: background flush loops live here, everything else runs on the
//! caller's task.

pub(crate) mod repeat_timer;
