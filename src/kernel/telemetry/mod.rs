//! Diagnostics side-channel of the scope tree.
//!
//! Telemetry is write-only from the tree's point of view: no scope decision reads it.
//! The multiple-active-sessions anomaly is reported here instead of failing the command.

pub mod event;
pub mod metrics;
pub mod recorder;
