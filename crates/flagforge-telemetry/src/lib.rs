//! Maps a completed evaluation (hook context + generic resolution) to a
//! standard telemetry event envelope, independent of any particular
//! exporter or wire format.

pub mod event;

pub use event::{build_event, TelemetryEvent, EVENT_NAME};
