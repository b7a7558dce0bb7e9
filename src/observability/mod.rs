//! Observability for folio
//!
//! - Structured JSON logging with a process-wide severity floor
//! - Typed lifecycle events
//! - Per-store counters
//!
//! Observability is read-only: nothing here changes the outcome of a store
//! operation, and logging failures are swallowed.

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log a lifecycle event with fields.
///
/// Failure events are logged at ERROR, everything else at INFO.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log a lifecycle event at TRACE, for high-frequency paths
pub fn trace_event(event: Event, fields: &[(&str, &str)]) {
    Logger::trace(event.as_str(), fields);
}
