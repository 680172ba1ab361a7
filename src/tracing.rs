//! Logging initialization
//!
//! Console logging via `tracing` with an environment filter. Structured
//! events throughout the crate carry a `trace_id` field so one agent task
//! can be followed across its recursive invocations.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log filter when RUST_LOG is not set.
const DEFAULT_FILTER: &str = "info,recursor=debug";

/// Initialize the tracing subsystem.
///
/// # Arguments
/// * `service_name` - Name reported in the startup event
///
/// # Example
/// ```ignore
/// init_tracing("recursor");
/// ```
pub fn init_tracing(service_name: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!(service = service_name, "Tracing initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(DEFAULT_FILTER, "info,recursor=debug");
    }
}
