//! Tracing subscriber and metric descriptions.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::METRIC_UPSTREAM_REQUEST_MS;
use crate::cache::{
    METRIC_CACHE_EVICT, METRIC_CACHE_FAILURE_HIT, METRIC_CACHE_HIT, METRIC_CACHE_MISS,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber. `RUST_LOG` directives refine the
/// configured level.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("tracing subscriber already set: {err}")))
}

/// Register metric metadata with whichever recorder is installed.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Fresh cache hits, labelled by resource family."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Cache misses, stale entries included."
        );
        describe_counter!(
            METRIC_CACHE_EVICT,
            Unit::Count,
            "Entries evicted because a store reached capacity."
        );
        describe_counter!(
            METRIC_CACHE_FAILURE_HIT,
            Unit::Count,
            "Remembered upstream failures replayed without calling upstream."
        );
        describe_histogram!(
            METRIC_UPSTREAM_REQUEST_MS,
            Unit::Milliseconds,
            "Upstream request latency, labelled by target and outcome."
        );
    });
}
