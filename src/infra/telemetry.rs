use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "portico_cache_hit_total",
            Unit::Count,
            "Total number of cache hits."
        );
        describe_counter!(
            "portico_cache_miss_total",
            Unit::Count,
            "Total number of cache misses."
        );
        describe_counter!(
            "portico_cache_expired_total",
            Unit::Count,
            "Total number of entries evicted after TTL expiry."
        );
        describe_counter!(
            "portico_cache_purge_total",
            Unit::Count,
            "Total number of entries removed by tag invalidation."
        );
        describe_gauge!(
            "portico_cache_entries",
            Unit::Count,
            "Current number of live cache entries."
        );
        describe_counter!(
            "portico_upstream_retry_total",
            Unit::Count,
            "Total number of upstream fetches retried after a transient failure."
        );
        describe_histogram!(
            "portico_upstream_fetch_ms",
            Unit::Milliseconds,
            "Upstream fetch latency in milliseconds, including the retry if any."
        );
    });
}
