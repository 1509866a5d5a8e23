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
            "creatorhub_cache_hit_total",
            Unit::Count,
            "Read-through cache hits, labelled by entry class."
        );
        describe_counter!(
            "creatorhub_cache_miss_total",
            Unit::Count,
            "Read-through cache misses, labelled by entry class."
        );
        describe_counter!(
            "creatorhub_cache_evict_total",
            Unit::Count,
            "Entries evicted because the cache reached capacity."
        );
        describe_counter!(
            "creatorhub_cache_invalidated_total",
            Unit::Count,
            "Entries dropped by tag invalidation or flush."
        );
        describe_gauge!(
            "creatorhub_cache_event_queue_len",
            Unit::Count,
            "Pending cache events awaiting consumption."
        );
        describe_histogram!(
            "creatorhub_cache_consume_ms",
            Unit::Milliseconds,
            "Time spent applying one batch of cache events."
        );
        describe_counter!(
            "creatorhub_rate_limited_total",
            Unit::Count,
            "Requests rejected by the sliding-window limiter."
        );
        describe_counter!(
            "creatorhub_integration_request_total",
            Unit::Count,
            "Outbound third-party requests, labelled by service and outcome."
        );
        describe_counter!(
            "creatorhub_youtube_sync_total",
            Unit::Count,
            "Channel statistics refreshes, labelled by outcome."
        );
    });
}
