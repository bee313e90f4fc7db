// Telemetry module for structured logging, metrics, and tracing

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::models::Channel;

/// Initialize structured logging with JSON formatting and trace context
///
/// This function sets up the tracing subscriber with:
/// - JSON formatting for structured logs
/// - Trace context (trace_id, span_id) in all log entries
/// - Log levels from configuration or environment
/// - Optional OpenTelemetry integration
#[tracing::instrument(skip_all)]
pub fn init_logging(log_level: &str, tracing_endpoint: Option<&str>) -> Result<()> {
    // Create environment filter from log level
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    // Create JSON formatting layer with trace context
    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    // Initialize the subscriber with optional OpenTelemetry layer
    let registry = tracing_subscriber::registry().with(json_layer);

    if let Some(endpoint) = tracing_endpoint {
        // Initialize OpenTelemetry if endpoint is provided
        let tracer = init_tracer(endpoint)?;
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        registry
            .with(telemetry_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    } else {
        registry
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    }

    tracing::info!(
        log_level = log_level,
        tracing_endpoint = tracing_endpoint,
        "Structured logging initialized with JSON formatting"
    );

    Ok(())
}

/// Initialize OpenTelemetry tracer with OTLP exporter
///
/// This function sets up OpenTelemetry tracing with:
/// - OTLP exporter to send traces to a collector (e.g., Jaeger)
/// - Service name and version as resource attributes
/// - Random ID generator for trace and span IDs
/// - Always-on sampler for all traces
#[tracing::instrument(skip_all)]
fn init_tracer(endpoint: &str) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_sdk::runtime::Tokio;

    // Create OTLP exporter
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to build span exporter: {}", e))?;

    // Create tracer provider with resource attributes
    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", "license-tracker"),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .build();

    // Set global tracer provider
    global::set_tracer_provider(tracer_provider.clone());

    // Get tracer
    let tracer = tracer_provider.tracer("license-tracker");

    tracing::info!(
        endpoint = endpoint,
        "OpenTelemetry tracer initialized with OTLP exporter"
    );

    Ok(tracer)
}

/// Shutdown OpenTelemetry tracer provider
///
/// This should be called on graceful shutdown to flush remaining spans
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Initialize Prometheus metrics exporter on its own listener
///
/// Used by the reminder daemon, which has no HTTP surface of its own.
/// The API installs a recorder instead and serves /metrics from its
/// router.
#[tracing::instrument(skip_all)]
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    // Build and install the Prometheus exporter
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_metrics();

    tracing::info!(
        metrics_port = metrics_port,
        metrics_endpoint = format!("http://0.0.0.0:{}/metrics", metrics_port),
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

/// Describe all metrics for better Prometheus integration
pub fn describe_metrics() {
    describe_counter!("reminder_runs_total", "Total number of reminder engine runs");
    describe_histogram!(
        "reminder_run_duration_seconds",
        "Duration of a full reminder run in seconds"
    );
    describe_counter!(
        "notifications_sent_total",
        "Total notification messages delivered, by channel"
    );
    describe_counter!(
        "notifications_skipped_total",
        "Total notification messages skipped on an unconfigured channel"
    );
    describe_counter!(
        "notifications_failed_total",
        "Total notification delivery failures, by channel"
    );
    describe_counter!(
        "licenses_notified_total",
        "Total licenses included in delivered notifications, by channel"
    );
    describe_counter!(
        "reminder_ledger_writes_total",
        "Total reminder ledger rows written"
    );
    describe_counter!(
        "reminder_thresholds_failed_total",
        "Total threshold passes aborted by an error, by threshold"
    );
}

/// Record a completed reminder run
///
/// Increments reminder_runs_total and records the run duration
#[inline]
pub fn record_reminder_run(duration_seconds: f64) {
    counter!("reminder_runs_total").increment(1);
    histogram!("reminder_run_duration_seconds").record(duration_seconds);
}

/// Record a notification message delivered on a channel
///
/// Counts both the message and the licenses it covered
#[inline]
pub fn record_notification_sent(channel: Channel, licenses: usize) {
    counter!("notifications_sent_total", "channel" => channel.to_string()).increment(1);
    counter!("licenses_notified_total", "channel" => channel.to_string())
        .increment(licenses as u64);
}

/// Record a notification skipped because the channel is not configured
#[inline]
pub fn record_notification_skipped(channel: Channel) {
    counter!("notifications_skipped_total", "channel" => channel.to_string()).increment(1);
}

/// Record a notification delivery failure
#[inline]
pub fn record_notification_failed(channel: Channel) {
    counter!("notifications_failed_total", "channel" => channel.to_string()).increment(1);
}

/// Record a reminder ledger row written
#[inline]
pub fn record_ledger_write(channel: Channel) {
    counter!("reminder_ledger_writes_total", "channel" => channel.to_string()).increment(1);
}

/// Record a threshold pass that failed before dispatch
#[inline]
pub fn record_threshold_failure(threshold: &str) {
    counter!("reminder_thresholds_failed_total", "threshold" => threshold.to_string())
        .increment(1);
}
