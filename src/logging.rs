use crate::app_env;
use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{Resource, runtime};
use std::env;
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::{EnvFilter, prelude::*, registry};

/// The name of the service as it should appear in OpenTelemetry collectors
const SERVICE_NAME: &str = "taskbell";

/// OpenTelemetry providers which export data to a tracing server. Dropping this flushes
/// whatever is still buffered.
pub struct OtelExporters {
    tracer_provider: TracerProvider,
    meter: SdkMeterProvider,
}

impl Drop for OtelExporters {
    fn drop(&mut self) {
        if let Err(trace_err) = self.tracer_provider.shutdown() {
            eprintln!("Failed to flush spans: {trace_err}");
        }
        if let Err(metric_err) = self.meter.shutdown() {
            eprintln!("Failed to flush metrics: {metric_err}");
        }
    }
}

/// Instantiates OpenTelemetry exporters which run in the background and send tracing/metrics
/// data to an opentelemetry-compatible gRPC endpoint (typically http://localhost:4317 with a
/// locally running collector)
pub fn init_exporters(
    otlp_traces_endpoint: &str,
    otlp_metrics_endpoint: &str,
) -> Result<OtelExporters, anyhow::Error> {
    let span_export = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_traces_endpoint)
        .build()
        .context("building the span exporter")?;
    let meter_export = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_metrics_endpoint)
        .build()
        .context("building the metric exporter")?;

    let metrics_reader = PeriodicReader::builder(meter_export, runtime::Tokio).build();

    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(span_export, runtime::Tokio)
        .with_resource(Resource::new([KeyValue::new("service.name", SERVICE_NAME)]))
        .build();
    let meter_provider = SdkMeterProvider::builder()
        .with_reader(metrics_reader)
        .with_resource(Resource::new([KeyValue::new("service.name", SERVICE_NAME)]))
        .build();

    Ok(OtelExporters {
        tracer_provider,
        meter: meter_provider,
    })
}

/// Builds exporters only when both [app_env::OTEL_SPAN_EXPORT_URL] and
/// [app_env::OTEL_METRIC_EXPORT_URL] are set
pub fn exporters_from_env() -> Result<Option<OtelExporters>, anyhow::Error> {
    match (
        env::var(app_env::OTEL_SPAN_EXPORT_URL),
        env::var(app_env::OTEL_METRIC_EXPORT_URL),
    ) {
        (Ok(span_url), Ok(metric_url)) => init_exporters(&span_url, &metric_url).map(Some),
        _ => Ok(None),
    }
}

/// Constructs a filter which uses [app_env::LOG_LEVEL] to configure per-module logging.
/// Filters to the "warn" level by default so logs stay out of the way of command output.
pub fn init_env_filter() -> Result<EnvFilter, anyhow::Error> {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(app_env::LOG_LEVEL)
        .from_env()
        .context("building the logging filter")
}

/// Sets up the global logging and tracing sinks. All logs and metrics at the "debug" level and
/// above are sent to OpenTelemetry sinks if [otel_exporters] is provided. [env_filter] is applied
/// specifically to the JSON logger, which writes to stderr.
pub fn setup_logging_and_tracing(
    env_filter: EnvFilter,
    otel_exporters: Option<&OtelExporters>,
) -> Result<(), anyhow::Error> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    if let Some(exporters) = otel_exporters {
        registry()
            .with(LevelFilter::DEBUG)
            .with(OpenTelemetryLayer::new(
                exporters.tracer_provider.tracer(SERVICE_NAME),
            ))
            .with(MetricsLayer::new(exporters.meter.clone()))
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_filter(env_filter),
            )
            .try_init()
            .context("installing the global subscriber")?;
    } else {
        registry()
            .with(LevelFilter::DEBUG)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_filter(env_filter),
            )
            .try_init()
            .context("installing the global subscriber")?;
    }

    Ok(())
}
