//! OpenTelemetry tracing pipeline setup
//!
//! Export is opt-in: the layer is only installed when
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set in the environment.

use opentelemetry::KeyValue;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;

use crate::error::{Error, Result};

/// Build the OTLP tracing layer.
///
/// The exporter endpoint is taken from `OTEL_EXPORTER_OTLP_ENDPOINT` by the
/// OTLP crate itself; spans are tagged with the operator's service name.
pub fn init_telemetry<S>() -> Result<OpenTelemetryLayer<S, sdktrace::Tracer>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic())
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", "atlas-operator"),
        ])))
        .install_batch(runtime::Tokio)
        .map_err(|e| Error::ConfigurationError(format!("failed to initialize OTLP pipeline: {e}")))?;

    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}

/// Flush any remaining spans and shut down the global tracer provider
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
