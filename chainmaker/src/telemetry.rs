//! Logging setup, with optional `OpenTelemetry` trace export.
//!
//! [`Telemetry`] installs a `tracing` subscriber writing to stderr. With the
//! `telemetry` feature and `OTEL_EXPORTER_OTLP_*` variables present, spans
//! are also exported over OTLP/HTTP.

#[cfg(feature = "telemetry")]
use std::env;

#[cfg(feature = "telemetry")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "telemetry")]
use opentelemetry::{KeyValue, Value};
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
#[cfg(feature = "telemetry")]
use opentelemetry_semantic_conventions::{SCHEMA_URL, attribute::SERVICE_VERSION};
#[cfg(feature = "telemetry")]
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve an env var with a programmatic fallback.
#[cfg(feature = "telemetry")]
fn resolve_env(env_key: &str, fallback: Option<&str>) -> Option<Value> {
    env::var(env_key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Value::from)
        .or_else(|| fallback.map(|v| Value::from(v.to_owned())))
}

/// Whether any OTLP exporter variable is set.
#[cfg(feature = "telemetry")]
fn otlp_configured() -> bool {
    env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
        || env::var("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT").is_ok()
        || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
}

/// Log filter for the given verbosity flags, used when `RUST_LOG` is unset.
#[must_use]
pub const fn log_level(verbose: bool, debug: bool) -> &'static str {
    if debug {
        "trace"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Service identity and log level for the subscriber.
///
/// Values can be set programmatically or overridden via `OTEL_SERVICE_NAME`
/// and `OTEL_SERVICE_VERSION`.
#[derive(Debug, Default)]
#[cfg_attr(not(feature = "telemetry"), allow(dead_code))]
pub struct Telemetry {
    name: Option<&'static str>,
    version: Option<&'static str>,
    log_level: Option<String>,
}

impl Telemetry {
    /// Creates a new, empty [`Telemetry`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name.
    #[must_use]
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Sets the service version.
    #[must_use]
    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the log level filter used when `RUST_LOG` is not set.
    ///
    /// Accepts any valid [`EnvFilter`] directive string (e.g. `"debug"`,
    /// `"chainmaker=trace"`).
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Builds an `OpenTelemetry` [`Resource`] from the resolved service identity.
    #[cfg(feature = "telemetry")]
    fn resource(&self) -> Resource {
        let name = resolve_env("OTEL_SERVICE_NAME", self.name);
        let version = resolve_env("OTEL_SERVICE_VERSION", self.version);

        let mut builder = Resource::builder();
        if let Some(name) = name {
            builder = builder.with_service_name(name);
        }
        if let Some(version) = version {
            builder =
                builder.with_schema_url([KeyValue::new(SERVICE_VERSION, version)], SCHEMA_URL);
        }
        builder.build()
    }

    /// Initializes the tracer provider. A one-shot run exports each span as
    /// it closes rather than batching.
    #[cfg(feature = "telemetry")]
    fn init_tracer(&self) -> Option<SdkTracerProvider> {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .build()
            .ok()?;
        Some(
            SdkTracerProvider::builder()
                .with_resource(self.resource())
                .with_simple_exporter(exporter)
                .build(),
        )
    }

    /// Registers the global subscriber.
    ///
    /// Returns [`TelemetryGuard`] that flushes exporters on drop.
    pub fn register(self) -> TelemetryGuard {
        let fallback = self.log_level.as_deref().unwrap_or("info");
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into());
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        #[cfg(feature = "telemetry")]
        {
            let tracer_provider = otlp_configured().then(|| self.init_tracer()).flatten();
            let otel_layer = tracer_provider
                .as_ref()
                .map(|tp| OpenTelemetryLayer::new(tp.tracer("chainmaker")));
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .with(otel_layer)
                .init();
            if tracer_provider.is_some() {
                tracing::debug!("OpenTelemetry trace exporter registered");
            }
            TelemetryGuard { tracer_provider }
        }

        #[cfg(not(feature = "telemetry"))]
        {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .init();
            TelemetryGuard {}
        }
    }
}

/// Owns the tracer provider; performs graceful shutdown on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if let Some(ref tp) = self.tracer_provider
            && let Err(err) = tp.shutdown()
        {
            tracing::error!(?err, "tracer provider shutdown error");
        }
    }
}
