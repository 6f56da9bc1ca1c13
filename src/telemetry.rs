use std::time::Duration;

use axum::extract::{MatchedPath, State};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use prometheus::{Encoder, Histogram, HistogramOpts, IntGauge, Opts, Registry, TextEncoder};
use tracing::{error, info, info_span, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::AppState;

const METRICS_NAMESPACE: &str = "crud_service";

// Setup tracing, exporting spans over OTLP/HTTP when an endpoint is configured.
// The returned provider must be kept alive and shut down on exit.
pub fn init_tracing(config: &Config) -> anyhow::Result<Option<SdkTracerProvider>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let provider = match &config.otlp_endpoint {
        Some(endpoint) => Some(build_tracer_provider(config, endpoint)?),
        None => None,
    };
    let telemetry_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry_layer)
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(tracing_subscriber::fmt::layer))
        .try_init()?;

    Ok(provider)
}

fn build_tracer_provider(config: &Config, endpoint: &str) -> anyhow::Result<SdkTracerProvider> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()?;

    let resource = Resource::builder()
        .with_attributes(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Prometheus metrics owned by one application state.
///
/// Each state gets its own registry so several routers can coexist in one
/// process (tests build one per case).
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub http_duration_histogram: Histogram,
    pub db_duration_histogram: Histogram,
    pub items_stored: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_duration_histogram = Histogram::with_opts(
            HistogramOpts::new("http_server_duration", "HTTP request duration")
                .namespace(METRICS_NAMESPACE)
                .buckets(prometheus::exponential_buckets(0.005, 2.0, 10)?),
        )?;
        let db_duration_histogram = Histogram::with_opts(
            HistogramOpts::new("db_query_duration", "Database query duration")
                .namespace(METRICS_NAMESPACE)
                .buckets(prometheus::exponential_buckets(0.001, 2.0, 10)?),
        )?;
        let items_stored = IntGauge::with_opts(
            Opts::new("items_stored", "Number of items held in the item store")
                .namespace(METRICS_NAMESPACE),
        )?;

        registry.register(Box::new(http_duration_histogram.clone()))?;
        registry.register(Box::new(db_duration_histogram.clone()))?;
        registry.register(Box::new(items_stored.clone()))?;

        Ok(Metrics {
            registry,
            http_duration_histogram,
            db_duration_histogram,
            items_stored,
        })
    }

    pub fn observe_db(&self, elapsed: Duration) {
        self.db_duration_histogram.observe(elapsed.as_secs_f64());
    }

    pub fn set_items_stored(&self, count: usize) {
        self.items_stored.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Text exposition of every registered metric, with its content type.
    pub fn encode(&self) -> (String, String) {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let encoded = encoder.encode_to_string(&metric_families).unwrap_or_default();
        (encoder.format_type().to_string(), encoded)
    }
}

pub async fn http_tracing_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string());

    let path_display = path.as_deref().unwrap_or(uri.path());

    let span = info_span!(
        "http_request",
        method = %method,
        path = path_display,
        uri = %uri,
        status = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    );

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();
    let status = response.status().as_u16();

    state.metrics.http_duration_histogram.observe(duration.as_secs_f64());

    span.record("status", status);
    span.record("duration_ms", duration.as_millis());

    if status >= 500 {
        error!(parent: &span, method = %method, path = path_display, status, duration_ms = duration.as_millis(), "HTTP request completed");
    } else if status >= 400 {
        warn!(parent: &span, method = %method, path = path_display, status, duration_ms = duration.as_millis(), "HTTP request completed");
    } else {
        info!(parent: &span, method = %method, path = path_display, status, duration_ms = duration.as_millis(), "HTTP request completed");
    }

    response
}
