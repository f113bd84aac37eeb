use anyhow::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::runtime::Tokio;
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::metrics;

pub const METRICS_PREFIX: &str = "stxbtc";

pub struct Observability {
    pub registry: Registry,
}

impl Observability {
    pub fn init() -> Result<Self> {
        let registry = new_registry(METRICS_PREFIX)?;

        let otel_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
        let otel_layer = match &otel_endpoint {
            Some(endpoint) => {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(endpoint)
                    .build()?;

                let tracer_provider = opentelemetry_sdk::trace::TracerProvider::builder()
                    .with_batch_exporter(exporter, Tokio)
                    .with_resource(opentelemetry_sdk::Resource::new(vec![KeyValue::new(
                        "service.name",
                        "stx-btc-api",
                    )]))
                    .build();

                let tracer = tracer_provider.tracer("stx-btc-api");
                opentelemetry::global::set_tracer_provider(tracer_provider);
                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            }
            None => None,
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "api=debug,tower_http=debug".into());

        let json_logs = std::env::var("LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let (plain, json) = if json_logs {
            (None, Some(tracing_subscriber::fmt::layer().json()))
        } else {
            (Some(tracing_subscriber::fmt::layer()), None)
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(plain)
            .with(json)
            .with(otel_layer)
            .try_init()?;

        match otel_endpoint {
            Some(endpoint) => tracing::info!("Observability stack initialized (Prometheus + OTel → {})", endpoint),
            None => tracing::info!("Observability stack initialized (Prometheus, OTel export disabled)"),
        }
        Ok(Self { registry })
    }

    pub fn shutdown() {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

/// Prefixed registry with every service metric registered.
pub fn new_registry(prefix: &str) -> Result<Registry> {
    let registry = Registry::new_custom(Some(prefix.into()), None)?;
    metrics::register_all(&registry)?;
    Ok(registry)
}
