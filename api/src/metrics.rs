use once_cell::sync::Lazy;
use prometheus::{
    opts, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry,
    TextEncoder,
};

macro_rules! counter_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| IntCounterVec::new(opts!($name, $help), $labels).unwrap())
    };
}
macro_rules! histogram_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| {
            HistogramVec::new(HistogramOpts::new($name, $help).buckets(LATENCY_BUCKETS.to_vec()), $labels)
                .unwrap()
        })
    };
}
macro_rules! counter {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntCounter::new($name, $help).unwrap())
    };
}
macro_rules! gauge {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntGauge::new($name, $help).unwrap())
    };
}

const LATENCY_BUCKETS: [f64; 13] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

// ── HTTP ────────────────────────────────────────────────────────────────────
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("http_requests_total", "Total HTTP requests", &["method", "path", "status"]);
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> =
    histogram_vec!("http_request_duration_seconds", "HTTP request latency", &["method", "path"]);
pub static HTTP_IN_FLIGHT: Lazy<IntGauge> = gauge!("http_requests_in_flight", "In-flight HTTP requests");

// ── Upstream ────────────────────────────────────────────────────────────────
pub static UPSTREAM_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("upstream_requests_total", "Upstream fetches by host and status", &["host", "status"]);
pub static UPSTREAM_REQUEST_DURATION: Lazy<HistogramVec> =
    histogram_vec!("upstream_request_duration_seconds", "Upstream fetch latency", &["host"]);
pub static UPSTREAM_FAILURES: Lazy<IntCounterVec> =
    counter_vec!("upstream_failures_total", "Upstream fetches that produced no response", &["host", "kind"]);

// ── Codec ───────────────────────────────────────────────────────────────────
pub static ADDRESS_TRANSLATIONS: Lazy<IntCounterVec> =
    counter_vec!("address_translations_total", "Address translations by outcome", &["outcome"]);
pub static CLARITY_ENCODE_FAILURES: Lazy<IntCounter> =
    counter!("clarity_encode_failures_total", "Clarity values that could not be encoded");
pub static CLARITY_DECODE_FAILURES: Lazy<IntCounter> =
    counter!("clarity_decode_failures_total", "Clarity values that could not be decoded");

// ── Chain-tip cache ─────────────────────────────────────────────────────────
pub static CACHE_HITS: Lazy<IntCounter> = counter!("cache_hits_total", "Cache hits");
pub static CACHE_MISSES: Lazy<IntCounter> = counter!("cache_misses_total", "Cache misses");
pub static CACHE_NOT_MODIFIED: Lazy<IntCounter> =
    counter!("cache_not_modified_total", "Requests answered with 304 Not Modified");
pub static CACHE_INVALIDATIONS: Lazy<IntCounter> =
    counter!("cache_invalidations_total", "Cache flushes caused by a new chain tip");
pub static CHAIN_TIP_REFRESH_FAILURES: Lazy<IntCounter> =
    counter!("chain_tip_refresh_failures_total", "Failed reads of the upstream chain tip");

pub fn register_all(r: &Registry) -> Result<(), prometheus::Error> {
    r.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    r.register(Box::new(HTTP_IN_FLIGHT.clone()))?;
    r.register(Box::new(UPSTREAM_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(UPSTREAM_REQUEST_DURATION.clone()))?;
    r.register(Box::new(UPSTREAM_FAILURES.clone()))?;
    r.register(Box::new(ADDRESS_TRANSLATIONS.clone()))?;
    r.register(Box::new(CLARITY_ENCODE_FAILURES.clone()))?;
    r.register(Box::new(CLARITY_DECODE_FAILURES.clone()))?;
    r.register(Box::new(CACHE_HITS.clone()))?;
    r.register(Box::new(CACHE_MISSES.clone()))?;
    r.register(Box::new(CACHE_NOT_MODIFIED.clone()))?;
    r.register(Box::new(CACHE_INVALIDATIONS.clone()))?;
    r.register(Box::new(CHAIN_TIP_REFRESH_FAILURES.clone()))?;
    Ok(())
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

pub fn observe_http(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn observe_upstream(host: &str, status: u16, duration_secs: f64) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[host, &status.to_string()])
        .inc();
    UPSTREAM_REQUEST_DURATION
        .with_label_values(&[host])
        .observe(duration_secs);
}

pub fn observe_upstream_failure(host: &str, kind: &str) {
    UPSTREAM_FAILURES.with_label_values(&[host, kind]).inc();
}

pub fn observe_translation(outcome: &str) {
    ADDRESS_TRANSLATIONS.with_label_values(&[outcome]).inc();
}
