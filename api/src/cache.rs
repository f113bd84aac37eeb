//! Response cache tied to the Stacks chain tip.
//!
//! Query helper responses only change when a new block lands, so entries are
//! kept until the node reports a different `stacks_tip` and are then flushed
//! together. The tip is polled lazily, at most once per refresh interval.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::future::Cache as MokaCache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::{ApiConfig, ChainTipCacheConfig};
use crate::error::ApiError;
use crate::metrics;
use crate::upstream::{FetchRequest, JsonFetcher};

/// A buffered 200 response with the headers its handler set.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    headers: HeaderMap,
    body: Bytes,
}

#[derive(Debug, Default)]
struct TipState {
    tip: Option<String>,
    checked_at: Option<Instant>,
}

pub struct ChainTipCache {
    config: ChainTipCacheConfig,
    info_url: String,
    fetcher: Arc<dyn JsonFetcher>,
    tip: RwLock<TipState>,
    responses: MokaCache<String, CachedResponse>,
}

impl ChainTipCache {
    pub fn new(config: &ApiConfig, fetcher: Arc<dyn JsonFetcher>) -> Self {
        let responses = MokaCache::builder()
            .max_capacity(config.cache.max_capacity)
            .build();
        Self {
            config: config.cache.clone(),
            info_url: format!("{}/v2/info", config.stacks_api),
            fetcher,
            tip: RwLock::new(TipState::default()),
            responses,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn is_fresh(state: &TipState, interval: Duration) -> bool {
        state
            .checked_at
            .map(|at| at.elapsed() < interval)
            .unwrap_or(false)
    }

    /// Current chain tip, or `None` when the node could not be read.
    pub async fn current_tip(&self) -> Option<String> {
        {
            let state = self.tip.read().await;
            if Self::is_fresh(&state, self.config.refresh_interval) {
                return state.tip.clone();
            }
        }

        let mut state = self.tip.write().await;
        // Another request may have refreshed while we waited for the lock
        if Self::is_fresh(&state, self.config.refresh_interval) {
            return state.tip.clone();
        }

        let latest = self.read_tip().await;
        if latest.is_none() || latest != state.tip {
            if state.tip.is_some() {
                self.responses.invalidate_all();
                metrics::CACHE_INVALIDATIONS.inc();
                tracing::debug!(previous = ?state.tip, current = ?latest, "chain tip changed, cache flushed");
            }
            state.tip = latest;
        }
        state.checked_at = Some(Instant::now());
        state.tip.clone()
    }

    /// Last tip seen, without polling the node.
    async fn known_tip(&self) -> Option<String> {
        self.tip.read().await.tip.clone()
    }

    async fn read_tip(&self) -> Option<String> {
        let result = self.fetcher.fetch(FetchRequest::get(&self.info_url)).await;
        let tip = match result {
            Ok(resp) if resp.ok => resp
                .body
                .get("stacks_tip")
                .and_then(|t| t.as_str())
                .map(str::to_string),
            _ => None,
        };
        if tip.is_none() {
            metrics::CHAIN_TIP_REFRESH_FAILURES.inc();
            tracing::warn!(url = %self.info_url, "unable to read chain tip, bypassing cache");
        }
        tip
    }

    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.responses.get(key).await
    }

    pub async fn put(&self, key: String, value: CachedResponse) {
        self.responses.insert(key, value).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.responses.entry_count()
    }

    #[cfg(test)]
    async fn sync(&self) {
        self.responses.run_pending_tasks().await;
    }
}

fn etag_for(tip: &str) -> String {
    let digest = Sha256::digest(tip.as_bytes());
    format!("\"{}\"", hex::encode(&digest[..16]))
}

fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').any(|candidate| {
            let candidate = candidate.trim();
            candidate == "*" || candidate.trim_start_matches("W/") == etag
        }))
        .unwrap_or(false)
}

fn with_etag(mut response: Response, etag: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

fn cached_into_response(cached: CachedResponse) -> Response {
    let mut response = (StatusCode::OK, cached.body).into_response();
    *response.headers_mut() = cached.headers;
    response
}

/// Entries are keyed by tip as well as URI, so a response computed under one
/// tip is never served under another.
fn cache_key(tip: &str, req: &Request) -> String {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path());
    format!("{}:{}", tip, target)
}

/// Middleware serving GET requests from the chain-tip cache
pub async fn chain_tip_cache(
    State(cache): State<Arc<ChainTipCache>>,
    req: Request,
    next: Next,
) -> Response {
    if !cache.enabled() || req.method() != Method::GET {
        return next.run(req).await;
    }

    let Some(tip) = cache.current_tip().await else {
        return next.run(req).await;
    };
    let etag = etag_for(&tip);
    let key = cache_key(&tip, &req);

    // Only a response that is already cached for this tip can be unchanged.
    if let Some(cached) = cache.get(&key).await {
        if etag_matches(req.headers(), &etag) {
            metrics::CACHE_NOT_MODIFIED.inc();
            return with_etag(StatusCode::NOT_MODIFIED.into_response(), &etag);
        }
        metrics::CACHE_HITS.inc();
        return with_etag(cached_into_response(cached), &etag);
    }
    metrics::CACHE_MISSES.inc();

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ApiError::internal("CACHE_ERROR", format!("failed to buffer response: {}", e))
                .into_response()
        }
    };
    if cache.known_tip().await.as_deref() == Some(tip.as_str()) {
        cache
            .put(
                key,
                CachedResponse {
                    headers: parts.headers.clone(),
                    body: bytes.clone(),
                },
            )
            .await;
    } else {
        tracing::debug!(tip = %tip, "chain tip moved during request, response not cached");
    }

    with_etag(Response::from_parts(parts, Body::from(bytes)), &etag)
}
