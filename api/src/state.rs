use crate::cache::ChainTipCache;
use crate::config::ApiConfig;
use crate::upstream::JsonFetcher;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub fetcher: Arc<dyn JsonFetcher>,
    pub cache: Arc<ChainTipCache>,
    pub started_at: Instant,
    pub registry: Registry,
}

impl AppState {
    pub fn new(config: ApiConfig, fetcher: Arc<dyn JsonFetcher>, registry: Registry) -> Self {
        let cache = ChainTipCache::new(&config, fetcher.clone());
        Self {
            config: Arc::new(config),
            fetcher,
            cache: Arc::new(cache),
            started_at: Instant::now(),
            registry,
        }
    }
}
