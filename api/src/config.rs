//! Service configuration
//! Reads upstream endpoints, listener address and cache tuning from the environment

use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_STACKS_API: &str = "https://stacks-node-api.mainnet.stacks.co";
pub const DEFAULT_BLOCKCHAIN_INFO_API: &str = "https://blockchain.info";
pub const DEFAULT_STACKS_EXPLORER: &str = "https://explorer.stacks.co";
pub const DEFAULT_BLOCKCHAIN_EXPLORER: &str = "https://www.blockchain.com";
/// Sender used for read-only calls when the caller does not name one.
pub const DEFAULT_SENDER: &str = "STM9EQRAB3QAKF8NKTP15WJT7VHH4EWG3DJB4W29";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Chain-tip response cache tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTipCacheConfig {
    pub enabled: bool,
    /// Minimum time between two reads of the upstream chain tip.
    pub refresh_interval: Duration,
    pub max_capacity: u64,
}

impl Default for ChainTipCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_interval: Duration::from_millis(2_000),
            max_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub stacks_api: String,
    pub blockchain_info_api: String,
    pub stacks_explorer: String,
    pub blockchain_explorer: String,
    pub default_sender: String,
    pub fetch_timeout: Duration,
    pub cache: ChainTipCacheConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            stacks_api: DEFAULT_STACKS_API.to_string(),
            blockchain_info_api: DEFAULT_BLOCKCHAIN_INFO_API.to_string(),
            stacks_explorer: DEFAULT_STACKS_EXPLORER.to_string(),
            blockchain_explorer: DEFAULT_BLOCKCHAIN_EXPLORER.to_string(),
            default_sender: DEFAULT_SENDER.to_string(),
            fetch_timeout: Duration::from_millis(15_000),
            cache: ChainTipCacheConfig::default(),
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if v == "true" || v == "1" => Ok(true),
        Some(v) if v == "false" || v == "0" => Ok(false),
        Some(v) => Err(ConfigError::InvalidValue {
            name,
            value: v,
            reason: "expected true or false".to_string(),
        }),
    }
}

fn endpoint<F>(lookup: &F, name: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    let trimmed = value.trim().trim_end_matches('/').to_string();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            name,
            value,
            reason: "must be an http(s) URL".to_string(),
        });
    }
    Ok(trimmed)
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let fetch_timeout_ms = parse_var(&lookup, "FETCH_TIMEOUT_MS", 15_000u64)?;
        // Between 1 ms and 2 minutes
        if !(1..=120_000).contains(&fetch_timeout_ms) {
            return Err(ConfigError::InvalidConfig(
                "FETCH_TIMEOUT_MS must be between 1 and 120000".to_string(),
            ));
        }

        let refresh_ms = parse_var(&lookup, "CHAIN_TIP_REFRESH_MS", 2_000u64)?;
        let max_capacity = parse_var(&lookup, "CHAIN_TIP_CACHE_MAX_CAPACITY", 10_000u64)?;
        if max_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "CHAIN_TIP_CACHE_MAX_CAPACITY must be positive".to_string(),
            ));
        }

        let default_sender = lookup("DEFAULT_SENDER").unwrap_or(defaults.default_sender);
        if clarity_codec::c32::address_decode(default_sender.trim()).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "DEFAULT_SENDER",
                value: default_sender,
                reason: "not a Stacks address".to_string(),
            });
        }

        let config = ApiConfig {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            stacks_api: endpoint(&lookup, "STACKS_API_ENDPOINT", DEFAULT_STACKS_API)?,
            blockchain_info_api: endpoint(&lookup, "BLOCKCHAIN_INFO_API_ENDPOINT", DEFAULT_BLOCKCHAIN_INFO_API)?,
            stacks_explorer: endpoint(&lookup, "STACKS_EXPLORER_ENDPOINT", DEFAULT_STACKS_EXPLORER)?,
            blockchain_explorer: endpoint(&lookup, "BLOCKCHAIN_EXPLORER_ENDPOINT", DEFAULT_BLOCKCHAIN_EXPLORER)?,
            default_sender: default_sender.trim().to_string(),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            cache: ChainTipCacheConfig {
                enabled: parse_bool(&lookup, "CHAIN_TIP_CACHE_ENABLED", true)?,
                refresh_interval: Duration::from_millis(refresh_ms),
                max_capacity,
            },
        };

        info!(
            "Configuration loaded: stacks_api={}, blockchain_info_api={}, fetch_timeout={:?}, cache_enabled={}",
            config.stacks_api, config.blockchain_info_api, config.fetch_timeout, config.cache.enabled
        );

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
