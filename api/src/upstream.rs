//! JSON client for the Stacks node API and blockchain.info.

use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Get,
    Post,
}

impl FetchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMethod::Get => "GET",
            FetchMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub method: FetchMethod,
    pub body: Option<Value>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::Get,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::Post,
            body: Some(body),
        }
    }

    /// Equivalent `curl` invocation, for the `x-curl-equiv` header.
    pub fn curl(&self) -> String {
        let mut cmd = format!("curl -i -X {} '{}'", self.method.as_str(), self.url);
        if let Some(body) = &self.body {
            let escaped = body.to_string().replace('\'', "'\\''");
            cmd.push_str(&format!(
                " -H 'Content-Type: application/json' -d '{}'",
                escaped
            ));
        }
        cmd
    }

    fn host(&self) -> &str {
        self.url
            .split("://")
            .nth(1)
            .and_then(|rest| rest.split(['/', '?']).next())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// Whether the upstream status was 2xx.
    pub ok: bool,
    pub status: u16,
    pub body: Value,
    pub curl: String,
}

impl FetchResponse {
    /// Status and body, as attached to upstream error details.
    pub fn summary(&self) -> Value {
        serde_json::json!({ "status": self.status, "response": self.body })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{method} {url} - error performing fetch: {message}")]
    Network {
        method: &'static str,
        url: String,
        message: String,
    },
    #[error("{method} {url} - error reading response {status}: {message}")]
    Read {
        method: &'static str,
        url: String,
        status: u16,
        message: String,
    },
    #[error("{method} {url} - error parsing JSON response {status}: {body}")]
    Parse {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
}

impl FetchError {
    fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::Read { .. } => "read",
            FetchError::Parse { .. } => "parse",
        }
    }
}

/// Source of upstream JSON documents
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed fetcher. Calls are never retried.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stx-btc-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let method = request.method.as_str();
        let mut builder = match request.method {
            FetchMethod::Get => self.client.get(&request.url),
            FetchMethod::Post => self.client.post(&request.url),
        }
        .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| FetchError::Network {
            method,
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| FetchError::Read {
            method,
            url: request.url.clone(),
            status: status.as_u16(),
            message: e.to_string(),
        })?;

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(body) => body,
            // Error pages are often plain text; keep them for the caller.
            Err(_) if !status.is_success() => Value::String(text),
            Err(_) => {
                return Err(FetchError::Parse {
                    method,
                    url: request.url.clone(),
                    status: status.as_u16(),
                    body: text,
                })
            }
        };

        Ok(FetchResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            body,
            curl: request.curl(),
        })
    }
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let result = self.send(&request).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(resp) => {
                metrics::observe_upstream(request.host(), resp.status, elapsed);
                tracing::debug!(
                    method = request.method.as_str(),
                    url = %request.url,
                    status = resp.status,
                    "upstream fetch completed"
                );
            }
            Err(err) => {
                metrics::observe_upstream_failure(request.host(), err.kind());
                tracing::warn!(error = %err, "upstream fetch failed");
            }
        }
        result
    }
}
