use axum::{
    extract::{rejection::QueryRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{ApiError, ApiResult, INVALID_QUERY, NOT_FOUND, UPSTREAM_ERROR},
    state::AppState,
    upstream::{FetchRequest, FetchResponse, JsonFetcher},
};

pub(crate) fn map_query_rejection(err: QueryRejection) -> ApiError {
    ApiError::bad_request(INVALID_QUERY, format!("Invalid query parameters: {}", err.body_text()))
}

/// Fetch a document that must come back with a 2xx status.
pub(crate) async fn fetch_ok(fetcher: &dyn JsonFetcher, request: FetchRequest) -> ApiResult<FetchResponse> {
    let resp = fetcher.fetch(request).await?;
    if !resp.ok {
        return Err(ApiError::bad_gateway(
            UPSTREAM_ERROR,
            format!("Upstream request failed with status {}", resp.status),
        )
        .with_details(resp.summary())
        .with_curl(resp.curl));
    }
    Ok(resp)
}

/// String field at a JSON pointer of an upstream document.
pub(crate) fn str_field<'a>(resp: &'a FetchResponse, pointer: &str) -> ApiResult<&'a str> {
    resp.body.pointer(pointer).and_then(Value::as_str).ok_or_else(|| {
        ApiError::bad_gateway(
            UPSTREAM_ERROR,
            format!("Upstream response is missing string field {}", pointer),
        )
        .with_curl(resp.curl.clone())
    })
}

/// `0x`-prefixed lowercase form of a 32-byte hex hash.
pub(crate) fn normalize_hash(input: &str) -> ApiResult<String> {
    let lower = input.to_lowercase();
    let digits = lower.strip_prefix("0x").unwrap_or(&lower);
    if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::bad_request(
            INVALID_QUERY,
            format!("\"{}\" is not a 32-byte hex hash", input),
        ));
    }
    Ok(format!("0x{}", digits))
}

pub async fn status(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let uptime = state.started_at.elapsed().as_secs();
    tracing::info!(uptime_secs = uptime, "status check");
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn route_not_found() -> ApiError {
    ApiError::not_found(NOT_FOUND, "Route not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hash() {
        let bare = "C4778249D7AF16D004D5344BE2683FAE5C9263E22D5A2CDD6E1ABF38BBDB8FA3";
        let expected = format!("0x{}", bare.to_lowercase());
        assert_eq!(normalize_hash(bare).unwrap(), expected);
        assert_eq!(normalize_hash(&expected).unwrap(), expected);
        assert!(normalize_hash("0x1234").is_err());
        assert!(normalize_hash(&"z".repeat(64)).is_err());
    }

    #[test]
    fn test_str_field() {
        let resp = FetchResponse {
            ok: true,
            status: 200,
            body: json!({ "stx": { "balance": "100" } }),
            curl: String::new(),
        };
        assert_eq!(str_field(&resp, "/stx/balance").unwrap(), "100");
        let err = str_field(&resp, "/stx/locked").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
