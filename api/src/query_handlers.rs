//! Clarity query helpers: data vars, map entries and read-only calls,
//! decoded to JSON.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use clarity_codec::{
    decode_hex, find_function, find_map, match_args, match_map_key, unwrap_value, ArgEncoding,
    ContractInterface,
};
use serde_json::{json, Value};

use crate::{
    error::{
        ApiError, ApiResult, CALL_READ_ERROR, CONTRACT_ABI_ERROR, CONTRACT_DATA_MAP_READ_ERROR,
        CONTRACT_DATA_VAR_READ_ERROR, INVALID_QUERY,
    },
    handlers::map_query_rejection,
    state::AppState,
    upstream::{FetchRequest, FetchResponse},
};

const CURL_HEADER: HeaderName = HeaderName::from_static("x-curl-equiv");

/// Raw query pairs; `arg` may repeat.
#[derive(Debug, Default)]
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn from_query(query: Result<Query<Vec<(String, String)>>, QueryRejection>) -> ApiResult<Self> {
        let Query(pairs) = query.map_err(map_query_rejection)?;
        Ok(Self(pairs))
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn all(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Boolean flag; a bare `?flag` counts as set.
    fn flag(&self, name: &str) -> ApiResult<bool> {
        match self.get(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) if v.is_empty() || v == "true" || v == "1" => Ok(true),
            Some(v) if v == "false" || v == "0" => Ok(false),
            Some(v) => Err(ApiError::bad_request(
                INVALID_QUERY,
                format!("{} must be true or false, got \"{}\"", name, v),
            )),
        }
    }
}

fn upstream_failure(code: &str, what: &str, resp: FetchResponse) -> ApiError {
    ApiError::bad_request(code, format!("Error {}: upstream status {}", what, resp.status))
        .with_details(resp.summary())
        .with_curl(resp.curl)
}

fn decode_result(hex: &str, no_unwrap: bool) -> ApiResult<Value> {
    let value = decode_hex(hex).map_err(|e| ApiError::deserialize(hex, e))?;
    if no_unwrap {
        Ok(value.to_json())
    } else {
        Ok(unwrap_value(value).to_json())
    }
}

fn json_with_curl(body: Value, curl: &str) -> Response {
    let mut response = Json(body).into_response();
    if let Ok(value) = HeaderValue::from_str(curl) {
        response.headers_mut().insert(CURL_HEADER, value);
    }
    response
}

async fn fetch_contract_interface(
    state: &AppState,
    address: &str,
    contract: &str,
) -> ApiResult<ContractInterface> {
    let url = format!(
        "{}/v2/contracts/interface/{}/{}",
        state.config.stacks_api, address, contract
    );
    let resp = state.fetcher.fetch(FetchRequest::get(url)).await?;
    if !resp.ok {
        return Err(ApiError::bad_request(
            CONTRACT_ABI_ERROR,
            format!("Error fetching contract ABI: upstream status {}", resp.status),
        )
        .with_details(resp.summary())
        .with_curl(resp.curl));
    }
    serde_json::from_value(resp.body).map_err(|e| {
        ApiError::bad_gateway(CONTRACT_ABI_ERROR, format!("Malformed contract ABI: {}", e))
    })
}

/// Non-empty `data` string of a data-var or map-entry reply.
fn data_field(resp: &FetchResponse) -> Option<String> {
    resp.body
        .get("data")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

pub async fn get_data_var(
    State(state): State<AppState>,
    Path((address, contract, var)): Path<(String, String, String)>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Response> {
    let params = QueryParams::from_query(query)?;
    let no_unwrap = params.flag("no_unwrap")?;

    let url = format!(
        "{}/v2/data_var/{}/{}/{}?proof=0",
        state.config.stacks_api, address, contract, var
    );
    let resp = state.fetcher.fetch(FetchRequest::get(url)).await?;
    let data = match data_field(&resp) {
        Some(data) if resp.ok => data,
        _ => return Err(upstream_failure(CONTRACT_DATA_VAR_READ_ERROR, "contract data var read", resp)),
    };

    tracing::debug!(address = %address, contract = %contract, var = %var, "data var read");
    Ok(json_with_curl(decode_result(&data, no_unwrap)?, &resp.curl))
}

pub async fn get_map_entry(
    State(state): State<AppState>,
    Path((address, contract, map, key)): Path<(String, String, String, String)>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Response> {
    let params = QueryParams::from_query(query)?;
    let no_unwrap = params.flag("no_unwrap")?;
    let encoding = ArgEncoding::from_flag(params.flag("key_encoded")?);

    let abi = fetch_contract_interface(&state, &address, &contract).await?;
    let map_abi = find_map(&abi, &map)?;
    let encoded_key = match_map_key(&key, map_abi, encoding)?;

    let url = format!(
        "{}/v2/map_entry/{}/{}/{}?proof=0",
        state.config.stacks_api, address, contract, map
    );
    let resp = state
        .fetcher
        .fetch(FetchRequest::post(url, json!(encoded_key)))
        .await?;
    let data = match data_field(&resp) {
        Some(data) if resp.ok => data,
        _ => return Err(upstream_failure(CONTRACT_DATA_MAP_READ_ERROR, "contract map read", resp)),
    };

    let body = decode_result(&data, no_unwrap)?;
    Ok(json_with_curl(body, &resp.curl))
}

pub async fn call_read_only_fn(
    State(state): State<AppState>,
    Path((address, contract, function)): Path<(String, String, String)>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Response> {
    let params = QueryParams::from_query(query)?;
    let no_unwrap = params.flag("no_unwrap")?;
    let encoding = ArgEncoding::from_flag(params.flag("args_encoded")?);
    let sender = params
        .get("sender")
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| state.config.default_sender.clone());

    let abi = fetch_contract_interface(&state, &address, &contract).await?;
    let function_abi = find_function(&abi, &function)?;
    let arguments = match_args(&params.all("arg"), &function_abi.args, encoding)?;

    let url = format!(
        "{}/v2/contracts/call-read/{}/{}/{}",
        state.config.stacks_api, address, contract, function
    );
    let resp = state
        .fetcher
        .fetch(FetchRequest::post(
            url,
            json!({ "sender": sender, "arguments": arguments }),
        ))
        .await?;

    let okay = resp.body.get("okay").and_then(Value::as_bool).unwrap_or(false);
    let result = resp.body.get("result").and_then(Value::as_str).map(str::to_string);
    let result = match result {
        Some(result) if resp.ok && okay => result,
        _ => return Err(upstream_failure(CALL_READ_ERROR, "performing call-read", resp)),
    };

    tracing::debug!(contract = %contract, function = %function, "read-only call completed");
    let body = decode_result(&result, no_unwrap)?;
    Ok(json_with_curl(body, &resp.curl))
}
