use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use clarity_codec::{translate, AddressInfo, Network};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult, INVALID_QUERY, UPSTREAM_ERROR},
    handlers::{fetch_ok, map_query_rejection},
    metrics,
    state::AppState,
    upstream::{FetchRequest, FetchResponse},
};

const STX_DECIMALS: u32 = 6;
const BTC_DECIMALS: u32 = 8;

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    pub network: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountBalance {
    pub address: String,
    pub balance: String,
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub stacks: AccountBalance,
    pub bitcoin: AccountBalance,
}

fn parse_network(raw: Option<&str>) -> ApiResult<Option<Network>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => match name.parse::<Network>() {
            Ok(Network::Other) | Err(_) => Err(ApiError::bad_request(
                INVALID_QUERY,
                format!("network must be mainnet or testnet, got \"{}\"", name),
            )),
            Ok(network) => Ok(Some(network)),
        },
    }
}

pub async fn get_address_info(
    Path(address): Path<String>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> ApiResult<Json<AddressInfo>> {
    let Query(params) = query.map_err(map_query_rejection)?;
    let target = parse_network(params.network.as_deref())?;

    let info = translate(address.trim(), target)?;
    metrics::observe_translation("ok");
    Ok(Json(info))
}

/// Integer base units at `pointer`, shifted down by `decimals` places.
fn scaled_amount(resp: &FetchResponse, pointer: &str, decimals: u32) -> ApiResult<String> {
    let units = match resp.body.pointer(pointer) {
        Some(Value::String(s)) => s.parse::<i128>().ok(),
        Some(Value::Number(n)) => n.as_i64().map(i128::from),
        _ => None,
    };
    units
        .and_then(|u| Decimal::try_from_i128_with_scale(u, decimals).ok())
        .map(|d| d.to_string())
        .ok_or_else(|| {
            ApiError::bad_gateway(
                UPSTREAM_ERROR,
                format!("Upstream response has no integer amount at {}", pointer),
            )
            .with_curl(resp.curl.clone())
        })
}

pub async fn get_address_balances(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<BalancesResponse>> {
    let info = translate(address.trim(), Some(Network::Mainnet))?;
    metrics::observe_translation("ok");

    let stx_url = format!(
        "{}/extended/v1/address/{}/balances",
        state.config.stacks_api, info.stacks
    );
    let btc_url = format!(
        "{}/rawaddr/{}?limit=0",
        state.config.blockchain_info_api, info.bitcoin
    );
    let (stx, btc) = tokio::join!(
        fetch_ok(state.fetcher.as_ref(), FetchRequest::get(stx_url)),
        fetch_ok(state.fetcher.as_ref(), FetchRequest::get(btc_url)),
    );
    let (stx, btc) = (stx?, btc?);

    Ok(Json(BalancesResponse {
        stacks: AccountBalance {
            balance: scaled_amount(&stx, "/stx/balance", STX_DECIMALS)?,
            address: info.stacks,
        },
        bitcoin: AccountBalance {
            balance: scaled_amount(&btc, "/final_balance", BTC_DECIMALS)?,
            address: info.bitcoin,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resp(body: Value) -> FetchResponse {
        FetchResponse {
            ok: true,
            status: 200,
            body,
            curl: String::new(),
        }
    }

    #[test]
    fn test_scaled_amount() {
        let stx = resp(json!({ "stx": { "balance": "1234567" } }));
        assert_eq!(scaled_amount(&stx, "/stx/balance", STX_DECIMALS).unwrap(), "1.234567");

        let btc = resp(json!({ "final_balance": 301321000 }));
        assert_eq!(scaled_amount(&btc, "/final_balance", BTC_DECIMALS).unwrap(), "3.01321000");

        let zero = resp(json!({ "final_balance": 0 }));
        assert_eq!(scaled_amount(&zero, "/final_balance", BTC_DECIMALS).unwrap(), "0.00000000");
    }

    #[test]
    fn test_scaled_amount_rejects_garbage() {
        let bad = resp(json!({ "stx": { "balance": "lots" } }));
        assert!(scaled_amount(&bad, "/stx/balance", STX_DECIMALS).is_err());
        assert!(scaled_amount(&bad, "/final_balance", BTC_DECIMALS).is_err());
    }

    #[test]
    fn test_parse_network() {
        assert_eq!(parse_network(None).unwrap(), None);
        assert_eq!(parse_network(Some("")).unwrap(), None);
        assert_eq!(parse_network(Some("Testnet")).unwrap(), Some(Network::Testnet));
        assert!(parse_network(Some("other")).is_err());
        assert!(parse_network(Some("regtest")).is_err());
    }
}
