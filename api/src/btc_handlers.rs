//! Bitcoin anchoring info for Stacks transactions and blocks.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult, INVALID_QUERY},
    handlers::{fetch_ok, map_query_rejection, normalize_hash, str_field},
    state::AppState,
    upstream::{FetchRequest, FetchResponse},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockAnchorInfo {
    pub stacks_block_hash: String,
    pub stacks_block_explorer: String,
    pub bitcoin_block_hash: String,
    pub bitcoin_block_explorer: String,
    pub bitcoin_tx: String,
    pub bitcoin_tx_explorer: String,
    pub miner_btc_address: String,
    pub miner_btc_address_explorer: String,
    pub miner_stx_address: String,
    pub miner_stx_address_explorer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxAnchorInfo {
    pub stacks_tx: String,
    pub stacks_tx_explorer: String,
    #[serde(flatten)]
    pub block: BlockAnchorInfo,
}

#[derive(Debug, Deserialize)]
pub struct StxBlockQuery {
    #[serde(rename = "btc-block")]
    pub btc_block: String,
}

#[derive(Debug, Serialize)]
pub struct StxBlockSummary {
    pub height: Value,
    pub hash: Value,
    pub parent_block_hash: Value,
}

/// A block reference given either as a height or a hash.
#[derive(Debug, PartialEq, Eq)]
enum BlockRef {
    Height(u64),
    Hash(String),
}

impl BlockRef {
    fn parse(raw: &str) -> ApiResult<Self> {
        let raw = raw.trim();
        if !raw.is_empty() && raw.len() < 64 && raw.chars().all(|c| c.is_ascii_digit()) {
            return raw.parse().map(BlockRef::Height).map_err(|_| {
                ApiError::bad_request(INVALID_QUERY, format!("block height \"{}\" is out of range", raw))
            });
        }
        normalize_hash(raw).map(BlockRef::Hash)
    }
}

fn strip_0x(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}

/// Input address of the miner's commit transaction, if blockchain.info knows it.
async fn miner_btc_address(state: &AppState, btc_tx: &str) -> String {
    let url = format!("{}/rawtx/{}", state.config.blockchain_info_api, btc_tx);
    match state.fetcher.fetch(FetchRequest::get(url)).await {
        Ok(resp) if resp.ok => resp
            .body
            .pointer("/inputs/0/prev_out/addr")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Ok(resp) => {
            tracing::debug!(status = resp.status, tx = btc_tx, "miner tx lookup failed");
            String::new()
        }
        Err(err) => {
            tracing::debug!(error = %err, tx = btc_tx, "miner tx lookup failed");
            String::new()
        }
    }
}

async fn anchor_info(state: &AppState, block: &FetchResponse) -> ApiResult<BlockAnchorInfo> {
    let stacks_block_hash = str_field(block, "/hash")?.to_string();
    let bitcoin_tx = strip_0x(str_field(block, "/miner_txid")?).to_string();
    let bitcoin_block_hash = strip_0x(str_field(block, "/burn_block_hash")?).to_string();

    let miner_btc_address = miner_btc_address(state, &bitcoin_tx).await;
    // Segwit miners have no base58 form and thus no Stacks counterpart
    let miner_stx_address = if miner_btc_address.is_empty() {
        String::new()
    } else {
        match clarity_codec::translate(&miner_btc_address, None) {
            Ok(info) => info.stacks,
            Err(err) => {
                tracing::debug!(address = %miner_btc_address, error = %err, "miner address not translatable");
                String::new()
            }
        }
    };

    let stx_explorer = &state.config.stacks_explorer;
    let btc_explorer = &state.config.blockchain_explorer;
    Ok(BlockAnchorInfo {
        stacks_block_explorer: format!("{}/block/{}?chain=mainnet", stx_explorer, stacks_block_hash),
        stacks_block_hash,
        bitcoin_block_explorer: format!("{}/btc/block/{}", btc_explorer, bitcoin_block_hash),
        bitcoin_block_hash,
        bitcoin_tx_explorer: format!("{}/btc/tx/{}", btc_explorer, bitcoin_tx),
        bitcoin_tx,
        miner_btc_address_explorer: if miner_btc_address.is_empty() {
            String::new()
        } else {
            format!("{}/btc/address/{}", btc_explorer, miner_btc_address)
        },
        miner_btc_address,
        miner_stx_address_explorer: if miner_stx_address.is_empty() {
            String::new()
        } else {
            format!("{}/address/{}?chain=mainnet", stx_explorer, miner_stx_address)
        },
        miner_stx_address,
    })
}

pub async fn btc_info_from_stx_tx(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> ApiResult<Json<TxAnchorInfo>> {
    let txid = normalize_hash(&txid)?;
    let stacks_api = &state.config.stacks_api;

    let tx = fetch_ok(
        state.fetcher.as_ref(),
        FetchRequest::get(format!("{}/extended/v1/tx/{}", stacks_api, txid)),
    )
    .await?;
    let block_hash = str_field(&tx, "/block_hash")?;
    let block = fetch_ok(
        state.fetcher.as_ref(),
        FetchRequest::get(format!("{}/extended/v1/block/{}", stacks_api, block_hash)),
    )
    .await?;

    let block = anchor_info(&state, &block).await?;
    Ok(Json(TxAnchorInfo {
        stacks_tx_explorer: format!("{}/txid/{}?chain=mainnet", state.config.stacks_explorer, txid),
        stacks_tx: txid,
        block,
    }))
}

pub async fn btc_info_from_stx_block(
    State(state): State<AppState>,
    Path(block): Path<String>,
) -> ApiResult<Json<BlockAnchorInfo>> {
    let stacks_api = &state.config.stacks_api;
    let url = match BlockRef::parse(&block)? {
        BlockRef::Height(h) => format!("{}/extended/v1/block/by_height/{}", stacks_api, h),
        BlockRef::Hash(hash) => format!("{}/extended/v1/block/{}", stacks_api, hash),
    };
    let block = fetch_ok(state.fetcher.as_ref(), FetchRequest::get(url)).await?;
    Ok(Json(anchor_info(&state, &block).await?))
}

pub async fn stx_block(
    State(state): State<AppState>,
    query: Result<Query<StxBlockQuery>, QueryRejection>,
) -> ApiResult<Json<StxBlockSummary>> {
    let Query(params) = query.map_err(map_query_rejection)?;
    let stacks_api = &state.config.stacks_api;
    let url = match BlockRef::parse(&params.btc_block)? {
        BlockRef::Height(h) => format!("{}/extended/v1/block/by_burn_block_height/{}", stacks_api, h),
        BlockRef::Hash(hash) => format!("{}/extended/v1/block/by_burn_block_hash/{}", stacks_api, hash),
    };

    let resp = fetch_ok(state.fetcher.as_ref(), FetchRequest::get(url)).await?;
    let field = |name: &str| resp.body.get(name).cloned().unwrap_or(Value::Null);
    Ok(Json(StxBlockSummary {
        height: field("height"),
        hash: field("hash"),
        parent_block_hash: field("parent_block_hash"),
    }))
}
