use axum::{middleware, routing::get, Router};

use crate::{
    address_handlers, btc_handlers, cache, clarity_handlers, handlers, metrics_handler,
    query_handlers, state::AppState,
};

pub fn observability_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler::metrics_endpoint))
}

pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::status))
        .route("/status", get(handlers::status))
}

pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/addr/:address", get(address_handlers::get_address_info))
        .route("/addr/:address/balances", get(address_handlers::get_address_balances))
}

pub fn btc_routes() -> Router<AppState> {
    Router::new()
        .route("/btc-info-from-stx-tx/:txid", get(btc_handlers::btc_info_from_stx_tx))
        .route("/btc-info-from-stx-block/:block", get(btc_handlers::btc_info_from_stx_block))
        .route("/stx-block", get(btc_handlers::stx_block))
}

pub fn clarity_routes() -> Router<AppState> {
    Router::new()
        .route("/clarity-decode/:value", get(clarity_handlers::clarity_decode))
        .route("/clarity-encode/:value", get(clarity_handlers::clarity_encode))
}

/// Clarity query helpers, served through the chain-tip cache.
pub fn query_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/data-var/:address/:contract/:var", get(query_handlers::get_data_var))
        .route(
            "/map-entry/:address/:contract/:map/:key",
            get(query_handlers::get_map_entry),
        )
        .route(
            "/call-fn/:address/:contract/:fn",
            get(query_handlers::call_read_only_fn),
        )
        .route_layer(middleware::from_fn_with_state(
            state.cache.clone(),
            cache::chain_tip_cache,
        ))
}
