use super::{ApiQuery, ApiResponse, AppState, reply};
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AllowanceQuery {
    owner: Option<String>,
    spender: Option<String>,
}

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/reserve", get(reserve))
        .route("/name", get(name))
        .route("/symbol", get(symbol))
        .route("/decimals", get(decimals))
        .route("/totalSupply", get(total_supply))
        .route("/balanceOf", get(balance_of))
        .route("/allowance", get(allowance))
}

async fn reserve(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Option<String>>> {
    Json(ApiResponse {
        data: state.proxy.reserve(),
    })
}

async fn name(State(state): State<Arc<AppState>>) -> Response {
    reply("name", state.proxy.name().await)
}

async fn symbol(State(state): State<Arc<AppState>>) -> Response {
    reply("symbol", state.proxy.symbol().await)
}

async fn decimals(State(state): State<Arc<AppState>>) -> Response {
    reply("decimals", state.proxy.decimals().await)
}

async fn total_supply(State(state): State<Arc<AppState>>) -> Response {
    reply("totalSupply", state.proxy.total_supply().await)
}

async fn balance_of(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Response {
    let owner = query.owner.unwrap_or_default();
    reply("balanceOf", state.proxy.balance_of(&owner).await)
}

async fn allowance(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<AllowanceQuery>,
) -> Response {
    let owner = query.owner.unwrap_or_default();
    let spender = query.spender.unwrap_or_default();
    reply("allowance", state.proxy.allowance(&owner, &spender).await)
}
