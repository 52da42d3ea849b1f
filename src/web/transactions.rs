use super::token::OwnerQuery;
use super::{ApiQuery, ApiResponse, AppState, reply};
use crate::audit::TransactionLogEntry;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct TransferQuery {
    sender: Option<String>,
    to: Option<String>,
    value: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransferFromQuery {
    sender: Option<String>,
    from: Option<String>,
    to: Option<String>,
    value: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApproveQuery {
    sender: Option<String>,
    spender: Option<String>,
    value: Option<String>,
    tag: Option<String>,
}

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/transfer", get(transfer))
        .route("/transferFrom", get(transfer_from))
        .route("/approve", get(approve))
        .route("/log", get(log))
}

async fn transfer(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<TransferQuery>,
) -> Response {
    let res = state
        .proxy
        .transfer(
            q.sender.as_deref().unwrap_or_default(),
            q.to.as_deref().unwrap_or_default(),
            q.value.as_deref().unwrap_or_default(),
            q.tag.as_deref(),
        )
        .await;
    reply("transfer", res)
}

async fn transfer_from(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<TransferFromQuery>,
) -> Response {
    let res = state
        .proxy
        .transfer_from(
            q.sender.as_deref().unwrap_or_default(),
            q.from.as_deref().unwrap_or_default(),
            q.to.as_deref().unwrap_or_default(),
            q.value.as_deref().unwrap_or_default(),
            q.tag.as_deref(),
        )
        .await;
    reply("transferFrom", res)
}

async fn approve(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<ApproveQuery>,
) -> Response {
    let res = state
        .proxy
        .approve(
            q.sender.as_deref().unwrap_or_default(),
            q.spender.as_deref().unwrap_or_default(),
            q.value.as_deref().unwrap_or_default(),
            q.tag.as_deref(),
        )
        .await;
    reply("approve", res)
}

async fn log(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Json<ApiResponse<Vec<TransactionLogEntry>>> {
    let owner = query.owner.unwrap_or_default();
    Json(ApiResponse {
        data: state.proxy.log(&owner),
    })
}
