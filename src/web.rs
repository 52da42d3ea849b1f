mod basic;
mod token;
mod transactions;

use crate::config;
use crate::errors::Error;
use crate::logging::*;
use crate::proxy::TokenProxy;
use axum::Json;
use axum::Router;
use axum::extract::{FromRequestParts, Query};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::result::Result;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    proxy: TokenProxy,
}

impl AppState {
    pub fn new(proxy: TokenProxy) -> Self {
        Self { proxy }
    }
}

/// 成功時の応答 `{"data": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// `Query` と同じだが、解釈できないクエリは `{"error": ...}` の 400 で返す
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(query)) => Ok(ApiQuery(query)),
            Err(rejection) => {
                let log = DEFAULT.new(o!(
                    "function" => "web::ApiQuery",
                    "path" => parts.uri.path().to_owned(),
                ));
                let err = Error::InvalidQuery(rejection.body_text());
                warn!(log, "rejected query"; "error" => %err);
                Err(err.into_response())
            }
        }
    }
}

pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let log = DEFAULT.new(o!("function" => "web::run"));
    let address = config::get("SERVER_ADDRESS")?;
    let mount_path = config::get("MOUNT_PATH").unwrap_or_else(|_| "/".to_string());

    let app = router(state, &mount_path);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(log, "listening"; "address" => &address, "mount_path" => &mount_path);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: Arc<AppState>, mount_path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = add_routes(Router::new(), &[token::add_route, transactions::add_route]);
    let app = basic::add_route(Router::new());
    let app = match normalize_mount_path(mount_path) {
        Some(path) => app.nest(&path, api),
        None => app.merge(api),
    };
    app.with_state(state).layer(cors)
}

fn add_routes<T>(app: Router<T>, funcs: &[fn(Router<T>) -> Router<T>]) -> Router<T> {
    let mut app = app;
    for func in funcs {
        app = func(app);
    }
    app
}

// "/" や "" はルート直下
fn normalize_mount_path(path: &str) -> Option<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

fn reply<T: Serialize>(route: &'static str, res: crate::Result<T>) -> Response {
    match res {
        Ok(data) => Json(ApiResponse { data }).into_response(),
        Err(err) => {
            let log = DEFAULT.new(o!("function" => "web::reply", "route" => route));
            warn!(log, "request failed"; "error" => %err);
            err.into_response()
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidAmount(_) | Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::Contract(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}
