#![deny(warnings)]

use std::sync::Arc;
use token_proxy::callback::Notifier;
use token_proxy::logging::*;
use token_proxy::proxy::TokenProxy;
use token_proxy::token::EthTokenClient;
use token_proxy::{audit, web};

#[tokio::main]
async fn main() {
    let log = DEFAULT.new(o!("function" => "main"));
    info!(log, "Starting up");
    debug!(log, "log level check");
    trace!(log, "log level check");

    match run(&log).await {
        Ok(_) => info!(log, "shutting down"),
        Err(err) => crit!(log, "shutting down: {:?}", err),
    }
}

async fn run(log: &Logger) -> anyhow::Result<()> {
    let token = Arc::new(EthTokenClient::new_from_config()?);
    let notifier = Notifier::new_from_config()?;
    info!(log, "callback configured"; "url" => %notifier.target().url());

    let proxy = TokenProxy::with_notifier(token, notifier, Arc::new(audit::AuditLog::new()));
    if let Err(err) = proxy.warm_up().await {
        warn!(log, "failed to fetch token symbol"; "error" => %err);
    }

    web::run(Arc::new(web::AppState::new(proxy))).await
}
