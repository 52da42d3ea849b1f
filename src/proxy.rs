use crate::Result;
use crate::audit::{AuditLog, TransactionLogEntry};
use crate::callback::{BasicAuth, CallbackTarget, Notifier};
use crate::logging::*;
use crate::token::TokenHandle;
use crate::types::Wei;
use async_once_cell::OnceCell;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// トークンコントラクトへの中継サービス
///
/// 読み取りはそのまま中継し、書き込みは成功後に監査ログへ追記してコールバックを送る。
pub struct TokenProxy {
    token: Arc<dyn TokenHandle>,
    notifier: Notifier,
    audit: Arc<AuditLog>,
    symbol: OnceCell<String>,
}

impl TokenProxy {
    pub fn new(
        token: Arc<dyn TokenHandle>,
        callback_url: &str,
        callback_auth: Option<BasicAuth>,
    ) -> Result<Self> {
        let target = CallbackTarget::new(callback_url, callback_auth)?;
        Ok(Self::with_notifier(
            token,
            Notifier::new(target, Duration::ZERO),
            Arc::new(AuditLog::new()),
        ))
    }

    pub fn with_notifier(
        token: Arc<dyn TokenHandle>,
        notifier: Notifier,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            token,
            notifier,
            audit,
            symbol: OnceCell::new(),
        }
    }

    /// Fetches the token symbol ahead of the first write.
    pub async fn warm_up(&self) -> Result<()> {
        self.symbol
            .get_or_try_init(self.token.symbol())
            .await
            .map(|_| ())
    }

    pub fn reserve(&self) -> Option<String> {
        self.token.reserve()
    }

    pub async fn name(&self) -> Result<String> {
        self.token.name().await
    }

    pub async fn symbol(&self) -> Result<String> {
        self.token.symbol().await
    }

    pub async fn decimals(&self) -> Result<u8> {
        self.token.decimals().await
    }

    pub async fn total_supply(&self) -> Result<String> {
        Ok(self.token.total_supply().await?.to_ether_string())
    }

    pub async fn balance_of(&self, owner: &str) -> Result<String> {
        Ok(self.token.balance_of(owner).await?.to_ether_string())
    }

    pub async fn allowance(&self, owner: &str, spender: &str) -> Result<String> {
        Ok(self
            .token
            .allowance(owner, spender)
            .await?
            .to_ether_string())
    }

    pub async fn transfer(
        &self,
        sender: &str,
        to: &str,
        value: &str,
        tag: Option<&str>,
    ) -> Result<String> {
        let amount = Wei::from_ether_str(value)?;
        let txid = self.token.transfer(sender, to, &amount).await?;
        self.record(sender, to, amount, tag_or(tag, "transfer"), &txid)
            .await;
        Ok(txid)
    }

    pub async fn transfer_from(
        &self,
        sender: &str,
        from: &str,
        to: &str,
        value: &str,
        tag: Option<&str>,
    ) -> Result<String> {
        let amount = Wei::from_ether_str(value)?;
        let txid = self.token.transfer_from(sender, from, to, &amount).await?;
        self.record(from, to, amount, tag_or(tag, "transferFrom"), &txid)
            .await;
        Ok(txid)
    }

    pub async fn approve(
        &self,
        sender: &str,
        spender: &str,
        value: &str,
        tag: Option<&str>,
    ) -> Result<String> {
        let amount = Wei::from_ether_str(value)?;
        let txid = self.token.approve(sender, spender, &amount).await?;
        self.record(sender, spender, amount, tag_or(tag, "approve"), &txid)
            .await;
        Ok(txid)
    }

    pub fn log(&self, owner: &str) -> Vec<TransactionLogEntry> {
        self.audit.get(owner)
    }

    async fn cached_symbol(&self) -> Option<String> {
        match self.symbol.get_or_try_init(self.token.symbol()).await {
            Ok(symbol) => Some(symbol.clone()),
            Err(err) => {
                let log = DEFAULT.new(o!("function" => "TokenProxy::cached_symbol"));
                warn!(log, "failed to fetch symbol"; "error" => %err);
                None
            }
        }
    }

    async fn record(&self, from: &str, to: &str, amount: Wei, tag: &str, txid: &str) {
        let log = DEFAULT.new(o!(
            "function" => "TokenProxy::record",
            "tag" => tag.to_owned(),
            "txid" => txid.to_owned(),
        ));
        let entry = TransactionLogEntry {
            from: from.to_owned(),
            to: to.to_owned(),
            amount,
            tag: tag.to_owned(),
            transaction_id: txid.to_owned(),
            timestamp: Utc::now(),
            symbol: self.cached_symbol().await,
        };
        self.audit.record(&entry);
        info!(log, "recorded"; "from" => from, "to" => to, "value" => %entry.amount);

        // 応答はコールバックの完了を待たない
        drop(self.notifier.notify(entry));
    }
}

fn tag_or<'a>(tag: Option<&'a str>, default: &'a str) -> &'a str {
    tag.filter(|t| !t.is_empty()).unwrap_or(default)
}

#[cfg(test)]
mod tests;
