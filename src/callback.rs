use crate::Result;
use crate::audit::TransactionLogEntry;
use crate::config;
use crate::errors::Error;
use crate::logging::*;
use humantime::parse_duration;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

/// コールバック先（構築後は不変）
#[derive(Debug, Clone)]
pub struct CallbackTarget {
    url: Url,
    auth: Option<BasicAuth>,
}

impl CallbackTarget {
    pub fn new(url: &str, auth: Option<BasicAuth>) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(Error::InvalidCallbackUrl("callback url must not be empty".into()));
        }
        let url = Url::parse(url).map_err(|e| Error::InvalidCallbackUrl(format!("{url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidCallbackUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }
        Ok(Self { url, auth })
    }

    pub fn new_from_config() -> Result<Self> {
        let url = config::get("CALLBACK_URL")?;
        let auth = config::get("CALLBACK_USERNAME").ok().map(|username| BasicAuth {
            username,
            password: config::get("CALLBACK_PASSWORD").ok(),
        });
        Self::new(&url, auth)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// 書き込み完了をコールバック先へ通知する
///
/// 配送は一度きり。失敗はログに残すだけで呼び出し元には返さない。
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    target: Arc<CallbackTarget>,
    delay: Duration,
}

impl Notifier {
    pub fn new(target: CallbackTarget, delay: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            target: Arc::new(target),
            delay,
        }
    }

    pub fn new_from_config() -> Result<Self> {
        let target = CallbackTarget::new_from_config()?;
        let delay = config::get("CALLBACK_DELAY")
            .ok()
            .map(|v| parse_duration(&v).map_err(|e| Error::Config(format!("CALLBACK_DELAY: {e}"))))
            .transpose()?
            .unwrap_or_default();
        Ok(Self::new(target, delay))
    }

    pub fn target(&self) -> &CallbackTarget {
        &self.target
    }

    pub async fn deliver(&self, entry: &TransactionLogEntry) -> Result<()> {
        let mut req = self.client.post(self.target.url.clone()).json(entry);
        if let Some(auth) = &self.target.auth {
            req = req.basic_auth(&auth.username, auth.password.as_ref());
        }
        let res = req
            .send()
            .await
            .map_err(|e| Error::CallbackDelivery(e.to_string()))?;
        res.error_for_status()
            .map_err(|e| Error::CallbackDelivery(e.to_string()))?;
        Ok(())
    }

    /// 切り離したタスクで配送する（結果は待たない）
    pub fn notify(&self, entry: TransactionLogEntry) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            let log = DEFAULT.new(o!(
                "function" => "Notifier::notify",
                "txid" => entry.transaction_id.clone(),
                "url" => notifier.target.url.to_string(),
            ));
            if !notifier.delay.is_zero() {
                trace!(log, "delaying"; "delay" => ?notifier.delay);
                tokio::time::sleep(notifier.delay).await;
            }
            match notifier.deliver(&entry).await {
                Ok(_) => debug!(log, "delivered"),
                Err(err) => warn!(log, "callback delivery failed"; "error" => %err),
            }
        })
    }
}
