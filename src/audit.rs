use crate::types::Wei;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// 書き込み系オペレーション1件分の記録
///
/// JSON 形式はコールバックの body と `/log` の応答で共通。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionLogEntry {
    pub from: String,
    pub to: String,
    #[serde(rename = "value")]
    pub amount: Wei,
    pub tag: String,
    #[serde(rename = "txid")]
    pub transaction_id: String,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub symbol: Option<String>,
}

/// 参加者アドレスごとの監査ログ（追記のみ、プロセス内のみ）
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<HashMap<String, Vec<TransactionLogEntry>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送り手と受け手の両方のバケットに同じエントリを追記する
    pub fn record(&self, entry: &TransactionLogEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for key in [&entry.from, &entry.to] {
            entries.entry(key.clone()).or_default().push(entry.clone());
        }
    }

    pub fn get(&self, owner: &str) -> Vec<TransactionLogEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(owner).cloned().unwrap_or_default()
    }
}
