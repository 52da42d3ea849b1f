use super::TokenHandle;
use crate::Result;
use crate::errors::Error;
use crate::types::Wei;
use async_trait::async_trait;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::sync::Mutex;
use std::time::Duration;

const ONE_ETHER: u128 = 10_u128.pow(18);

/// 呼び出しを記録するだけのトークン
///
/// 書き込みは `amount` (ether) × 10ms 待ってから完了する。
#[derive(Default)]
pub struct MockToken {
    calls: Mutex<Vec<String>>,
    fail_writes: bool,
    fail_symbol: bool,
    txid: Option<String>,
}

impl MockToken {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn without_symbol() -> Self {
        Self {
            fail_symbol: true,
            ..Default::default()
        }
    }

    /// 書き込みが常に `txid` を返す
    pub fn with_txid(txid: &str) -> Self {
        Self {
            txid: Some(txid.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn write(&self, call: String, amount: &Wei) -> Result<String> {
        let n = self.calls.lock().unwrap().len();
        self.calls.lock().unwrap().push(call);
        if self.fail_writes {
            return Err(Error::contract("insufficient balance"));
        }
        let units = (amount.as_biguint() / BigUint::from(ONE_ETHER))
            .to_u64()
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(units * 10)).await;
        Ok(self.txid.clone().unwrap_or_else(|| format!("0x{:04x}", n)))
    }
}

#[async_trait]
impl TokenHandle for MockToken {
    fn reserve(&self) -> Option<String> {
        Some("0xreserve".to_string())
    }

    async fn name(&self) -> Result<String> {
        Ok("Gold".to_string())
    }

    async fn symbol(&self) -> Result<String> {
        if self.fail_symbol {
            return Err(Error::contract("symbol reverted"));
        }
        Ok("GLD".to_string())
    }

    async fn decimals(&self) -> Result<u8> {
        Ok(18)
    }

    async fn total_supply(&self) -> Result<Wei> {
        Ok(Wei::of(1_000_000 * ONE_ETHER))
    }

    async fn balance_of(&self, owner: &str) -> Result<Wei> {
        self.calls.lock().unwrap().push(format!("balanceOf({owner})"));
        if owner.is_empty() {
            return Err(Error::contract("invalid address"));
        }
        Ok(Wei::of(1_500_000_000_000_000_000))
    }

    async fn transfer(&self, sender: &str, to: &str, amount: &Wei) -> Result<String> {
        self.write(format!("transfer({sender},{to},{amount})"), amount)
            .await
    }

    async fn transfer_from(
        &self,
        sender: &str,
        from: &str,
        to: &str,
        amount: &Wei,
    ) -> Result<String> {
        self.write(format!("transferFrom({sender},{from},{to},{amount})"), amount)
            .await
    }

    async fn approve(&self, sender: &str, spender: &str, amount: &Wei) -> Result<String> {
        self.write(format!("approve({sender},{spender},{amount})"), amount)
            .await
    }

    async fn allowance(&self, _owner: &str, _spender: &str) -> Result<Wei> {
        Ok(Wei::of(ONE_ETHER / 4))
    }
}
