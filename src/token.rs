mod eth;
#[cfg(test)]
pub mod mock;

use crate::Result;
use crate::types::Wei;
use async_trait::async_trait;

pub use eth::EthTokenClient;

/// ERC20 トークンコントラクトへのハンドル
///
/// 金額はすべて wei 単位。書き込み系はトランザクションIDを返す。
#[async_trait]
pub trait TokenHandle: Send + Sync {
    /// Address holding the token float, as configured on the client.
    fn reserve(&self) -> Option<String>;

    async fn name(&self) -> Result<String>;

    async fn symbol(&self) -> Result<String>;

    async fn decimals(&self) -> Result<u8>;

    async fn total_supply(&self) -> Result<Wei>;

    async fn balance_of(&self, owner: &str) -> Result<Wei>;

    async fn transfer(&self, sender: &str, to: &str, amount: &Wei) -> Result<String>;

    async fn transfer_from(&self, sender: &str, from: &str, to: &str, amount: &Wei)
    -> Result<String>;

    async fn approve(&self, sender: &str, spender: &str, amount: &Wei) -> Result<String>;

    async fn allowance(&self, owner: &str, spender: &str) -> Result<Wei>;
}
