use super::TokenHandle;
use crate::Result;
use crate::config;
use crate::errors::Error;
use crate::logging::*;
use crate::types::Wei;
use alloy::network::Ethereum;
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::sol;
use alloy::transports::http::{Http, reqwest};
use async_trait::async_trait;
use std::str::FromStr;
use std::time::Duration;

sol! {
    #[sol(rpc)]
    contract ERC20 {
        function name() public view returns (string memory);
        function symbol() public view returns (string memory);
        function decimals() public view returns (uint8);
        function totalSupply() public view returns (uint256);
        function balanceOf(address account) public view returns (uint256);
        function transfer(address to, uint256 amount) public returns (bool);
        function allowance(address owner, address spender) public view returns (uint256);
        function approve(address spender, uint256 amount) public returns (bool);
        function transferFrom(address from, address to, uint256 amount) public returns (bool);
    }
}

/// Ethereum JSON-RPC 経由の ERC20 クライアント
///
/// 書き込みはノード管理のアカウント（`from = sender`）で `eth_sendTransaction` する。
/// 署名・nonce・gas はノード側に任せるので filler は使わない。
pub struct EthTokenClient {
    rpc_url: String,
    contract: ERC20::ERC20Instance<DynProvider>,
    reserve: Option<String>,
}

impl EthTokenClient {
    pub fn new(rpc_url: String, contract: String, reserve: Option<String>) -> Result<Self> {
        let address = Address::from_str(&contract)
            .map_err(|e| Error::Config(format!("TOKEN_CONTRACT_ADDRESS: {e}")))?;
        let url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("ETH_RPC_URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        let rpc = RpcClient::new(Http::with_client(client, url), false);
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(rpc)
            .erased();

        Ok(Self {
            rpc_url,
            contract: ERC20::new(address, provider),
            reserve,
        })
    }

    pub fn new_from_config() -> Result<Self> {
        let rpc_url = config::get("ETH_RPC_URL")?;
        let contract = config::get("TOKEN_CONTRACT_ADDRESS")?;
        let reserve = config::get("TOKEN_RESERVE_ADDRESS").ok();
        Self::new(rpc_url, contract, reserve)
    }

    fn log(&self, method: &'static str) -> Logger {
        DEFAULT.new(o!(
            "function" => "EthTokenClient",
            "server" => self.rpc_url.clone(),
            "method" => method,
        ))
    }

    fn sent(
        &self,
        method: &'static str,
        sender: &str,
        res: alloy::contract::Result<PendingTransactionBuilder<Ethereum>>,
    ) -> Result<String> {
        let log = self.log(method);
        match res {
            Ok(pending) => {
                let txid = format!("{:#x}", pending.tx_hash());
                info!(log, "transaction sent"; "sender" => sender, "txid" => &txid);
                Ok(txid)
            }
            Err(err) => {
                debug!(log, "transaction rejected"; "sender" => sender, "error" => %err);
                Err(err.into())
            }
        }
    }
}

fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address)
        .map_err(|e| Error::contract(format!("invalid address {address:?}: {e}")))
}

fn to_u256(amount: &Wei) -> Result<U256> {
    U256::try_from_be_slice(&amount.as_biguint().to_bytes_be())
        .ok_or_else(|| Error::InvalidAmount(format!("{amount} exceeds uint256")))
}

fn from_u256(value: U256) -> Wei {
    Wei::from_be_bytes(&value.to_be_bytes::<32>())
}

#[async_trait]
impl TokenHandle for EthTokenClient {
    fn reserve(&self) -> Option<String> {
        self.reserve.clone()
    }

    async fn name(&self) -> Result<String> {
        trace!(self.log("name"), "calling");
        Ok(self.contract.name().call().await?)
    }

    async fn symbol(&self) -> Result<String> {
        trace!(self.log("symbol"), "calling");
        Ok(self.contract.symbol().call().await?)
    }

    async fn decimals(&self) -> Result<u8> {
        trace!(self.log("decimals"), "calling");
        Ok(self.contract.decimals().call().await?)
    }

    async fn total_supply(&self) -> Result<Wei> {
        trace!(self.log("totalSupply"), "calling");
        let supply = self.contract.totalSupply().call().await?;
        Ok(from_u256(supply))
    }

    async fn balance_of(&self, owner: &str) -> Result<Wei> {
        let owner = parse_address(owner)?;
        debug!(self.log("balanceOf"), "calling"; "owner" => %owner);
        let balance = self.contract.balanceOf(owner).call().await?;
        Ok(from_u256(balance))
    }

    async fn transfer(&self, sender: &str, to: &str, amount: &Wei) -> Result<String> {
        let from = parse_address(sender)?;
        let call = self.contract.transfer(parse_address(to)?, to_u256(amount)?);
        let res = call.from(from).send().await;
        self.sent("transfer", sender, res)
    }

    async fn transfer_from(
        &self,
        sender: &str,
        from: &str,
        to: &str,
        amount: &Wei,
    ) -> Result<String> {
        let origin = parse_address(sender)?;
        let call = self.contract.transferFrom(
            parse_address(from)?,
            parse_address(to)?,
            to_u256(amount)?,
        );
        let res = call.from(origin).send().await;
        self.sent("transferFrom", sender, res)
    }

    async fn approve(&self, sender: &str, spender: &str, amount: &Wei) -> Result<String> {
        let from = parse_address(sender)?;
        let call = self.contract.approve(parse_address(spender)?, to_u256(amount)?);
        let res = call.from(from).send().await;
        self.sent("approve", sender, res)
    }

    async fn allowance(&self, owner: &str, spender: &str) -> Result<Wei> {
        let owner = parse_address(owner)?;
        let spender = parse_address(spender)?;
        debug!(self.log("allowance"), "calling"; "owner" => %owner, "spender" => %spender);
        let allowance = self.contract.allowance(owner, spender).call().await?;
        Ok(from_u256(allowance))
    }
}
