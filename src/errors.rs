use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Contract error: {0}")]
    Contract(String),
    #[error("Callback delivery failed: {0}")]
    CallbackDelivery(String),
    #[error("Invalid callback url: {0}")]
    InvalidCallbackUrl(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn contract(msg: impl Into<String>) -> Self {
        Error::Contract(msg.into())
    }
}

impl From<alloy::contract::Error> for Error {
    fn from(e: alloy::contract::Error) -> Error {
        Error::Contract(e.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Error {
        Error::Config(e.to_string())
    }
}
