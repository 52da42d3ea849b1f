pub mod audit;
pub mod callback;
pub mod config;
pub mod errors;
pub mod logging;
pub mod proxy;
pub mod token;
pub mod types;
pub mod web;

pub type Result<T> = std::result::Result<T, errors::Error>;
