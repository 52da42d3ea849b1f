use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

// TOML configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub callback: CallbackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_address")]
    pub address: String,
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub reserve_address: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_callback_delay")]
    pub delay: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_rust_log_format")]
    pub rust_log_format: String,
}

// Default values
fn default_server_address() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_mount_path() -> String {
    "/".to_string()
}
fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}
fn default_callback_delay() -> String {
    "0s".to_string()
}
fn default_rust_log_format() -> String {
    "json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
            mount_path: default_mount_path(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            contract_address: String::new(),
            reserve_address: String::new(),
        }
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            delay: default_callback_delay(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log_format: default_rust_log_format(),
        }
    }
}

static CONFIG: Lazy<Config> = Lazy::new(|| {
    load_config().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config files: {}. Using defaults.",
            e
        );
        Config::default()
    })
});

static CONFIG_STORE: Lazy<Arc<Mutex<HashMap<String, String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

pub fn get(name: &str) -> Result<String> {
    // Priority 1: CONFIG_STORE (runtime overrides)
    if let Some(value) = get_from_store(name) {
        if value.is_empty() {
            return Err(anyhow!("{} is empty", name));
        }
        return Ok(value);
    }

    // Priority 2: Environment variables
    if let Ok(val) = std::env::var(name)
        && !val.is_empty()
    {
        return Ok(val);
    }

    // Priority 3: TOML config
    if let Some(value) = toml_value(&CONFIG, name)
        && !value.is_empty()
    {
        return Ok(value);
    }

    Err(anyhow!("Configuration key not found: {}", name))
}

fn toml_value(config: &Config, name: &str) -> Option<String> {
    let value = match name {
        "SERVER_ADDRESS" => &config.server.address,
        "MOUNT_PATH" => &config.server.mount_path,
        "ETH_RPC_URL" => &config.token.rpc_url,
        "TOKEN_CONTRACT_ADDRESS" => &config.token.contract_address,
        "TOKEN_RESERVE_ADDRESS" => &config.token.reserve_address,
        "CALLBACK_URL" => &config.callback.url,
        "CALLBACK_USERNAME" => &config.callback.username,
        "CALLBACK_PASSWORD" => &config.callback.password,
        "CALLBACK_DELAY" => &config.callback.delay,
        "RUST_LOG_FORMAT" => &config.logging.rust_log_format,
        _ => return None,
    };
    Some(value.clone())
}

/// テスト用: 設定値を上書きする
#[doc(hidden)]
pub fn set(name: &str, value: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.insert(name.to_string(), value.to_string());
    }
}

/// テスト用: 設定値を CONFIG_STORE から削除する
#[doc(hidden)]
pub fn remove(name: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.remove(name);
    }
}

/// テスト用: CONFIG_STORE に値をセットし、Drop 時に自動で元に戻す RAII ガード。
#[doc(hidden)]
pub struct ConfigGuard {
    key: String,
    previous: Option<String>,
}

impl ConfigGuard {
    pub fn new(key: &str, value: &str) -> Self {
        let previous = get_from_store(key);
        set(key, value);
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(prev) => set(&self.key, prev),
            None => remove(&self.key),
        }
    }
}

fn get_from_store(name: &str) -> Option<String> {
    if let Ok(store) = CONFIG_STORE.lock() {
        store.get(name).cloned()
    } else {
        None
    }
}

/// Load configuration from TOML files with priority:
/// 1. config/config.local.toml (git-ignored, for local overrides)
/// 2. config/config.toml (git-managed template)
/// 3. Default values
fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let base_path = "config/config.toml";
    if Path::new(base_path).exists() {
        let content = fs::read_to_string(base_path)?;
        config = toml::from_str(&content)?;
    }

    let local_path = "config/config.local.toml";
    if Path::new(local_path).exists() {
        let content = fs::read_to_string(local_path)?;
        let local_config: Config = toml::from_str(&content)?;
        merge_config(&mut config, local_config);
    }

    Ok(config)
}

/// Merge local config into base config (local values override base values)
fn merge_config(base: &mut Config, local: Config) {
    // Server
    if local.server.address != default_server_address() {
        base.server.address = local.server.address;
    }
    if local.server.mount_path != default_mount_path() {
        base.server.mount_path = local.server.mount_path;
    }

    // Token
    if local.token.rpc_url != default_rpc_url() {
        base.token.rpc_url = local.token.rpc_url;
    }
    if !local.token.contract_address.is_empty() {
        base.token.contract_address = local.token.contract_address;
    }
    if !local.token.reserve_address.is_empty() {
        base.token.reserve_address = local.token.reserve_address;
    }

    // Callback
    if !local.callback.url.is_empty() {
        base.callback.url = local.callback.url;
    }
    if !local.callback.username.is_empty() {
        base.callback.username = local.callback.username;
    }
    if !local.callback.password.is_empty() {
        base.callback.password = local.callback.password;
    }
    if local.callback.delay != default_callback_delay() {
        base.callback.delay = local.callback.delay;
    }

    // Logging
    if local.logging.rust_log_format != default_rust_log_format() {
        base.logging.rust_log_format = local.logging.rust_log_format;
    }
}
