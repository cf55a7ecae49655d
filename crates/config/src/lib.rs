//! Configuration types for the faucet.
//!
//! The faucet is configured from a TOML file. Every tunable has a default so a
//! minimal file only needs the endpoints and the registry address. Secrets
//! (the funding private key) never live in the file.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Top-level faucet configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint of the node used to send payouts
    pub rpc_url: String,

    /// Registry contract the core token address is resolved from
    pub registry_address: Address,

    /// KYC provider endpoint that accepts data requests
    pub kyc_request_url: String,

    /// Public URL of this faucet's `/api/callback`, handed to the KYC provider
    pub callback_url: String,

    /// Listener port to serve HTTP connections
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Count of reverse proxies in front of the server
    #[serde(default)]
    pub proxy_count: usize,

    /// Maximum recipients waiting to be funded
    #[serde(default = "default_queue_cap")]
    pub queue_cap: usize,

    /// Native coins transferred per request
    #[serde(default = "default_payout")]
    pub payout: u64,

    /// Core tokens transferred per request
    #[serde(default = "default_tokens_payout")]
    pub tokens_payout: u64,

    /// Minutes to wait between funding rounds for the same address or IP (0 disables)
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Path of the identity database
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Directory of pre-built web assets served at `/`
    #[serde(default)]
    pub web_dir: Option<PathBuf>,

    /// Port of the Prometheus exporter (disabled when unset)
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Seconds between faucet balance reports
    #[serde(default = "default_balance_poll_secs")]
    pub balance_poll_secs: u64,
}

const fn default_http_port() -> u16 {
    8080
}

const fn default_queue_cap() -> usize {
    100
}

const fn default_payout() -> u64 {
    1
}

const fn default_tokens_payout() -> u64 {
    200
}

/// Longest accepted rate-limit window: one year.
pub const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

const fn default_interval_minutes() -> u64 {
    1440
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("faucet.redb")
}

const fn default_balance_poll_secs() -> u64 {
    60
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("rpc_url must not be empty"));
        }
        if self.queue_cap == 0 {
            return Err(ConfigError::Invalid("queue_cap must be at least 1"));
        }
        if self.payout == 0 && self.tokens_payout == 0 {
            return Err(ConfigError::Invalid(
                "at least one of payout and tokens_payout must be non-zero",
            ));
        }
        if self.balance_poll_secs == 0 {
            return Err(ConfigError::Invalid("balance_poll_secs must be non-zero"));
        }
        if self.interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(ConfigError::Invalid(
                "interval_minutes must not exceed one year",
            ));
        }

        Ok(())
    }

    /// Rate-limit window per address and client IP.
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    pub const fn balance_poll_interval(&self) -> Duration {
        Duration::from_secs(self.balance_poll_secs)
    }
}
