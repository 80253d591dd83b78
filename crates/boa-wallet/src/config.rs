//! Wallet configuration.
//!
//! Provides [`WalletConfig`] with defaults for the fee policy, dust
//! threshold and watcher polling. Values can be layered from a config file
//! and `BOA_WALLET_*` environment variables with [`WalletConfig::load`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use boa_core::address::Address;
use boa_core::amount::Amount;
use boa_core::constants::{DEFAULT_DUST_THRESHOLD, FEE_RATE};

use crate::error::WalletError;
use crate::fee::FeeOption;

/// Prefix of the environment variables read by [`WalletConfig::load`].
pub const ENV_PREFIX: &str = "BOA_WALLET";

/// Configuration shared by builders and the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Fee tier a builder starts with and returns to on `clear`.
    pub fee_option: FeeOption,
    /// Smallest per-byte rate accepted from the fee source.
    pub min_fee_rate: Amount,
    /// Change below this value is left to the fee instead of paid back.
    pub dust_threshold: Amount,
    /// Recipient of payload fees.
    pub commons_budget: Address,
    /// Seconds between block height polls when push notifications fail.
    pub poll_interval_secs: u64,
    /// Root directory for wallet data.
    pub data_dir: PathBuf,
}

impl Default for WalletConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("boa-wallet");

        Self {
            fee_option: FeeOption::default(),
            min_fee_rate: Amount::new(FEE_RATE),
            dust_threshold: Amount::new(DEFAULT_DUST_THRESHOLD),
            commons_budget: Address::commons_budget(),
            poll_interval_secs: 30,
            data_dir,
        }
    }
}

impl WalletConfig {
    /// Load the configuration from an optional file, then apply
    /// `BOA_WALLET_*` environment overrides. Unset fields keep their
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, WalletError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, WalletError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix(prefix).try_parsing(true));

        let cfg: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| WalletError::Config(e.to_string()))?;
        tracing::debug!(fee_option = ?cfg.fee_option, dust = %cfg.dust_threshold, "wallet config loaded");
        Ok(cfg)
    }

    /// Conventional location of the config file, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("boa-wallet").join("wallet.toml"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
