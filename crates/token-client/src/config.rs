use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use token_wire::{address_to_bytes, Pubkey};

use crate::error::{ClientError, Result};
use crate::rpc::Commitment;

pub const ENV_RPC_URL: &str = "TOKEN_RPC_URL";
pub const ENV_MINT_ADDRESS: &str = "TOKEN_MINT_ADDRESS";
pub const ENV_COMMITMENT: &str = "TOKEN_COMMITMENT";
pub const ENV_FEE_RESERVE: &str = "TOKEN_FEE_RESERVE_LAMPORTS";

/// 0.001 SOL kept aside for fees on top of any rent the operation needs.
pub const DEFAULT_FEE_RESERVE_LAMPORTS: u64 = 1_000_000;

/// Well-known cluster endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcUrl {
    Mainnet,
    Devnet,
    Testnet,
    Localnet,
    Custom(String),
}

impl Display for RpcUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let url = match self {
            RpcUrl::Mainnet => "https://api.mainnet-beta.solana.com",
            RpcUrl::Devnet => "https://api.devnet.solana.com",
            RpcUrl::Testnet => "https://api.testnet.solana.com",
            RpcUrl::Localnet => "http://localhost:8899",
            RpcUrl::Custom(url) => url,
        };
        f.write_str(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub commitment: Commitment,
    /// Base58 mint of the utility token, when the deployment has one.
    pub token_mint: Option<String>,
    pub fee_reserve_lamports: u64,
    pub confirm_timeout_ms: u64,
    pub confirm_poll_interval_ms: u64,
    pub balance_refresh_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            rpc_url: RpcUrl::Devnet.to_string(),
            commitment: Commitment::Confirmed,
            token_mint: None,
            fee_reserve_lamports: DEFAULT_FEE_RESERVE_LAMPORTS,
            confirm_timeout_ms: 60_000,
            confirm_poll_interval_ms: 500,
            balance_refresh_interval_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)
            .map_err(|e| ClientError::Config(format!("invalid config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Defaults overridden by `TOKEN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = ClientConfig::default();
        if let Some(url) = lookup(ENV_RPC_URL) {
            config.rpc_url = url;
        }
        if let Some(mint) = lookup(ENV_MINT_ADDRESS) {
            config.token_mint = Some(mint);
        }
        if let Some(level) = lookup(ENV_COMMITMENT) {
            config.commitment = level
                .parse()
                .map_err(|e| ClientError::Config(format!("{ENV_COMMITMENT}: {e}")))?;
        }
        if let Some(reserve) = lookup(ENV_FEE_RESERVE) {
            config.fee_reserve_lamports = reserve
                .trim()
                .parse()
                .map_err(|e| ClientError::Config(format!("{ENV_FEE_RESERVE}: {e}")))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(ClientError::Config("rpc_url is empty".into()));
        }
        if let Some(mint) = &self.token_mint {
            address_to_bytes(mint)
                .map_err(|e| ClientError::Config(format!("token_mint: {e}")))?;
        }
        for (name, value) in [
            ("confirm_timeout_ms", self.confirm_timeout_ms),
            ("confirm_poll_interval_ms", self.confirm_poll_interval_ms),
            ("balance_refresh_interval_ms", self.balance_refresh_interval_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(ClientError::Config(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }

    /// The configured utility token mint, decoded.
    pub fn token_mint_pubkey(&self) -> Result<Option<Pubkey>> {
        self.token_mint
            .as_deref()
            .map(|m| address_to_bytes(m).map_err(|e| ClientError::Config(format!("token_mint: {e}"))))
            .transpose()
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }

    pub fn balance_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.balance_refresh_interval_ms)
    }
}
