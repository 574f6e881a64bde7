//! The chain RPC boundary.
//!
//! Everything the client needs from a node fits in [`ChainRpc`]. The HTTP
//! implementation lives in [`http`]; tests swap in an in-memory one.

pub mod http;

use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use token_wire::Pubkey;

use crate::error::Result;

pub use http::HttpRpc;

/// How settled a block must be before a read or confirmation counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    /// Whether a status reported at `reached` satisfies this level.
    pub fn is_reached_by(&self, reached: Commitment) -> bool {
        reached.rank() >= self.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            Commitment::Processed => 0,
            Commitment::Confirmed => 1,
            Commitment::Finalized => 2,
        }
    }
}

impl std::str::FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level {other:?}")),
        }
    }
}

impl Display for Commitment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw account as returned by `getAccountInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

/// Status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    /// `None` while the node has not reported a level yet.
    pub confirmation: Option<Commitment>,
    /// The program or runtime error, if the transaction failed.
    pub err: Option<String>,
}

/// A recent blockhash and the last block height at which it is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: [u8; 32],
    pub last_valid_block_height: u64,
}

#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Native balance in lamports. A never-funded address reports 0.
    async fn get_balance(&self, address: &Pubkey) -> Result<u64>;

    /// `Ok(None)` when the account does not exist.
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountInfo>>;

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64>;

    /// Submit a fully signed wire transaction. Returns the base58 signature.
    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<String>;

    /// `Ok(None)` when the node has no record of the signature yet.
    async fn get_signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>>;
}
