//! Async client for minting, funding and reading token accounts.
//!
//! Every operation takes an explicit [`WalletContext`]: the RPC endpoint,
//! the external signer and the configuration. Instruction bytes, addresses
//! and account layouts come from `token-wire`; this crate decides what to
//! send, in which order, and what to do with the answer.

pub mod assembler;
pub mod config;
pub mod confirm;
pub mod context;
pub mod error;
pub mod poller;
pub mod reader;
pub mod rpc;
pub mod signer;
pub mod telemetry;

pub use assembler::{
    create_mint_and_fund, create_mint_and_fund_with, ensure_associated_account, mint_to_owner,
    plan_fund_wallet, transfer_to_owner, EnsuredAccount, FundWalletOutcome, FundWalletPlan,
    FundWalletRequest, Submitted, TokenMoveOutcome,
};
pub use config::{ClientConfig, RpcUrl};
pub use confirm::{confirm_signature, wait_for_confirmation, ConfirmationOutcome};
pub use context::WalletContext;
pub use error::{ClientError, Result};
pub use poller::{BalancePoller, BalanceSnapshot, BalanceUpdate, PollerHandle};
pub use reader::{
    account_exists, fetch_lamports, fetch_mint, fetch_token_account, fetch_token_balance,
    is_mint_authority, TokenBalance,
};
pub use rpc::{AccountInfo, ChainRpc, Commitment, HttpRpc, LatestBlockhash, SignatureStatus};
pub use signer::{KeypairSigner, SignedSubmission, SignerError, TransactionSigner};
pub use telemetry::setup_telemetry;
