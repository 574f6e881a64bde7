//! Typed reads of mint and token accounts over RPC.
//!
//! A missing account is always [`ClientError::AccountNotFound`] and a failed
//! fetch always propagates. Nothing here turns an error into a zero balance.

use token_wire::{
    base_units_to_ui_string, bytes_to_address, decode_mint_account, decode_token_account,
    get_associated_token_address, MintAccount, Pubkey, TokenAccount, TOKEN_PROGRAM_ID,
};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::rpc::{AccountInfo, ChainRpc};

/// One owner's holding of one mint, with display-ready amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub address: Pubkey,
    pub amount: u64,
    pub decimals: u8,
    pub ui_amount: String,
}

async fn fetch_existing(rpc: &dyn ChainRpc, address: &Pubkey) -> Result<AccountInfo> {
    rpc.get_account_info(address)
        .await?
        .ok_or_else(|| ClientError::AccountNotFound {
            address: bytes_to_address(address),
        })
}

fn ensure_token_program_owner(info: &AccountInfo, address: &Pubkey) -> Result<()> {
    if info.owner != TOKEN_PROGRAM_ID {
        return Err(ClientError::Decode(format!(
            "{} is owned by {}, not the token program",
            bytes_to_address(address),
            bytes_to_address(&info.owner)
        )));
    }
    Ok(())
}

pub async fn account_exists(rpc: &dyn ChainRpc, address: &Pubkey) -> Result<bool> {
    Ok(rpc.get_account_info(address).await?.is_some())
}

pub async fn fetch_lamports(rpc: &dyn ChainRpc, address: &Pubkey) -> Result<u64> {
    rpc.get_balance(address).await
}

pub async fn fetch_mint(rpc: &dyn ChainRpc, mint: &Pubkey) -> Result<MintAccount> {
    let info = fetch_existing(rpc, mint).await?;
    ensure_token_program_owner(&info, mint)?;
    Ok(decode_mint_account(&info.data)?)
}

pub async fn fetch_token_account(rpc: &dyn ChainRpc, address: &Pubkey) -> Result<TokenAccount> {
    let info = fetch_existing(rpc, address).await?;
    ensure_token_program_owner(&info, address)?;
    Ok(decode_token_account(&info.data)?)
}

/// Balance of `owner`'s associated account for `mint`.
pub async fn fetch_token_balance(
    rpc: &dyn ChainRpc,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<TokenBalance> {
    let address = get_associated_token_address(owner, mint)?;
    let account = fetch_token_account(rpc, &address).await?;
    if account.mint != *mint || account.owner != *owner {
        return Err(ClientError::Decode(format!(
            "{} does not hold {} for {}",
            bytes_to_address(&address),
            bytes_to_address(mint),
            bytes_to_address(owner)
        )));
    }
    let decimals = fetch_mint(rpc, mint).await?.decimals;
    debug!(
        owner = %bytes_to_address(owner),
        mint = %bytes_to_address(mint),
        amount = account.amount,
        "token balance"
    );
    Ok(TokenBalance {
        address,
        amount: account.amount,
        decimals,
        ui_amount: base_units_to_ui_string(account.amount, decimals),
    })
}

/// Whether `wallet` may mint more of `mint`. Fetch failures propagate.
pub async fn is_mint_authority(rpc: &dyn ChainRpc, mint: &Pubkey, wallet: &Pubkey) -> Result<bool> {
    let account = fetch_mint(rpc, mint).await?;
    Ok(account.mint_authority == Some(*wallet))
}
