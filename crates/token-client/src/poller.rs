//! Periodic balance refresh.
//!
//! The only repeating task in the crate. It runs until its handle is stopped
//! or dropped, so tearing down whatever owns the handle always ends the
//! polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use token_wire::{bytes_to_address, Pubkey};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::reader::{fetch_lamports, fetch_token_balance, TokenBalance};
use crate::rpc::ChainRpc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub lamports: u64,
    /// `None` when the owner has no associated account for the mint, or
    /// when no mint is being watched.
    pub token: Option<TokenBalance>,
}

/// Latest poll result. `None` until the first poll completes.
pub type BalanceUpdate = Option<Result<BalanceSnapshot>>;

pub struct BalancePoller;

impl BalancePoller {
    /// Start polling `owner`'s balances every `period`.
    ///
    /// The first poll runs immediately. A failed poll is published as an
    /// error, never as a zero balance.
    pub fn spawn(
        rpc: Arc<dyn ChainRpc>,
        owner: Pubkey,
        mint: Option<Pubkey>,
        period: Duration,
    ) -> PollerHandle {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let update = poll_once(rpc.as_ref(), &owner, mint.as_ref()).await;
                if let Err(e) = &update {
                    warn!(owner = %bytes_to_address(&owner), "balance poll failed: {e}");
                }
                if tx.send(Some(update)).is_err() {
                    debug!("balance poller has no subscribers left");
                    break;
                }
            }
        });
        PollerHandle { rx, task }
    }
}

async fn poll_once(
    rpc: &dyn ChainRpc,
    owner: &Pubkey,
    mint: Option<&Pubkey>,
) -> Result<BalanceSnapshot> {
    let lamports = fetch_lamports(rpc, owner).await?;
    let token = match mint {
        None => None,
        Some(mint) => match fetch_token_balance(rpc, owner, mint).await {
            Ok(balance) => Some(balance),
            Err(ClientError::AccountNotFound { .. }) => None,
            Err(e) => return Err(e),
        },
    };
    Ok(BalanceSnapshot { lamports, token })
}

/// Owner of a running [`BalancePoller`]. Dropping it stops the poller.
#[derive(Debug)]
pub struct PollerHandle {
    rx: watch::Receiver<BalanceUpdate>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<BalanceUpdate> {
        self.rx.clone()
    }

    pub fn latest(&self) -> BalanceUpdate {
        self.rx.borrow().clone()
    }

    /// Stop polling. In-flight queries are abandoned; nothing else is
    /// cancelled.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
