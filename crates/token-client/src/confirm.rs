//! Bounded wait for a submitted transaction.
//!
//! Running out of time is not failure: the transaction may still land, so a
//! timeout reports [`ConfirmationOutcome::Pending`] and leaves the decision
//! to the caller.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::context::WalletContext;
use crate::error::Result;
use crate::rpc::{ChainRpc, Commitment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Reached the requested commitment without error.
    Confirmed,
    /// Landed but the runtime or a program rejected it.
    Failed(String),
    /// Not observed at the requested commitment before the deadline.
    Pending,
}

impl ConfirmationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationOutcome::Confirmed)
    }
}

/// Poll `getSignatureStatuses` until `signature` settles or `timeout` runs out.
///
/// Transport errors while polling are logged and polling continues; they say
/// nothing about the transaction itself.
pub async fn wait_for_confirmation(
    rpc: &dyn ChainRpc,
    signature: &str,
    commitment: Commitment,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ConfirmationOutcome> {
    let deadline = Instant::now() + timeout;

    loop {
        match rpc.get_signature_status(signature).await {
            Ok(Some(status)) => {
                if let Some(err) = status.err {
                    warn!(signature, "transaction failed: {err}");
                    return Ok(ConfirmationOutcome::Failed(err));
                }
                if status
                    .confirmation
                    .is_some_and(|reached| commitment.is_reached_by(reached))
                {
                    info!(signature, %commitment, "transaction confirmed");
                    return Ok(ConfirmationOutcome::Confirmed);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(signature, "status poll failed: {e}"),
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(signature, ?timeout, "confirmation still pending at deadline");
            return Ok(ConfirmationOutcome::Pending);
        }
        sleep(poll_interval.min(deadline - now)).await;
    }
}

/// [`wait_for_confirmation`] with the context's commitment and timings.
pub async fn confirm_signature(ctx: &WalletContext, signature: &str) -> Result<ConfirmationOutcome> {
    wait_for_confirmation(
        ctx.rpc.as_ref(),
        signature,
        ctx.config.commitment,
        ctx.config.confirm_timeout(),
        ctx.config.confirm_poll_interval(),
    )
    .await
}
