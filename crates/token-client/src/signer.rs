//! The external signer boundary.
//!
//! A browser wallet, a hardware wallet or a local key all look the same to
//! the assembler: something that knows its public key, fills its signature
//! slot in a wire transaction and hands it to the network.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use token_wire::{bytes_to_address, partial_sign, pubkey_from_seed, Pubkey};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::ClientError;
use crate::rpc::ChainRpc;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signer not connected")]
    NotConnected,

    #[error("user rejected the request")]
    UserRejected,

    #[error("signer failed: {0}")]
    Failed(String),
}

/// What a signer hands back after the network accepted a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSubmission {
    /// Base58 transaction signature.
    pub signature: String,
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// The fee payer's address. `NotConnected` when no wallet is attached.
    fn pubkey(&self) -> Result<Pubkey, SignerError>;

    /// Fill this signer's slot in `wire` and submit it.
    ///
    /// Slots belonging to other signers are already filled by the caller.
    async fn sign_and_send(&self, wire: &[u8]) -> Result<SignedSubmission, SignerError>;
}

/// A signer holding its Ed25519 seed in process memory.
///
/// Used by scripts and services that own their fee-payer key. The seed is
/// zeroized when the signer is dropped.
pub struct KeypairSigner {
    seed: Zeroizing<[u8; 32]>,
    pubkey: Pubkey,
    rpc: Arc<dyn ChainRpc>,
}

impl KeypairSigner {
    /// Takes ownership of the seed. The input is zeroized.
    pub fn new(seed: &mut [u8; 32], rpc: Arc<dyn ChainRpc>) -> Self {
        let owned = Zeroizing::new(*seed);
        zeroize::Zeroize::zeroize(seed);
        let pubkey = pubkey_from_seed(&owned);
        Self {
            seed: owned,
            pubkey,
            rpc,
        }
    }
}

impl std::fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("pubkey", &bytes_to_address(&self.pubkey))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn pubkey(&self) -> Result<Pubkey, SignerError> {
        Ok(self.pubkey)
    }

    async fn sign_and_send(&self, wire: &[u8]) -> Result<SignedSubmission, SignerError> {
        let signed = partial_sign(&self.seed, wire).map_err(|e| SignerError::Failed(e.to_string()))?;
        debug!(signer = %bytes_to_address(&self.pubkey), "signed locally");
        let signature = self
            .rpc
            .send_raw_transaction(&signed)
            .await
            .map_err(submission_error)?;
        Ok(SignedSubmission { signature })
    }
}

/// Keeps the node's or the transport's own message. A send that failed in
/// transit may still have landed, so it is reported as a failed submission
/// rather than a retryable RPC error.
fn submission_error(e: ClientError) -> SignerError {
    match e {
        ClientError::SubmissionFailed(msg) | ClientError::Rpc(msg) => SignerError::Failed(msg),
        other => SignerError::Failed(other.to_string()),
    }
}
