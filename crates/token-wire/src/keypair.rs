//! Fresh identities for new mint accounts.
//!
//! Every mint is a brand-new keypair. The key signs exactly once (the
//! create-account instruction that allocates the mint) and the caller keeps
//! only the public half afterwards. The secret is zeroized on drop.

use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use zeroize::Zeroize;

use crate::address::{bytes_to_address, Pubkey};
use crate::error::WireError;
use crate::transaction::partial_sign;

/// A one-shot Ed25519 keypair identifying a new mint account.
pub struct MintKeypair {
    signing_key: SigningKey,
}

impl MintKeypair {
    /// Generate a new random identity from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild an identity from its 32-byte seed. The input is zeroized.
    pub fn from_seed(seed: &mut [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        seed.zeroize();
        Self { signing_key }
    }

    /// The mint address.
    pub fn pubkey(&self) -> Pubkey {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Fill this identity's signature slot in a wire transaction.
    pub fn sign_wire(&self, raw_tx: &[u8]) -> Result<Vec<u8>, WireError> {
        let mut seed = self.signing_key.to_bytes();
        let signed = partial_sign(&seed, raw_tx);
        seed.zeroize();
        signed
    }
}

/// Public half of an Ed25519 seed.
pub fn pubkey_from_seed(seed: &[u8; 32]) -> Pubkey {
    SigningKey::from_bytes(seed).verifying_key().to_bytes()
}

impl std::fmt::Debug for MintKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintKeypair")
            .field("pubkey", &bytes_to_address(&self.pubkey()))
            .finish_non_exhaustive()
    }
}
