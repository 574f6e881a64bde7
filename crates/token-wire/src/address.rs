//! Account identifiers and their Base58 text form.
//!
//! Every account the token program touches (wallets, mints, token accounts,
//! programs, sysvars) is named by a raw 32-byte identifier. The text form is
//! plain Base58 of those bytes with no checksum or hashing step.

use crate::error::WireError;

/// A 32-byte account identifier.
pub type Pubkey = [u8; 32];

/// Convert a byte slice into a 32-byte identifier.
///
/// Instruction inputs arriving from outside (a wallet adapter, a stored
/// record) are not guaranteed to be the right length, so this is where a
/// malformed identifier becomes an `Encoding` error instead of a truncated
/// instruction buffer.
pub fn pubkey_from_slice(bytes: &[u8]) -> Result<Pubkey, WireError> {
    bytes.try_into().map_err(|_| {
        WireError::Encoding(format!(
            "account identifier must be 32 bytes, got {}",
            bytes.len()
        ))
    })
}

/// Validate an address string.
///
/// Returns `Ok(true)` if it decodes to exactly 32 bytes, or an error if
/// decoding fails or the length is wrong.
pub fn validate_address(address: &str) -> Result<bool, WireError> {
    address_to_bytes(address).map(|_| true)
}

/// Decode an address string to its 32-byte representation.
pub fn address_to_bytes(address: &str) -> Result<Pubkey, WireError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| WireError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    let arr: Pubkey = bytes.try_into().map_err(|v: Vec<u8>| {
        WireError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })?;

    Ok(arr)
}

/// Encode 32 bytes as an address string.
pub fn bytes_to_address(bytes: &Pubkey) -> String {
    bs58::encode(bytes).into_string()
}
