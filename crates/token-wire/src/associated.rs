//! Program-derived addresses and the associated token account program.
//!
//! An associated token account (ATA) is the one canonical token account for
//! an (owner, mint) pair. Its address is a program-derived address (PDA) of
//! the associated-token-account program with seeds
//! `[owner, token_program_id, mint]`, so anyone can recompute it without a
//! private key. Getting this derivation wrong sends funds to an account no
//! one can ever sign for.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};

use crate::address::Pubkey;
use crate::error::WireError;
use crate::system::SYSTEM_PROGRAM_ID;
use crate::token_instruction::TOKEN_PROGRAM_ID;
use crate::transaction::{SolAccountMeta, SolInstruction};

/// Associated Token Account Program ID: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d,
    0x83, 0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9,
    0xf8, 0x59,
];

/// The string appended to PDA derivation: "ProgramDerivedAddress".
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Maximum number of seeds (including the bump) the runtime accepts.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

/// `CreateIdempotent` discriminator of the associated token account program.
const ATA_CREATE_IDEMPOTENT: u8 = 1;

// ---------------------------------------------------------------------------
// Program-derived addresses
// ---------------------------------------------------------------------------

/// Find a valid program-derived address for the given seeds and program.
///
/// Iterates bump seeds from 255 down to 0, computing
/// `SHA-256(seed_0 || ... || seed_n || bump || program_id || "ProgramDerivedAddress")`
/// and returning the first result that is NOT a valid Ed25519 point.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), WireError> {
    find_program_address_with(seeds, program_id, is_on_curve)
}

fn find_program_address_with(
    seeds: &[&[u8]],
    program_id: &Pubkey,
    on_curve: impl Fn(&[u8; 32]) -> bool,
) -> Result<(Pubkey, u8), WireError> {
    check_seeds(seeds, 1)?;

    for bump in (0u8..=255).rev() {
        let hash = hash_seeds(seeds, &[bump], program_id);
        if !on_curve(&hash) {
            return Ok((hash, bump));
        }
    }

    Err(WireError::DerivationExhausted)
}

/// Create a program-derived address from seeds that already include a bump.
///
/// Returns `Ok(None)` when the hash lands on the curve, which means the
/// seeds do not name a valid PDA.
pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<Option<Pubkey>, WireError> {
    check_seeds(seeds, 0)?;
    let hash = hash_seeds(seeds, &[], program_id);
    Ok((!is_on_curve(&hash)).then_some(hash))
}

fn check_seeds(seeds: &[&[u8]], reserved: usize) -> Result<(), WireError> {
    if seeds.len() + reserved > MAX_SEEDS {
        return Err(WireError::Encoding(format!(
            "at most {MAX_SEEDS} seeds allowed, got {}",
            seeds.len() + reserved
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(WireError::Encoding(format!(
            "seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }
    Ok(())
}

fn hash_seeds(seeds: &[&[u8]], bump_seed: &[u8], program_id: &Pubkey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(bump_seed);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);
    hasher.finalize().into()
}

/// Whether 32 bytes decompress to a point on the Ed25519 curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

// ---------------------------------------------------------------------------
// Associated token accounts
// ---------------------------------------------------------------------------

/// Derive the associated token account address for an owner + mint pair
/// under explicit program IDs.
pub fn derive_associated_token_address(
    owner: &Pubkey,
    token_program_id: &Pubkey,
    mint: &Pubkey,
    associated_program_id: &Pubkey,
) -> Result<Pubkey, WireError> {
    find_program_address(
        &[owner.as_ref(), token_program_id.as_ref(), mint.as_ref()],
        associated_program_id,
    )
    .map(|(address, _bump)| address)
}

/// Derive the associated token account under the standard token and
/// associated-token-account programs.
pub fn get_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, WireError> {
    derive_associated_token_address(owner, &TOKEN_PROGRAM_ID, mint, &ASSOCIATED_TOKEN_PROGRAM_ID)
}

/// Payload of the associated-token-account program's idempotent create.
pub fn encode_create_associated_account() -> Vec<u8> {
    vec![ATA_CREATE_IDEMPOTENT]
}

/// Build the instruction that creates `owner`'s associated account for `mint`.
///
/// Returns the derived address alongside the instruction. Accounts:
/// `[payer (signer, writable), ata (writable), owner, mint, system program,
/// token program]`.
pub fn create_associated_token_account(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, SolInstruction), WireError> {
    let ata = get_associated_token_address(owner, mint)?;
    let instruction = SolInstruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*payer, true),
            SolAccountMeta::writable(ata, false),
            SolAccountMeta::readonly(*owner, false),
            SolAccountMeta::readonly(*mint, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ],
        data: encode_create_associated_account(),
    };
    Ok((ata, instruction))
}
