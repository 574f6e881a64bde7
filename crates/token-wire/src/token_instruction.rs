//! Token program instruction encoding.
//!
//! Implements the three token-program operations this crate needs
//! (`InitializeMint`, `Transfer`, `MintTo`) without the `spl-token` crate.
//! Each payload starts with a one-byte opcode followed by a fixed layout:
//!
//! ```text
//! InitializeMint (67 bytes)
//!   [0]        opcode = 0
//!   [1]        decimals
//!   [2..34]    mint authority
//!   [34]       freeze authority present (0 | 1)
//!   [35..67]   freeze authority (zero-filled when absent)
//!
//! Transfer / MintTo (9 bytes)
//!   [0]        opcode = 3 (Transfer) | 7 (MintTo)
//!   [1..9]     amount, u64 little-endian
//! ```

use crate::address::Pubkey;
use crate::error::WireError;
use crate::transaction::{SolAccountMeta, SolInstruction};

// ---------------------------------------------------------------------------
// Well-known program IDs
// ---------------------------------------------------------------------------

/// Token Program ID: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: Pubkey = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79,
    0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff,
    0x00, 0xa9,
];

/// Rent sysvar: `SysvarRent111111111111111111111111111111111`
pub const RENT_SYSVAR_ID: Pubkey = [
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x5c, 0x51, 0x21, 0x8c, 0xc9, 0x4c, 0x3d, 0x4a, 0xf1,
    0x7f, 0x58, 0xda, 0xee, 0x08, 0x9b, 0xa1, 0xfd, 0x44, 0xe3, 0xdb, 0xd9, 0x8a, 0x00, 0x00,
    0x00, 0x00,
];

const OPCODE_INITIALIZE_MINT: u8 = 0;
const OPCODE_TRANSFER: u8 = 3;
const OPCODE_MINT_TO: u8 = 7;

/// Length of every `InitializeMint` payload, freeze authority or not.
pub const INITIALIZE_MINT_DATA_LEN: usize = 67;

/// Length of `Transfer` and `MintTo` payloads.
pub const AMOUNT_DATA_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Instruction payloads
// ---------------------------------------------------------------------------

/// The token-program payloads this crate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenInstruction {
    InitializeMint {
        decimals: u8,
        mint_authority: Pubkey,
        freeze_authority: Option<Pubkey>,
    },
    Transfer {
        amount: u64,
    },
    MintTo {
        amount: u64,
    },
}

impl TokenInstruction {
    /// Serialize into the program's byte layout.
    pub fn pack(&self) -> Vec<u8> {
        match self {
            TokenInstruction::InitializeMint {
                decimals,
                mint_authority,
                freeze_authority,
            } => {
                let mut buf = Vec::with_capacity(INITIALIZE_MINT_DATA_LEN);
                buf.push(OPCODE_INITIALIZE_MINT);
                buf.push(*decimals);
                buf.extend_from_slice(mint_authority);
                match freeze_authority {
                    Some(authority) => {
                        buf.push(1);
                        buf.extend_from_slice(authority);
                    }
                    None => {
                        buf.push(0);
                        buf.extend_from_slice(&[0u8; 32]);
                    }
                }
                buf
            }
            TokenInstruction::Transfer { amount } => pack_amount(OPCODE_TRANSFER, *amount),
            TokenInstruction::MintTo { amount } => pack_amount(OPCODE_MINT_TO, *amount),
        }
    }

    /// Parse a payload produced by [`TokenInstruction::pack`].
    pub fn unpack(input: &[u8]) -> Result<Self, WireError> {
        let (&opcode, rest) = input
            .split_first()
            .ok_or_else(|| WireError::Decode("empty instruction data".into()))?;

        match opcode {
            OPCODE_INITIALIZE_MINT => {
                if input.len() != INITIALIZE_MINT_DATA_LEN {
                    return Err(WireError::Decode(format!(
                        "InitializeMint needs {INITIALIZE_MINT_DATA_LEN} bytes, got {}",
                        input.len()
                    )));
                }
                let decimals = rest[0];
                let mut mint_authority = [0u8; 32];
                mint_authority.copy_from_slice(&rest[1..33]);
                let freeze_authority = match rest[33] {
                    0 => None,
                    1 => {
                        let mut authority = [0u8; 32];
                        authority.copy_from_slice(&rest[34..66]);
                        Some(authority)
                    }
                    other => {
                        return Err(WireError::Decode(format!(
                            "invalid freeze authority flag {other}"
                        )))
                    }
                };
                Ok(TokenInstruction::InitializeMint {
                    decimals,
                    mint_authority,
                    freeze_authority,
                })
            }
            OPCODE_TRANSFER => Ok(TokenInstruction::Transfer {
                amount: unpack_amount(rest)?,
            }),
            OPCODE_MINT_TO => Ok(TokenInstruction::MintTo {
                amount: unpack_amount(rest)?,
            }),
            other => Err(WireError::Decode(format!("unsupported token opcode {other}"))),
        }
    }
}

fn pack_amount(opcode: u8, amount: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(AMOUNT_DATA_LEN);
    buf.push(opcode);
    buf.extend_from_slice(&amount.to_le_bytes());
    buf
}

fn unpack_amount(rest: &[u8]) -> Result<u64, WireError> {
    let bytes: [u8; 8] = rest.try_into().map_err(|_| {
        WireError::Decode(format!("amount needs 8 bytes, got {}", rest.len()))
    })?;
    Ok(u64::from_le_bytes(bytes))
}

/// Encode an `InitializeMint` payload.
///
/// The output is always [`INITIALIZE_MINT_DATA_LEN`] bytes: an absent freeze
/// authority is a zero flag followed by 32 zero bytes. Decimals are not
/// range-checked beyond fitting in a byte; the program decides what it accepts.
pub fn encode_initialize_mint(
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> Vec<u8> {
    TokenInstruction::InitializeMint {
        decimals,
        mint_authority: *mint_authority,
        freeze_authority: freeze_authority.copied(),
    }
    .pack()
}

/// Encode a `MintTo` payload: opcode 7 + u64 LE amount.
pub fn encode_mint_to(amount: u64) -> Vec<u8> {
    TokenInstruction::MintTo { amount }.pack()
}

/// Encode a `MintTo` payload from a wider integer, rejecting values that do
/// not fit the program's 64-bit amount field.
pub fn try_encode_mint_to(amount: u128) -> Result<Vec<u8>, WireError> {
    let amount = u64::try_from(amount)
        .map_err(|_| WireError::Encoding(format!("mint amount {amount} exceeds u64::MAX")))?;
    Ok(encode_mint_to(amount))
}

/// Encode a `Transfer` payload: opcode 3 + u64 LE amount.
pub fn encode_transfer(amount: u64) -> Vec<u8> {
    TokenInstruction::Transfer { amount }.pack()
}

// ---------------------------------------------------------------------------
// Instruction builders
// ---------------------------------------------------------------------------

/// Build an `InitializeMint` instruction.
///
/// Accounts: `[mint (writable), rent sysvar]`.
pub fn initialize_mint(
    mint: &Pubkey,
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> SolInstruction {
    SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*mint, false),
            SolAccountMeta::readonly(RENT_SYSVAR_ID, false),
        ],
        data: encode_initialize_mint(decimals, mint_authority, freeze_authority),
    }
}

/// Build a `MintTo` instruction.
///
/// Accounts: `[mint (writable), destination token account (writable),
/// mint authority (signer)]`.
pub fn mint_to(
    mint: &Pubkey,
    destination: &Pubkey,
    mint_authority: &Pubkey,
    amount: u64,
) -> SolInstruction {
    SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*mint, false),
            SolAccountMeta::writable(*destination, false),
            SolAccountMeta::readonly(*mint_authority, true),
        ],
        data: encode_mint_to(amount),
    }
}

/// Build a `Transfer` instruction.
///
/// Accounts: `[source (writable), destination (writable), owner (signer)]`.
/// Amounts are in base units: with 6 decimals, `1_000_000` is one token.
pub fn transfer(
    source: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> SolInstruction {
    SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*source, false),
            SolAccountMeta::writable(*destination, false),
            SolAccountMeta::readonly(*owner, true),
        ],
        data: encode_transfer(amount),
    }
}
