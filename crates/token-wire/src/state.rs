//! Mint and token account layouts.
//!
//! Both layouts are fixed-offset and little-endian. Optional keys use the
//! program's `COption` encoding: a u32 LE tag (0 = none, 1 = some) followed
//! by 32 key bytes that are zero when the tag is 0.
//!
//! ```text
//! Mint (82 bytes)
//!   [0..4)    mint authority tag     [4..36)   mint authority
//!   [36..44)  supply (u64)           [44]      decimals
//!   [45]      is_initialized         [46..50)  freeze authority tag
//!   [50..82)  freeze authority
//!
//! Token account (165 bytes)
//!   [0..32)    mint                  [32..64)   owner
//!   [64..72)   amount (u64)          [72..76)   delegate tag
//!   [76..108)  delegate              [108]      state
//!   [109..113) is_native tag         [113..121) rent-exempt reserve (u64)
//!   [121..129) delegated amount      [129..133) close authority tag
//!   [133..165) close authority
//! ```
//!
//! Decoders reject short buffers outright. Longer buffers are accepted and
//! only the base layout is read, since token-extension accounts append data
//! after it.

use crate::address::Pubkey;
use crate::error::WireError;

/// Size of a mint account.
pub const MINT_ACCOUNT_LEN: usize = 82;

/// Size of a token account.
pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// Bytes the runtime charges rent for on top of the account data.
const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;
/// Default lamports per byte-year.
const LAMPORTS_PER_BYTE_YEAR: u64 = 3480;
/// Years of rent an account must hold to be exempt.
const EXEMPTION_THRESHOLD_YEARS: u64 = 2;

/// Rent-exempt minimum under the default rent parameters.
///
/// The RPC answer is authoritative; this is for offline planning and for
/// sizing balance pre-checks before the network is reachable.
pub fn rent_exempt_minimum_estimate(data_len: usize) -> u64 {
    (ACCOUNT_STORAGE_OVERHEAD + data_len as u64)
        * LAMPORTS_PER_BYTE_YEAR
        * EXEMPTION_THRESHOLD_YEARS
}

/// A decoded mint account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MintAccount {
    /// `None` means the supply is fixed forever.
    pub mint_authority: Option<Pubkey>,
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub freeze_authority: Option<Pubkey>,
}

/// Lifecycle state of a token account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountState {
    #[default]
    Uninitialized,
    Initialized,
    Frozen,
}

impl AccountState {
    fn from_byte(byte: u8) -> Result<Self, WireError> {
        match byte {
            0 => Ok(AccountState::Uninitialized),
            1 => Ok(AccountState::Initialized),
            2 => Ok(AccountState::Frozen),
            other => Err(WireError::Decode(format!("invalid account state {other}"))),
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            AccountState::Uninitialized => 0,
            AccountState::Initialized => 1,
            AccountState::Frozen => 2,
        }
    }
}

/// A decoded token account: one owner's holding of one mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub delegate: Option<Pubkey>,
    pub state: AccountState,
    /// Rent-exempt reserve for wrapped native accounts.
    pub is_native: Option<u64>,
    pub delegated_amount: u64,
    pub close_authority: Option<Pubkey>,
}

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    let mut key = [0u8; 32];
    key.copy_from_slice(&data[offset..offset + 32]);
    key
}

fn read_tag(data: &[u8], offset: usize, field: &str) -> Result<bool, WireError> {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    match u32::from_le_bytes(bytes) {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(WireError::Decode(format!("invalid {field} option tag {other}"))),
    }
}

fn read_optional_pubkey(
    data: &[u8],
    offset: usize,
    field: &str,
) -> Result<Option<Pubkey>, WireError> {
    Ok(read_tag(data, offset, field)?.then(|| read_pubkey(data, offset + 4)))
}

fn write_optional_pubkey(buf: &mut [u8], offset: usize, key: Option<&Pubkey>) {
    match key {
        Some(key) => {
            buf[offset..offset + 4].copy_from_slice(&1u32.to_le_bytes());
            buf[offset + 4..offset + 36].copy_from_slice(key);
        }
        None => buf[offset..offset + 36].fill(0),
    }
}

fn ensure_len(data: &[u8], needed: usize, what: &str) -> Result<(), WireError> {
    if data.len() < needed {
        return Err(WireError::Decode(format!(
            "{what} needs {needed} bytes, got {}",
            data.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Mint
// ---------------------------------------------------------------------------

/// Decode a mint account blob.
pub fn decode_mint_account(data: &[u8]) -> Result<MintAccount, WireError> {
    ensure_len(data, MINT_ACCOUNT_LEN, "mint account")?;

    let is_initialized = match data[45] {
        0 => false,
        1 => true,
        other => {
            return Err(WireError::Decode(format!(
                "invalid mint initialized flag {other}"
            )))
        }
    };

    Ok(MintAccount {
        mint_authority: read_optional_pubkey(data, 0, "mint authority")?,
        supply: read_u64(data, 36),
        decimals: data[44],
        is_initialized,
        freeze_authority: read_optional_pubkey(data, 46, "freeze authority")?,
    })
}

impl MintAccount {
    /// Encode into the 82-byte mint layout.
    pub fn pack(&self) -> [u8; MINT_ACCOUNT_LEN] {
        let mut buf = [0u8; MINT_ACCOUNT_LEN];
        write_optional_pubkey(&mut buf, 0, self.mint_authority.as_ref());
        buf[36..44].copy_from_slice(&self.supply.to_le_bytes());
        buf[44] = self.decimals;
        buf[45] = self.is_initialized as u8;
        write_optional_pubkey(&mut buf, 46, self.freeze_authority.as_ref());
        buf
    }
}

// ---------------------------------------------------------------------------
// Token account
// ---------------------------------------------------------------------------

/// Decode a token account blob.
pub fn decode_token_account(data: &[u8]) -> Result<TokenAccount, WireError> {
    ensure_len(data, TOKEN_ACCOUNT_LEN, "token account")?;

    let is_native = read_tag(data, 109, "is_native")?.then(|| read_u64(data, 113));

    Ok(TokenAccount {
        mint: read_pubkey(data, 0),
        owner: read_pubkey(data, 32),
        amount: read_u64(data, 64),
        delegate: read_optional_pubkey(data, 72, "delegate")?,
        state: AccountState::from_byte(data[108])?,
        is_native,
        delegated_amount: read_u64(data, 121),
        close_authority: read_optional_pubkey(data, 129, "close authority")?,
    })
}

impl TokenAccount {
    /// Encode into the 165-byte token account layout.
    pub fn pack(&self) -> [u8; TOKEN_ACCOUNT_LEN] {
        let mut buf = [0u8; TOKEN_ACCOUNT_LEN];
        buf[0..32].copy_from_slice(&self.mint);
        buf[32..64].copy_from_slice(&self.owner);
        buf[64..72].copy_from_slice(&self.amount.to_le_bytes());
        write_optional_pubkey(&mut buf, 72, self.delegate.as_ref());
        buf[108] = self.state.to_byte();
        if let Some(reserve) = self.is_native {
            buf[109..113].copy_from_slice(&1u32.to_le_bytes());
            buf[113..121].copy_from_slice(&reserve.to_le_bytes());
        }
        buf[121..129].copy_from_slice(&self.delegated_amount.to_le_bytes());
        write_optional_pubkey(&mut buf, 129, self.close_authority.as_ref());
        buf
    }

    /// Whether transfers out of this account are currently blocked.
    pub fn is_frozen(&self) -> bool {
        self.state == AccountState::Frozen
    }
}
