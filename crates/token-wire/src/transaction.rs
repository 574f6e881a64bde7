//! Transaction compilation, wire format and partial signing.
//!
//! A wire transaction is a compact-u16 count of signature slots, the 64-byte
//! slots themselves, then the message. The message opens with a three-byte
//! header (required signatures, read-only signed, read-only unsigned), then
//! the account key table, the recent blockhash and the compiled
//! instructions. Every variable-length list is prefixed by its compact-u16
//! length; instructions refer to accounts by their u8 index in the table.
//!
//! Instructions are compiled in exactly the order the caller supplies them.
//! The runtime executes them in that order and atomically, so the order is
//! part of the caller's contract (create the mint before initializing it,
//! initialize before minting) and is never rearranged here.

use ed25519_dalek::Signer;
use zeroize::Zeroize;

use crate::address::Pubkey;
use crate::error::WireError;

/// Size of an Ed25519 signature slot in the wire format.
pub const SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` as compact-u16: seven bits per byte, low bits first, high
/// bit set on every byte but the last. Takes one to three bytes.
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut rest = value;
    let mut out = Vec::with_capacity(3);
    while rest >= 0x80 {
        out.push((rest as u8 & 0x7f) | 0x80);
        rest >>= 7;
    }
    out.push(rest as u8);
    out
}

/// Decode a compact-u16 prefix of `data` into `(value, bytes_read)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), WireError> {
    let mut value = 0u32;
    for (i, byte) in data.iter().take(3).enumerate() {
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| WireError::Serialization("compact-u16 value overflow".into()));
        }
    }
    Err(WireError::Serialization(
        "truncated compact-u16 length prefix".into(),
    ))
}

fn compact_len(len: usize, what: &str) -> Result<Vec<u8>, WireError> {
    let value = u16::try_from(len)
        .map_err(|_| WireError::Serialization(format!("{what} length {len} exceeds u16")))?;
    Ok(encode_compact_u16(value))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl SolAccountMeta {
    /// A writable account reference.
    pub fn writable(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account reference.
    pub fn readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before it is compiled into a transaction.
///
/// The first byte of `data` is the target program's opcode discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled, unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransaction {
    /// Fee payer first, then writable signers, read-only signers, writable
    /// non-signers and read-only non-signers.
    pub account_keys: Vec<Pubkey>,

    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,

    /// Freshness token; the transaction expires with it.
    pub recent_blockhash: [u8; 32],

    /// Same order as the instructions passed to [`compile_transaction`].
    pub compiled_instructions: Vec<CompiledInstruction>,
}

/// An instruction whose accounts are indices into `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

impl SolTransaction {
    /// The fee payer is always the first account key.
    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.account_keys.first()
    }

    /// Account keys that must sign, in signature-slot order.
    pub fn signers(&self) -> &[Pubkey] {
        let n = (self.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Wire bytes with every signature slot zero-filled.
    ///
    /// This is the form handed to an external wallet, which fills its own
    /// slot; local keys fill theirs with [`partial_sign`].
    pub fn to_unsigned_wire(&self) -> Result<Vec<u8>, WireError> {
        let message = serialize_message(self)?;
        let num_sigs = self.num_required_signatures as usize;

        let mut wire = Vec::with_capacity(3 + num_sigs * SIGNATURE_LEN + message.len());
        wire.extend_from_slice(&encode_compact_u16(self.num_required_signatures as u16));
        wire.resize(wire.len() + num_sigs * SIGNATURE_LEN, 0);
        wire.extend_from_slice(&message);
        Ok(wire)
    }
}

// ---------------------------------------------------------------------------
// Transaction building
// ---------------------------------------------------------------------------

/// Compile instructions into a transaction with a single fee payer.
///
/// The fee payer is always a writable signer at index 0. Accounts are
/// deduplicated with their permission bits OR-ed together. The instruction
/// list itself is compiled in the order given.
pub fn compile_transaction(
    instructions: &[SolInstruction],
    fee_payer: &Pubkey,
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, WireError> {
    if instructions.is_empty() {
        return Err(WireError::TransactionBuild(
            "transaction needs at least one instruction".into(),
        ));
    }

    // Instruction account lists are tiny, a linear scan beats hashing here.
    struct AccountEntry {
        pubkey: Pubkey,
        is_signer: bool,
        is_writable: bool,
    }

    let mut entries: Vec<AccountEntry> = Vec::new();

    let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    upsert(*fee_payer, true, true);

    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        // Program IDs are non-signer, read-only accounts.
        upsert(ix.program_id, false, false);
    }

    // Stable sort: insertion order is kept inside each category.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    if entries.len() > u8::MAX as usize {
        return Err(WireError::TransactionBuild(format!(
            "too many accounts: {}",
            entries.len()
        )));
    }

    if let Some(pos) = entries.iter().position(|e| e.pubkey == *fee_payer) {
        entries.swap(0, pos);
    }

    let (mut signed, mut readonly_signed, mut readonly_unsigned) = (0u8, 0u8, 0u8);
    for e in &entries {
        match (e.is_signer, e.is_writable) {
            (true, true) => signed += 1,
            (true, false) => {
                signed += 1;
                readonly_signed += 1;
            }
            (false, false) => readonly_unsigned += 1,
            (false, true) => {}
        }
    }

    let account_keys: Vec<Pubkey> = entries.iter().map(|e| e.pubkey).collect();

    let index_of = |key: &Pubkey, what: &str| -> Result<u8, WireError> {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .ok_or_else(|| WireError::TransactionBuild(format!("{what} not in account keys")))
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in instructions {
        let program_id_index = index_of(&ix.program_id, "program_id")?;

        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.pubkey, "account"))
            .collect::<Result<Vec<u8>, _>>()?;

        compiled.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(SolTransaction {
        account_keys,
        num_required_signatures: signed,
        num_readonly_signed: readonly_signed,
        num_readonly_unsigned: readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        compiled_instructions: compiled,
    })
}

/// The message bytes every signer signs.
pub fn serialize_message(tx: &SolTransaction) -> Result<Vec<u8>, WireError> {
    let mut out = vec![
        tx.num_required_signatures,
        tx.num_readonly_signed,
        tx.num_readonly_unsigned,
    ];

    out.extend(compact_len(tx.account_keys.len(), "account key list")?);
    out.extend(tx.account_keys.iter().flatten());
    out.extend_from_slice(&tx.recent_blockhash);

    out.extend(compact_len(tx.compiled_instructions.len(), "instruction list")?);
    for ix in &tx.compiled_instructions {
        out.push(ix.program_id_index);
        out.extend(compact_len(ix.account_indices.len(), "account index list")?);
        out.extend_from_slice(&ix.account_indices);
        out.extend(compact_len(ix.data.len(), "instruction data")?);
        out.extend_from_slice(&ix.data);
    }

    Ok(out)
}

/// Sign a compiled transaction with every listed key and return wire bytes.
///
/// Each key must belong to one of the transaction's signers. Slots for
/// signers whose key is not supplied stay zero-filled.
pub fn sign_transaction(
    tx: &SolTransaction,
    private_keys: &[&[u8; 32]],
) -> Result<Vec<u8>, WireError> {
    let mut wire = tx.to_unsigned_wire()?;
    for key in private_keys {
        wire = partial_sign(key, &wire)?;
    }
    Ok(wire)
}

// ---------------------------------------------------------------------------
// Raw wire signing
// ---------------------------------------------------------------------------

struct WireLayout<'a> {
    sigs_start: usize,
    num_sigs: usize,
    message: &'a [u8],
    signer_keys: Vec<&'a [u8]>,
}

fn parse_wire(raw_tx: &[u8]) -> Result<WireLayout<'_>, WireError> {
    let (num_sigs, compact_len) = decode_compact_u16(raw_tx)?;

    if num_sigs == 0 {
        return Err(WireError::TransactionBuild(
            "transaction has zero signatures".into(),
        ));
    }

    let sigs_start = compact_len;
    let sigs_end = sigs_start + (num_sigs as usize) * SIGNATURE_LEN;

    if sigs_end > raw_tx.len() {
        return Err(WireError::Serialization(
            "transaction too short: signature slots exceed length".into(),
        ));
    }

    let message = &raw_tx[sigs_end..];

    if message.len() < 4 {
        return Err(WireError::Serialization(
            "transaction message too short".into(),
        ));
    }

    let num_required_sigs = message[0] as usize;
    let (num_accounts, accounts_compact_len) = decode_compact_u16(&message[3..])?;

    let accounts_start = 3 + accounts_compact_len;
    let accounts_end = accounts_start + (num_accounts as usize) * 32;

    if accounts_end > message.len() {
        return Err(WireError::Serialization(
            "transaction message too short for account keys".into(),
        ));
    }

    let signer_keys = (0..num_required_sigs.min(num_accounts as usize))
        .map(|i| &message[accounts_start + i * 32..accounts_start + (i + 1) * 32])
        .collect();

    Ok(WireLayout {
        sigs_start,
        num_sigs: num_sigs as usize,
        message,
        signer_keys,
    })
}

/// Sign a wire-format transaction with one Ed25519 key.
///
/// Locates the signature slot belonging to the key's public half, signs the
/// message bytes and writes the signature into that slot. Other slots are
/// left untouched, so a mint key can sign first and the wallet afterwards.
pub fn partial_sign(private_key: &[u8; 32], raw_tx: &[u8]) -> Result<Vec<u8>, WireError> {
    let mut seed = *private_key;
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
    seed.zeroize();
    let our_pubkey = signing_key.verifying_key().to_bytes();

    let layout = parse_wire(raw_tx)?;

    let signer_idx = layout
        .signer_keys
        .iter()
        .position(|k| *k == our_pubkey)
        .filter(|i| *i < layout.num_sigs)
        .ok_or_else(|| WireError::Signing("signing key not found in transaction signers".into()))?;

    let signature = signing_key.sign(layout.message);

    let mut signed_tx = raw_tx.to_vec();
    let sig_offset = layout.sigs_start + signer_idx * SIGNATURE_LEN;
    signed_tx[sig_offset..sig_offset + SIGNATURE_LEN].copy_from_slice(&signature.to_bytes());

    Ok(signed_tx)
}

/// The first signature of a wire transaction, which is its identifier.
pub fn transaction_signature(raw_tx: &[u8]) -> Result<[u8; 64], WireError> {
    let layout = parse_wire(raw_tx)?;
    let mut sig = [0u8; 64];
    sig.copy_from_slice(&raw_tx[layout.sigs_start..layout.sigs_start + SIGNATURE_LEN]);
    Ok(sig)
}

/// Signers whose slot is still zero-filled.
pub fn missing_signers(raw_tx: &[u8]) -> Result<Vec<Pubkey>, WireError> {
    let layout = parse_wire(raw_tx)?;
    let mut missing = Vec::new();
    for (i, key) in layout.signer_keys.iter().enumerate().take(layout.num_sigs) {
        let start = layout.sigs_start + i * SIGNATURE_LEN;
        if raw_tx[start..start + SIGNATURE_LEN].iter().all(|b| *b == 0) {
            let mut pk = [0u8; 32];
            pk.copy_from_slice(key);
            missing.push(pk);
        }
    }
    Ok(missing)
}
