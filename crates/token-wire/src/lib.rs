//! Token program wire layer for Solana.
//!
//! This crate builds token-program and associated-token-account instructions
//! byte by byte, derives associated token account addresses, compiles and
//! partially signs transactions, and decodes mint / token account blobs. It
//! deliberately avoids `solana-sdk` and `spl-token`: every layout here is the
//! program's fixed binary contract, written out by hand and pinned by tests.
//!
//! Nothing in this crate performs I/O. Network access, wallet signing and
//! confirmation live in `token-client`.

pub mod address;
pub mod amount;
pub mod associated;
pub mod error;
pub mod keypair;
pub mod state;
pub mod system;
pub mod token_instruction;
pub mod transaction;

pub use address::{
    address_to_bytes, bytes_to_address, pubkey_from_slice, validate_address, Pubkey,
};
pub use amount::{base_units_to_ui_string, ui_amount_to_base_units, whole_tokens_to_base_units};
pub use associated::{
    create_associated_token_account, derive_associated_token_address,
    encode_create_associated_account, find_program_address, get_associated_token_address,
    ASSOCIATED_TOKEN_PROGRAM_ID,
};
pub use error::WireError;
pub use keypair::{pubkey_from_seed, MintKeypair};
pub use state::{
    decode_mint_account, decode_token_account, rent_exempt_minimum_estimate, AccountState,
    MintAccount, TokenAccount, MINT_ACCOUNT_LEN, TOKEN_ACCOUNT_LEN,
};
pub use system::SYSTEM_PROGRAM_ID;
pub use token_instruction::{
    encode_initialize_mint, encode_mint_to, encode_transfer, try_encode_mint_to,
    TokenInstruction, RENT_SYSVAR_ID, TOKEN_PROGRAM_ID,
};
pub use transaction::{
    compile_transaction, decode_compact_u16, encode_compact_u16, missing_signers, partial_sign,
    serialize_message, sign_transaction, transaction_signature, CompiledInstruction,
    SolAccountMeta, SolInstruction, SolTransaction,
};
