use thiserror::Error;

/// Errors raised while encoding, deriving, compiling or decoding wire data.
///
/// None of these are retryable: each one means the inputs themselves are
/// wrong, so the operation aborts before anything touches the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("no off-curve program address found for any bump seed")]
    DerivationExhausted,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("transaction build error: {0}")]
    TransactionBuild(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
