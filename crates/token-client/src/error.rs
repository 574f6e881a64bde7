use thiserror::Error;
use token_wire::WireError;

use crate::signer::SignerError;

/// Every failure a client operation can report.
///
/// Callers branch on the variant, never on the message text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("no off-curve program address found for any bump seed")]
    DerivationExhausted,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("account not found: {address}")]
    AccountNotFound { address: String },

    /// Lamports for native pre-checks, base units for token pre-checks.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error("user rejected the request")]
    UserRejected,

    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    /// The user declined in their wallet. Not a bug; nothing to report.
    pub fn is_user_rejected(&self) -> bool {
        matches!(self, ClientError::UserRejected)
    }

    /// Whether re-driving the operation can succeed without changing inputs.
    ///
    /// A missing account leads to the create path, a transport error may
    /// clear up, and an absent wallet can be installed. A failed submission
    /// is excluded: retrying it blindly could mint twice.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClientError::AccountNotFound { .. }
                | ClientError::Rpc(_)
                | ClientError::SignerUnavailable(_)
        )
    }
}

impl From<WireError> for ClientError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::DerivationExhausted => ClientError::DerivationExhausted,
            WireError::Decode(msg) => ClientError::Decode(msg),
            WireError::InvalidAddress(msg) => ClientError::Encoding(format!("invalid address: {msg}")),
            WireError::Encoding(msg) => ClientError::Encoding(msg),
            WireError::TransactionBuild(msg) => {
                ClientError::Encoding(format!("transaction build: {msg}"))
            }
            WireError::Signing(msg) => ClientError::Encoding(format!("signing: {msg}")),
            WireError::Serialization(msg) => {
                ClientError::Encoding(format!("serialization: {msg}"))
            }
        }
    }
}

impl From<SignerError> for ClientError {
    fn from(e: SignerError) -> Self {
        match e {
            SignerError::NotConnected => {
                ClientError::SignerUnavailable("no wallet connected".into())
            }
            SignerError::UserRejected => ClientError::UserRejected,
            SignerError::Failed(msg) => ClientError::SubmissionFailed(msg),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Rpc(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Rpc(format!("malformed response: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
