use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::rpc::{ChainRpc, HttpRpc};
use crate::signer::TransactionSigner;

/// The connection and wallet every client operation runs against.
///
/// Passed explicitly to each flow; nothing in this crate reads ambient
/// wallet state.
#[derive(Clone)]
pub struct WalletContext {
    pub rpc: Arc<dyn ChainRpc>,
    pub signer: Arc<dyn TransactionSigner>,
    pub config: ClientConfig,
}

impl WalletContext {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        signer: Arc<dyn TransactionSigner>,
        config: ClientConfig,
    ) -> Self {
        Self {
            rpc,
            signer,
            config,
        }
    }

    /// Connect to the configured endpoint over HTTP.
    pub fn connect(config: ClientConfig, signer: Arc<dyn TransactionSigner>) -> Result<Self> {
        config.validate()?;
        let rpc: Arc<dyn ChainRpc> = Arc::new(HttpRpc::from_config(&config)?);
        Ok(Self::new(rpc, signer, config))
    }
}

impl std::fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletContext")
            .field("rpc_url", &self.config.rpc_url)
            .field("commitment", &self.config.commitment)
            .finish_non_exhaustive()
    }
}
