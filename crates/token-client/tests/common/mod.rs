//! In-memory collaborators for the client tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use token_client::{
    AccountInfo, ChainRpc, ClientConfig, ClientError, Commitment, KeypairSigner, LatestBlockhash,
    SignatureStatus, SignedSubmission, SignerError, TransactionSigner, WalletContext,
};
use token_wire::{
    bytes_to_address, decode_compact_u16, missing_signers, pubkey_from_seed,
    rent_exempt_minimum_estimate, transaction_signature, MintAccount, Pubkey, TokenAccount,
    AccountState, TOKEN_PROGRAM_ID,
};

pub const PAYER_SEED: [u8; 32] = [0x11; 32];

pub fn payer() -> Pubkey {
    pubkey_from_seed(&PAYER_SEED)
}

/// What the mock reports for every submitted signature.
#[derive(Debug, Clone)]
pub enum StatusMode {
    Confirm,
    Fail(String),
    Never,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<Pubkey, AccountInfo>,
    balances: HashMap<Pubkey, u64>,
    sent: Vec<Vec<u8>>,
    calls: Vec<&'static str>,
    blockhash_counter: u8,
    status: Option<StatusMode>,
    failing: Vec<&'static str>,
}

/// A chain held in a hash map.
#[derive(Debug, Default)]
pub struct MockRpc {
    state: Mutex<State>,
}

impl MockRpc {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.state.lock().unwrap().balances.insert(address, lamports);
    }

    pub fn put_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        let info = AccountInfo {
            lamports: rent_exempt_minimum_estimate(data.len()),
            owner,
            data,
        };
        self.state.lock().unwrap().accounts.insert(address, info);
    }

    pub fn put_mint(&self, address: Pubkey, mint: &MintAccount) {
        self.put_account(address, TOKEN_PROGRAM_ID, mint.pack().to_vec());
    }

    pub fn put_token_account(&self, address: Pubkey, account: &TokenAccount) {
        self.put_account(address, TOKEN_PROGRAM_ID, account.pack().to_vec());
    }

    pub fn set_status_mode(&self, mode: StatusMode) {
        self.state.lock().unwrap().status = Some(mode);
    }

    /// Make every call to `method` fail with an RPC error.
    pub fn fail(&self, method: &'static str) {
        self.state.lock().unwrap().failing.push(method);
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    fn enter(&self, method: &'static str) -> Result<std::sync::MutexGuard<'_, State>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method);
        if state.failing.contains(&method) {
            return Err(ClientError::Rpc(format!("{method}: connection refused")));
        }
        Ok(state)
    }
}

#[async_trait]
impl ChainRpc for MockRpc {
    async fn get_balance(&self, address: &Pubkey) -> token_client::Result<u64> {
        let state = self.enter("getBalance")?;
        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    async fn get_account_info(&self, address: &Pubkey) -> token_client::Result<Option<AccountInfo>> {
        let state = self.enter("getAccountInfo")?;
        Ok(state.accounts.get(address).cloned())
    }

    async fn get_latest_blockhash(&self) -> token_client::Result<LatestBlockhash> {
        let mut state = self.enter("getLatestBlockhash")?;
        state.blockhash_counter = state.blockhash_counter.wrapping_add(1);
        Ok(LatestBlockhash {
            blockhash: [state.blockhash_counter; 32],
            last_valid_block_height: 1_000 + state.blockhash_counter as u64,
        })
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> token_client::Result<u64> {
        let _state = self.enter("getMinimumBalanceForRentExemption")?;
        Ok(rent_exempt_minimum_estimate(data_len))
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> token_client::Result<String> {
        let mut state = self.enter("sendTransaction")?;
        let missing = missing_signers(wire).map_err(ClientError::from)?;
        if !missing.is_empty() {
            return Err(ClientError::SubmissionFailed(format!(
                "missing signature for {}",
                bytes_to_address(&missing[0])
            )));
        }
        state.sent.push(wire.to_vec());
        let signature = transaction_signature(wire).map_err(ClientError::from)?;
        Ok(bs58::encode(signature).into_string())
    }

    async fn get_signature_status(&self, _signature: &str) -> token_client::Result<Option<SignatureStatus>> {
        let state = self.enter("getSignatureStatuses")?;
        Ok(match state.status.clone().unwrap_or(StatusMode::Confirm) {
            StatusMode::Confirm => Some(SignatureStatus {
                confirmation: Some(Commitment::Finalized),
                err: None,
            }),
            StatusMode::Fail(err) => Some(SignatureStatus {
                confirmation: Some(Commitment::Processed),
                err: Some(err),
            }),
            StatusMode::Never => None,
        })
    }
}

/// A wallet that declines or is absent.
#[derive(Debug)]
pub enum UnhappySigner {
    Rejecting(Pubkey),
    Disconnected,
}

#[async_trait]
impl TransactionSigner for UnhappySigner {
    fn pubkey(&self) -> Result<Pubkey, SignerError> {
        match self {
            UnhappySigner::Rejecting(pubkey) => Ok(*pubkey),
            UnhappySigner::Disconnected => Err(SignerError::NotConnected),
        }
    }

    async fn sign_and_send(&self, _wire: &[u8]) -> Result<SignedSubmission, SignerError> {
        match self {
            UnhappySigner::Rejecting(_) => Err(SignerError::UserRejected),
            UnhappySigner::Disconnected => Err(SignerError::NotConnected),
        }
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        rpc_url: "http://localhost:8899".into(),
        confirm_timeout_ms: 50,
        confirm_poll_interval_ms: 5,
        ..ClientConfig::default()
    }
}

/// A context whose payer signs locally with [`PAYER_SEED`].
pub fn wallet(rpc: &Arc<MockRpc>) -> WalletContext {
    let mut seed = PAYER_SEED;
    let dyn_rpc: Arc<dyn ChainRpc> = rpc.clone();
    let signer = Arc::new(KeypairSigner::new(&mut seed, dyn_rpc.clone()));
    WalletContext::new(dyn_rpc, signer, test_config())
}

pub fn wallet_with(rpc: &Arc<MockRpc>, signer: UnhappySigner) -> WalletContext {
    WalletContext::new(rpc.clone(), Arc::new(signer), test_config())
}

pub fn initialized_mint(authority: Option<Pubkey>, decimals: u8, supply: u64) -> MintAccount {
    MintAccount {
        mint_authority: authority,
        supply,
        decimals,
        is_initialized: true,
        freeze_authority: None,
    }
}

pub fn holding(mint: Pubkey, owner: Pubkey, amount: u64) -> TokenAccount {
    TokenAccount {
        mint,
        owner,
        amount,
        state: AccountState::Initialized,
        ..TokenAccount::default()
    }
}

/// One compiled instruction read back from wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<Pubkey>,
    pub data: Vec<u8>,
}

/// A wire transaction read back into its parts.
#[derive(Debug, Clone)]
pub struct SentTransaction {
    pub num_signatures: usize,
    pub account_keys: Vec<Pubkey>,
    pub blockhash: [u8; 32],
    pub instructions: Vec<SentInstruction>,
}

fn take<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> &'a [u8] {
    let slice = &data[*pos..*pos + len];
    *pos += len;
    slice
}

fn take_len(data: &[u8], pos: &mut usize) -> usize {
    let (value, used) = decode_compact_u16(&data[*pos..]).unwrap();
    *pos += used;
    value as usize
}

fn key(bytes: &[u8]) -> Pubkey {
    bytes.try_into().unwrap()
}

pub fn parse_sent(wire: &[u8]) -> SentTransaction {
    let mut pos = 0;
    let num_signatures = take_len(wire, &mut pos);
    pos += 64 * num_signatures;
    pos += 3;
    let num_keys = take_len(wire, &mut pos);
    let account_keys: Vec<Pubkey> = (0..num_keys).map(|_| key(take(wire, &mut pos, 32))).collect();
    let blockhash = key(take(wire, &mut pos, 32));
    let num_instructions = take_len(wire, &mut pos);
    let instructions = (0..num_instructions)
        .map(|_| {
            let program_id = account_keys[take(wire, &mut pos, 1)[0] as usize];
            let n = take_len(wire, &mut pos);
            let accounts = take(wire, &mut pos, n)
                .iter()
                .map(|i| account_keys[*i as usize])
                .collect();
            let len = take_len(wire, &mut pos);
            let data = take(wire, &mut pos, len).to_vec();
            SentInstruction {
                program_id,
                accounts,
                data,
            }
        })
        .collect();
    SentTransaction {
        num_signatures,
        account_keys,
        blockhash,
        instructions,
    }
}
