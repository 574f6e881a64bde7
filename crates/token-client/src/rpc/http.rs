//! JSON-RPC over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use token_wire::{address_to_bytes, bytes_to_address, Pubkey};
use tracing::{debug, error};

use super::{AccountInfo, ChainRpc, Commitment, LatestBlockhash, SignatureStatus};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// A [`ChainRpc`] backed by a node's JSON-RPC endpoint.
#[derive(Debug)]
pub struct HttpRpc {
    client: reqwest::Client,
    url: String,
    commitment: Commitment,
    next_id: AtomicU64,
}

impl HttpRpc {
    pub fn new(url: impl Into<String>, commitment: Commitment, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            commitment,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            config.rpc_url.clone(),
            config.commitment,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post one request and return its `result` member.
    ///
    /// Transport and HTTP failures become [`ClientError::Rpc`]. A JSON-RPC
    /// `error` object is returned as `Err(Ok(error))` so that callers can map
    /// it to the kind that fits the method.
    async fn call(&self, method: &str, params: Value) -> Result<std::result::Result<Value, Value>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(method, "rpc request error: {e}");
                ClientError::Rpc(format!("{method}: {e}"))
            })?;

        if !response.status().is_success() {
            error!(method, status = %response.status(), "rpc http error");
            return Err(ClientError::Rpc(format!(
                "{method}: http status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Rpc(format!("{method}: malformed response: {e}")))?;
        split_response(method, body)
    }

    async fn query(&self, method: &str, params: Value) -> Result<Value> {
        query_outcome(method, self.call(method, params).await?)
    }
}

#[async_trait]
impl ChainRpc for HttpRpc {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        let result = self
            .query(
                "getBalance",
                json!([bytes_to_address(address), { "commitment": self.commitment.as_str() }]),
            )
            .await?;
        parse_balance(&result)
    }

    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountInfo>> {
        let result = self
            .query(
                "getAccountInfo",
                json!([
                    bytes_to_address(address),
                    { "encoding": "base64", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;
        parse_account_info(&result)
    }

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash> {
        let result = self
            .query(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;
        parse_latest_blockhash(&result)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
        let result = self
            .query("getMinimumBalanceForRentExemption", json!([data_len]))
            .await?;
        result
            .as_u64()
            .ok_or_else(|| ClientError::Rpc(format!("unexpected rent response: {result}")))
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<String> {
        let encoded = general_purpose::STANDARD.encode(wire);
        let outcome = self
            .call(
                "sendTransaction",
                json!([
                    encoded,
                    {
                        "encoding": "base64",
                        "preflightCommitment": self.commitment.as_str(),
                    }
                ]),
            )
            .await?;
        send_outcome(outcome)
    }

    async fn get_signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>> {
        let result = self
            .query(
                "getSignatureStatuses",
                json!([[signature], { "searchTransactionHistory": true }]),
            )
            .await?;
        parse_signature_status(&result)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

fn split_response(method: &str, mut body: Value) -> Result<std::result::Result<Value, Value>> {
    if let Some(err) = body.get_mut("error").map(Value::take) {
        error!(method, "rpc error: {err}");
        return Ok(Err(err));
    }
    match body.get_mut("result").map(Value::take) {
        Some(result) => Ok(Ok(result)),
        None => Err(ClientError::Rpc(format!(
            "{method}: response has neither result nor error"
        ))),
    }
}

/// A JSON-RPC error on a read is a transport-level [`ClientError::Rpc`].
fn query_outcome(method: &str, outcome: std::result::Result<Value, Value>) -> Result<Value> {
    outcome.map_err(|err| ClientError::Rpc(format!("{method}: {}", rpc_error_message(&err))))
}

/// A JSON-RPC error on `sendTransaction` means the node looked at the
/// transaction and refused it.
fn send_outcome(outcome: std::result::Result<Value, Value>) -> Result<String> {
    match outcome {
        Ok(Value::String(signature)) => Ok(signature),
        Ok(other) => Err(ClientError::Rpc(format!(
            "unexpected sendTransaction response: {other}"
        ))),
        Err(err) => Err(ClientError::SubmissionFailed(rpc_error_message(&err))),
    }
}

/// `message` plus any program logs the node attached.
fn rpc_error_message(err: &Value) -> String {
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    let logs: Vec<&str> = err
        .pointer("/data/logs")
        .and_then(Value::as_array)
        .map(|logs| logs.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if logs.is_empty() {
        message
    } else {
        format!("{message}; logs: {}", logs.join(" | "))
    }
}

#[derive(Deserialize)]
struct Contextual<T> {
    value: T,
}

#[derive(Deserialize)]
struct RawAccount {
    lamports: u64,
    owner: String,
    data: (String, String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    confirmation_status: Option<Commitment>,
    err: Option<Value>,
}

fn parse_balance(result: &Value) -> Result<u64> {
    let ctx: Contextual<u64> = serde_json::from_value(result.clone())?;
    Ok(ctx.value)
}

fn parse_account_info(result: &Value) -> Result<Option<AccountInfo>> {
    let ctx: Contextual<Option<RawAccount>> = serde_json::from_value(result.clone())?;
    let Some(raw) = ctx.value else {
        return Ok(None);
    };
    if raw.data.1 != "base64" {
        return Err(ClientError::Rpc(format!(
            "unexpected account data encoding {:?}",
            raw.data.1
        )));
    }
    let data = general_purpose::STANDARD
        .decode(&raw.data.0)
        .map_err(|e| ClientError::Rpc(format!("account data is not base64: {e}")))?;
    let owner = address_to_bytes(&raw.owner)?;
    Ok(Some(AccountInfo {
        lamports: raw.lamports,
        owner,
        data,
    }))
}

fn parse_latest_blockhash(result: &Value) -> Result<LatestBlockhash> {
    let ctx: Contextual<RawBlockhash> = serde_json::from_value(result.clone())?;
    let blockhash = address_to_bytes(&ctx.value.blockhash)
        .map_err(|e| ClientError::Rpc(format!("bad blockhash: {e}")))?;
    Ok(LatestBlockhash {
        blockhash,
        last_valid_block_height: ctx.value.last_valid_block_height,
    })
}

fn parse_signature_status(result: &Value) -> Result<Option<SignatureStatus>> {
    let ctx: Contextual<Vec<Option<RawStatus>>> = serde_json::from_value(result.clone())?;
    let Some(Some(raw)) = ctx.value.into_iter().next() else {
        return Ok(None);
    };
    Ok(Some(SignatureStatus {
        confirmation: raw.confirmation_status,
        err: raw.err.filter(|e| !e.is_null()).map(|e| e.to_string()),
    }))
}
