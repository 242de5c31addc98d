use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use solana_client::rpc_config::{
    RpcContextConfig, RpcSignaturesForAddressConfig, RpcTransactionConfig,
};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use solana_transaction_status::{
    option_serializer::OptionSerializer, EncodedConfirmedTransactionWithStatusMeta,
    EncodedTransaction, UiMessage, UiTransactionEncoding, UiTransactionTokenBalance,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::data::{SignatureInfo, TokenBalance, TransactionRecord};
use crate::error::LedgerError;

/// Read access to a ledger node.
///
/// Every call names the endpoint explicitly so the caller decides which node
/// receives the traffic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// One page of signatures for `address`, newest first, starting after `before`.
    async fn get_signatures(
        &self,
        endpoint: &str,
        address: &Pubkey,
        before: Option<String>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError>;

    /// Resolve signatures to records in one round trip.
    ///
    /// `None` where the node has no such transaction or no status for it.
    async fn get_transactions(
        &self,
        endpoint: &str,
        signatures: &[String],
    ) -> Result<Vec<Option<TransactionRecord>>, LedgerError>;

    /// Current lamport balance of `address`.
    async fn get_balance(&self, endpoint: &str, address: &Pubkey) -> Result<u64, LedgerError>;
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl RpcReply {
    fn into_result<T: DeserializeOwned>(self) -> Result<T, LedgerError> {
        if let Some(error) = self.error {
            return Err(LedgerError::from_rpc_error(error.code, &error.message));
        }
        Ok(serde_json::from_value(self.result.unwrap_or(Value::Null))?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignatureStatus {
    signature: String,
    slot: u64,
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    block_time: Option<i64>,
}

/// `{ "context": ..., "value": T }` wrapper; only the value is kept
#[derive(Debug, Deserialize)]
struct ContextValue<T> {
    value: T,
}

fn rpc_request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

/// `LedgerClient` speaking Solana JSON-RPC over HTTP.
///
/// Talks to the node directly rather than through `RpcClient`, whose HTTP
/// sender retries 429 responses internally with sleeps that cannot be
/// cancelled; here a 429 reaches the retry layer on the first response and
/// the pool rotates immediately.
pub struct SolanaLedgerClient {
    http: reqwest::Client,
    commitment: CommitmentConfig,
}

impl SolanaLedgerClient {
    pub fn new(commitment: CommitmentConfig, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, commitment })
    }

    fn transaction_config(&self) -> RpcTransactionConfig {
        RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        }
    }

    /// POST one JSON-RPC body (single request or batch) and return the raw reply
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, LedgerError> {
        // A 429 status converts to RateLimited, any other error status to Transport
        let response = self
            .http
            .post(endpoint)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let reply = self.post(endpoint, &rpc_request(1, method, params)).await?;
        let reply: RpcReply = serde_json::from_value(reply)?;
        reply.into_result()
    }
}

#[async_trait]
impl LedgerClient for SolanaLedgerClient {
    async fn get_signatures(
        &self,
        endpoint: &str,
        address: &Pubkey,
        before: Option<String>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let config = RpcSignaturesForAddressConfig {
            before,
            limit: Some(limit),
            commitment: Some(self.commitment),
            ..Default::default()
        };

        let statuses: Vec<RpcSignatureStatus> = self
            .call(
                endpoint,
                "getSignaturesForAddress",
                json!([address.to_string(), config]),
            )
            .await?;

        Ok(statuses
            .into_iter()
            .map(|status| SignatureInfo {
                signature: status.signature,
                slot: status.slot,
                block_time: status.block_time,
                err: status.err.filter(|e| !e.is_null()).map(|e| e.to_string()),
                memo: status.memo,
            })
            .collect())
    }

    async fn get_transactions(
        &self,
        endpoint: &str,
        signatures: &[String],
    ) -> Result<Vec<Option<TransactionRecord>>, LedgerError> {
        if signatures.is_empty() {
            return Ok(Vec::new());
        }

        let body = transaction_batch_request(signatures, &self.transaction_config());
        let reply = self.post(endpoint, &body).await?;
        parse_transaction_batch(signatures, reply)
    }

    async fn get_balance(&self, endpoint: &str, address: &Pubkey) -> Result<u64, LedgerError> {
        let config = RpcContextConfig {
            commitment: Some(self.commitment),
            min_context_slot: None,
        };
        let balance: ContextValue<u64> = self
            .call(endpoint, "getBalance", json!([address.to_string(), config]))
            .await?;
        Ok(balance.value)
    }
}

/// One JSON-RPC batch body with a `getTransaction` per signature; ids are positions.
pub fn transaction_batch_request(signatures: &[String], config: &RpcTransactionConfig) -> Value {
    Value::Array(
        signatures
            .iter()
            .enumerate()
            .map(|(i, signature)| {
                rpc_request(i as u64, "getTransaction", json!([signature, config]))
            })
            .collect(),
    )
}

/// Match a batch reply back to `signatures` by id.
///
/// Any per-item RPC error fails the whole batch so it is retried as a unit.
pub fn parse_transaction_batch(
    signatures: &[String],
    reply: Value,
) -> Result<Vec<Option<TransactionRecord>>, LedgerError> {
    let replies = match reply {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value::<RpcReply>)
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            // Nodes that refuse batching answer with a single error object
            let single: RpcReply = serde_json::from_value(other)?;
            return Err(match single.error {
                Some(error) => LedgerError::from_rpc_error(error.code, &error.message),
                None => LedgerError::Malformed("expected an array reply to a batch request".into()),
            });
        }
    };

    let mut by_id: HashMap<u64, RpcReply> = replies
        .into_iter()
        .filter_map(|reply| reply.id.map(|id| (id, reply)))
        .collect();

    signatures
        .iter()
        .enumerate()
        .map(|(i, signature)| {
            let reply = by_id.remove(&(i as u64)).ok_or_else(|| {
                LedgerError::Transport(format!("no reply for transaction {}", signature))
            })?;
            match reply.into_result::<Option<EncodedConfirmedTransactionWithStatusMeta>>()? {
                Some(tx) => to_transaction_record(signature, tx),
                None => Ok(None),
            }
        })
        .collect()
}

fn into_option<T>(value: OptionSerializer<T>) -> Option<T> {
    match value {
        OptionSerializer::Some(v) => Some(v),
        _ => None,
    }
}

fn to_token_balances(balances: OptionSerializer<Vec<UiTransactionTokenBalance>>) -> Vec<TokenBalance> {
    into_option(balances)
        .unwrap_or_default()
        .into_iter()
        .map(|b| TokenBalance {
            account_index: b.account_index,
            mint: b.mint,
            owner: into_option(b.owner),
            amount: b.ui_token_amount.amount,
            decimals: b.ui_token_amount.decimals,
            ui_amount: b.ui_token_amount.ui_amount,
        })
        .collect()
}

/// Flatten a JSON-encoded RPC transaction into a `TransactionRecord`.
///
/// Returns `None` when the node has no status meta for the transaction; it
/// then has no balances to contribute. Addresses loaded through lookup tables
/// are appended after the static keys (writable, then readonly), matching the
/// layout of the balance arrays.
pub fn to_transaction_record(
    signature: &str,
    tx: EncodedConfirmedTransactionWithStatusMeta,
) -> Result<Option<TransactionRecord>, LedgerError> {
    let EncodedConfirmedTransactionWithStatusMeta {
        slot,
        transaction,
        block_time,
    } = tx;

    let Some(meta) = transaction.meta else {
        debug!("Transaction {} has no status meta, skipping", signature);
        return Ok(None);
    };

    let mut account_keys = match transaction.transaction {
        EncodedTransaction::Json(ui_tx) => match ui_tx.message {
            UiMessage::Raw(raw) => raw.account_keys,
            UiMessage::Parsed(parsed) => parsed
                .account_keys
                .into_iter()
                .map(|account| account.pubkey)
                .collect(),
        },
        _ => {
            return Err(LedgerError::Malformed(format!(
                "transaction {} is not JSON encoded",
                signature
            )))
        }
    };

    if let Some(loaded) = into_option(meta.loaded_addresses) {
        account_keys.extend(loaded.writable);
        account_keys.extend(loaded.readonly);
    }

    Ok(Some(TransactionRecord {
        signature: signature.to_string(),
        block_time,
        slot,
        err: meta.err.map(|e| format!("{:?}", e)),
        account_keys,
        pre_balances: meta.pre_balances,
        post_balances: meta.post_balances,
        fee: meta.fee,
        pre_token_balances: to_token_balances(meta.pre_token_balances),
        post_token_balances: to_token_balances(meta.post_token_balances),
    }))
}
