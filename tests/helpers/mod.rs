// Helper utilities for analysis pipeline integration tests
//
// This module provides:
// - An in-memory ledger with scripted per-endpoint failures
// - Call recording so tests can see which endpoint served each request
// - Transaction record builders

#![allow(dead_code)]

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wallet_pnl::analysis::{AnalyzerConfig, WalletAnalyzer};
use wallet_pnl::chain::{EndpointPool, FetchConfig, LedgerClient, RetryingFetcher};
use wallet_pnl::data::{SignatureInfo, TransactionRecord};
use wallet_pnl::LedgerError;

pub const WALLET: &str = "4EPNLZHUnEbpxZm6qTPkXpMG2EDektbjUA1yAugHJLc4";
pub const COUNTERPARTY: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const PRIMARY: &str = "https://primary.example";
pub const BACKUP: &str = "https://backup.example";

pub const BALANCE_LAMPORTS: u64 = 2_500_000_000;

/// Record where the wallet moves from `pre` to `post` lamports
pub fn record(signature: &str, pre: u64, post: u64, fee: u64) -> TransactionRecord {
    TransactionRecord {
        signature: signature.to_string(),
        block_time: Some(1_700_000_000),
        slot: 250_000_000,
        err: None,
        account_keys: vec![WALLET.to_string(), COUNTERPARTY.to_string()],
        pre_balances: vec![pre, 1_000_000_000],
        post_balances: vec![post, 1_000_000_000],
        fee,
        pre_token_balances: Vec::new(),
        post_token_balances: Vec::new(),
    }
}

/// The 5 -> 4.8 -> 5.2 -> 4.9 SOL history, newest first
pub fn three_trade_history() -> Vec<TransactionRecord> {
    vec![
        record("sig3", 5_200_000_000, 4_900_000_000, 5000),
        record("sig2", 4_800_000_000, 5_200_000_000, 5000),
        record("sig1", 5_000_000_000, 4_800_000_000, 5000),
    ]
}

struct Failure {
    error: LedgerError,
    /// `None` fails forever
    remaining: Option<usize>,
}

/// In-memory ledger serving a fixed history, newest first.
#[derive(Default)]
pub struct FakeLedger {
    history: Vec<TransactionRecord>,
    failures: Mutex<HashMap<String, Failure>>,
    calls: Mutex<Vec<(&'static str, String)>>,
    latency: Duration,
}

impl FakeLedger {
    pub fn new(history: Vec<TransactionRecord>) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    /// Fail every call to `endpoint` with `error`
    pub fn fail_always(self, endpoint: &str, error: LedgerError) -> Self {
        self.script(endpoint, error, None)
    }

    /// Fail the next `times` calls to `endpoint` with `error`
    pub fn fail_times(self, endpoint: &str, error: LedgerError, times: usize) -> Self {
        self.script(endpoint, error, Some(times))
    }

    fn script(self, endpoint: &str, error: LedgerError, remaining: Option<usize>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Failure { error, remaining });
        self
    }

    /// Every call takes `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|(_, e)| e == endpoint).count()
    }

    pub fn calls_of(&self, operation: &str) -> usize {
        self.calls().iter().filter(|(op, _)| *op == operation).count()
    }

    async fn enter(&self, operation: &'static str, endpoint: &str) -> Result<(), LedgerError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.calls
            .lock()
            .unwrap()
            .push((operation, endpoint.to_string()));

        let mut failures = self.failures.lock().unwrap();
        if let Some(failure) = failures.get_mut(endpoint) {
            match failure.remaining {
                None => return Err(failure.error.clone()),
                Some(0) => {}
                Some(ref mut n) => {
                    *n -= 1;
                    return Err(failure.error.clone());
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn get_signatures(
        &self,
        endpoint: &str,
        _address: &Pubkey,
        before: Option<String>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        self.enter("get_signatures", endpoint).await?;

        let start = match before {
            Some(cursor) => self
                .history
                .iter()
                .position(|r| r.signature == cursor)
                .map_or(self.history.len(), |i| i + 1),
            None => 0,
        };

        Ok(self
            .history
            .iter()
            .skip(start)
            .take(limit)
            .map(|r| SignatureInfo {
                signature: r.signature.clone(),
                slot: r.slot,
                block_time: r.block_time,
                err: r.err.clone(),
                memo: None,
            })
            .collect())
    }

    async fn get_transactions(
        &self,
        endpoint: &str,
        signatures: &[String],
    ) -> Result<Vec<Option<TransactionRecord>>, LedgerError> {
        self.enter("get_transactions", endpoint).await?;

        Ok(signatures
            .iter()
            .map(|sig| self.history.iter().find(|r| &r.signature == sig).cloned())
            .collect())
    }

    async fn get_balance(&self, endpoint: &str, _address: &Pubkey) -> Result<u64, LedgerError> {
        self.enter("get_balance", endpoint).await?;
        Ok(BALANCE_LAMPORTS)
    }
}

/// Analyzer over `ledger` with the given endpoints and fetch settings
pub fn analyzer_with(
    ledger: Arc<FakeLedger>,
    endpoints: &[&str],
    fetch: FetchConfig,
    config: AnalyzerConfig,
) -> WalletAnalyzer {
    let pool = EndpointPool::new(endpoints.iter().map(|e| e.to_string()).collect())
        .expect("at least one endpoint");
    let fetcher = RetryingFetcher::new(ledger, Arc::new(pool), fetch);
    WalletAnalyzer::new(fetcher, config)
}

pub fn analyzer(ledger: Arc<FakeLedger>) -> WalletAnalyzer {
    analyzer_with(
        ledger,
        &[PRIMARY, BACKUP],
        FetchConfig::default(),
        AnalyzerConfig::default(),
    )
}
