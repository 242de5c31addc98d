use backoff::backoff::Backoff;
use solana_sdk::pubkey::Pubkey;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::chain::{EndpointPool, LedgerClient};
use crate::data::{SignatureInfo, TransactionRecord};
use crate::error::{AnalysisError, LedgerError};
use crate::utils::{is_rate_limited, CancelSignal, RateLimitPredicate, RetryPolicy};

/// Largest page `getSignaturesForAddress` will return
pub const MAX_SIGNATURE_PAGE: usize = 1000;

/// Configuration for history fetching behavior
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Batch size for free public endpoints
    pub batch_size: usize,
    /// Batch size used while the premium primary endpoint is current
    pub premium_batch_size: usize,
    pub primary_is_premium: bool,
    /// Pause between transaction batches, on top of any retry backoff
    pub batch_delay_ms: u64,
    pub page_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            batch_size: 10,
            premium_batch_size: 50,
            primary_is_premium: false,
            batch_delay_ms: 100,
            page_size: MAX_SIGNATURE_PAGE,
        }
    }
}

/// Runs ledger reads against the pool's current endpoint with bounded
/// retries, linear backoff and endpoint rotation on rate limiting.
pub struct RetryingFetcher {
    client: Arc<dyn LedgerClient>,
    pool: Arc<EndpointPool>,
    config: FetchConfig,
    rate_limit_predicate: RateLimitPredicate,
}

impl RetryingFetcher {
    pub fn new(client: Arc<dyn LedgerClient>, pool: Arc<EndpointPool>, config: FetchConfig) -> Self {
        info!(
            "RetryingFetcher initialized - {} endpoint(s), max retries: {}, batch size: {}",
            pool.len(),
            config.max_retries,
            config.batch_size
        );

        Self {
            client,
            pool,
            config,
            rate_limit_predicate: is_rate_limited,
        }
    }

    /// Replace the rule that decides when a failure should rotate endpoints
    pub fn with_rate_limit_predicate(mut self, predicate: RateLimitPredicate) -> Self {
        self.rate_limit_predicate = predicate;
        self
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.max_retries,
            Duration::from_millis(self.config.retry_delay_ms),
        )
    }

    /// Batch size for the endpoint that is current right now
    pub fn batch_size(&self) -> usize {
        let size = if self.config.primary_is_premium && self.pool.index() == 0 {
            self.config.premium_batch_size
        } else {
            self.config.batch_size
        };
        size.max(1)
    }

    /// Run `operation` against the current endpoint until it succeeds, the
    /// policy's attempts run out, a fatal error occurs or `cancel` fires.
    ///
    /// The operation receives the endpoint URL for each attempt. Failures the
    /// rate-limit predicate accepts rotate the pool before the next attempt.
    /// After attempt `n` fails the loop sleeps `base_delay * n`.
    pub async fn with_retry<T, F, Fut>(
        &self,
        operation_name: &str,
        policy: &RetryPolicy,
        cancel: &CancelSignal,
        mut operation: F,
    ) -> Result<T, AnalysisError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut backoff = policy.to_linear_backoff();

        loop {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled(operation_name.to_string()));
            }

            let endpoint = self.pool.current().to_string();
            let outcome = match cancel.run(operation(endpoint.clone())).await {
                Some(outcome) => outcome,
                None => {
                    warn!("{} abandoned in flight on {}", operation_name, endpoint);
                    return Err(AnalysisError::Cancelled(operation_name.to_string()));
                }
            };
            let err = match outcome {
                Ok(result) => {
                    if backoff.attempts() > 0 {
                        info!("{} succeeded on attempt {}", operation_name, backoff.attempts() + 1);
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            let next_delay = backoff.next_backoff();
            let attempt = backoff.attempts();
            warn!(
                "{} failed on attempt {}/{} ({}): {}",
                operation_name, attempt, policy.max_attempts, endpoint, err
            );

            if (self.rate_limit_predicate)(&err) {
                self.pool.rotate();
            }

            // A failure that lands after the deadline is still a cancellation
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled(operation_name.to_string()));
            }

            let delay = match next_delay {
                Some(delay) if err.is_transient() => delay,
                _ => {
                    error!("{} failed after {} attempts: {}", operation_name, attempt, err);
                    return Err(AnalysisError::FetchExhausted {
                        operation: operation_name.to_string(),
                        attempts: attempt,
                        source: err,
                    });
                }
            };

            debug!("Retrying {} in {}ms", operation_name, delay.as_millis());
            if !cancel.sleep(delay).await {
                return Err(AnalysisError::Cancelled(operation_name.to_string()));
            }
        }
    }

    /// Up to `limit` signatures for `address`, newest first.
    ///
    /// Pages through the node with the `before` cursor; each page is retried
    /// on its own.
    pub async fn list_signatures(
        &self,
        address: &Pubkey,
        limit: usize,
        cancel: &CancelSignal,
    ) -> Result<Vec<SignatureInfo>, AnalysisError> {
        let policy = self.retry_policy();
        let page_size = self.config.page_size.clamp(1, MAX_SIGNATURE_PAGE);
        let operation_name = format!("get_signatures_for_address({})", address);

        let mut signatures: Vec<SignatureInfo> = Vec::new();
        let mut before: Option<String> = None;

        while signatures.len() < limit {
            let page_limit = (limit - signatures.len()).min(page_size);
            let page = self
                .with_retry(&operation_name, &policy, cancel, |endpoint| {
                    let client = Arc::clone(&self.client);
                    let before = before.clone();
                    let address = *address;
                    async move {
                        client
                            .get_signatures(&endpoint, &address, before, page_limit)
                            .await
                    }
                })
                .await?;

            let page_len = page.len();
            before = page.last().map(|info| info.signature.clone());
            signatures.extend(page);

            debug!("Fetched signature page of {} (total {})", page_len, signatures.len());
            if page_len < page_limit {
                break;
            }
        }

        signatures.truncate(limit);
        Ok(signatures)
    }

    /// Resolve signatures to transaction records in sequential batches.
    ///
    /// Signatures the node does not know are dropped without error.
    pub async fn resolve_transactions(
        &self,
        signatures: &[String],
        cancel: &CancelSignal,
    ) -> Result<Vec<TransactionRecord>, AnalysisError> {
        let policy = self.retry_policy();
        let batch_size = self.batch_size();
        let total_batches = signatures.len().div_ceil(batch_size);
        let batch_delay = Duration::from_millis(self.config.batch_delay_ms);

        let mut records = Vec::with_capacity(signatures.len());

        for (i, batch) in signatures.chunks(batch_size).enumerate() {
            let operation_name = format!("get_transactions(batch {}/{})", i + 1, total_batches);
            let resolved = self
                .with_retry(&operation_name, &policy, cancel, |endpoint| {
                    let client = Arc::clone(&self.client);
                    async move { client.get_transactions(&endpoint, batch).await }
                })
                .await?;

            let found = resolved.iter().filter(|tx| tx.is_some()).count();
            if found < batch.len() {
                debug!("{} of {} transactions not found, skipping", batch.len() - found, batch.len());
            }
            records.extend(resolved.into_iter().flatten());

            if i + 1 < total_batches && !cancel.sleep(batch_delay).await {
                return Err(AnalysisError::Cancelled(operation_name));
            }
        }

        Ok(records)
    }

    /// Current lamport balance; doubles as a liveness check for the pool
    pub async fn fetch_balance(
        &self,
        address: &Pubkey,
        cancel: &CancelSignal,
    ) -> Result<u64, AnalysisError> {
        let policy = self.retry_policy();
        self.with_retry(&format!("get_balance({})", address), &policy, cancel, |endpoint| {
            let client = Arc::clone(&self.client);
            let address = *address;
            async move { client.get_balance(&endpoint, &address).await }
        })
        .await
    }

    /// List then resolve up to `limit` of the wallet's most recent transactions
    pub async fn fetch_wallet_transactions(
        &self,
        address: &Pubkey,
        limit: usize,
        cancel: &CancelSignal,
    ) -> Result<Vec<TransactionRecord>, AnalysisError> {
        let signatures = self.list_signatures(address, limit, cancel).await?;
        if signatures.is_empty() {
            info!("No transactions found for {}", address);
            return Ok(Vec::new());
        }

        let signatures: Vec<String> = signatures.into_iter().map(|info| info.signature).collect();
        let records = self.resolve_transactions(&signatures, cancel).await?;
        info!(
            "Resolved {}/{} transactions for {}",
            records.len(),
            signatures.len(),
            address
        );
        Ok(records)
    }
}
