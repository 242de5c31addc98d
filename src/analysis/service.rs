use std::sync::Arc;
use tracing::{info, warn};

use super::mock::{FallbackSource, MockDataSource};
use super::pnl::PnlAggregator;
use super::report::{ApiResponse, DataSource, WalletAnalysis};
use crate::chain::RetryingFetcher;
use crate::data::LAMPORTS_PER_SOL;
use crate::error::AnalysisError;
use crate::utils::{parse_wallet_address, CancelSignal};

/// Settings for the request boundary
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Transactions to fetch when the caller gives no limit
    pub default_limit: usize,
    /// Substitute fallback data when the ledger is unreachable
    pub enable_fallback: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            enable_fallback: true,
        }
    }
}

/// Entry point for wallet analysis requests.
///
/// Validates the address, runs the fetch + aggregate pipeline and, when the
/// ledger cannot be read, swaps in the fallback source.
pub struct WalletAnalyzer {
    fetcher: RetryingFetcher,
    aggregator: PnlAggregator,
    fallback: Arc<dyn FallbackSource>,
    config: AnalyzerConfig,
}

impl WalletAnalyzer {
    pub fn new(fetcher: RetryingFetcher, config: AnalyzerConfig) -> Self {
        Self {
            fetcher,
            aggregator: PnlAggregator::default(),
            fallback: Arc::new(MockDataSource),
            config,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackSource>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_aggregator(mut self, aggregator: PnlAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn fetcher(&self) -> &RetryingFetcher {
        &self.fetcher
    }

    pub async fn analyze(
        &self,
        address: &str,
        limit: Option<usize>,
        cancel: &CancelSignal,
    ) -> Result<WalletAnalysis, AnalysisError> {
        let pubkey = parse_wallet_address(address)?;
        let limit = limit.unwrap_or(self.config.default_limit);
        info!("Analyzing wallet {} (limit {})", address, limit);

        match self.analyze_live(&pubkey, limit, cancel).await {
            Ok(analysis) => {
                info!(
                    "Analysis completed using real data: {} trades, PnL {:.6} SOL",
                    analysis.stats.total_trades, analysis.stats.total_pnl
                );
                Ok(analysis)
            }
            Err(err) if err.is_fetch_exhausted() && self.config.enable_fallback => {
                warn!("Ledger unavailable, falling back to mock data: {}", err);
                Ok(self.fallback.analyze(address))
            }
            Err(err) => Err(err),
        }
    }

    async fn analyze_live(
        &self,
        pubkey: &solana_sdk::pubkey::Pubkey,
        limit: usize,
        cancel: &CancelSignal,
    ) -> Result<WalletAnalysis, AnalysisError> {
        let balance = self.fetcher.fetch_balance(pubkey, cancel).await?;
        let balance_sol = balance as f64 / LAMPORTS_PER_SOL;
        info!("Basic balance check successful: {:.4} SOL", balance_sol);

        let records = self
            .fetcher
            .fetch_wallet_transactions(pubkey, limit, cancel)
            .await?;
        let address = pubkey.to_string();
        let stats = self.aggregator.aggregate(&records, &address);

        Ok(WalletAnalysis::new(&address, stats, DataSource::Real)
            .with_transaction_count(records.len())
            .with_current_balance(balance_sol))
    }

    /// `analyze` wrapped in the response envelope
    pub async fn respond(
        &self,
        address: &str,
        limit: Option<usize>,
        cancel: &CancelSignal,
    ) -> ApiResponse<WalletAnalysis> {
        match self.analyze(address, limit, cancel).await {
            Ok(analysis) => ApiResponse::analysis(analysis),
            Err(err @ AnalysisError::InvalidAddress(_)) => {
                ApiResponse::failure("Invalid wallet address", Some(err.to_string()))
            }
            Err(err) => ApiResponse::failure("Wallet analysis failed", Some(err.to_string())),
        }
    }
}
