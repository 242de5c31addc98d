// Solana Wallet PnL Analyzer Library
//
// This library provides components for analyzing a wallet's trading
// performance from its on-chain history, including:
// - Endpoint pool with round-robin failover across RPC nodes
// - Retrying, paginated and batched transaction history fetching
// - PnL, volume, win rate and profit factor aggregation
// - Mock data fallback when the ledger is unreachable
// - Markdown reporting

pub mod analysis;
pub mod chain;
pub mod config;
pub mod data;
pub mod error;
pub mod reporting;
pub mod utils;

pub use analysis::{ApiResponse, DataSource, PnlStats, WalletAnalysis, WalletAnalyzer};
pub use error::{AnalysisError, LedgerError, PoolError};
