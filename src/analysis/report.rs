use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::pnl::PnlStats;

/// Where the numbers in an analysis came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Computed from transactions fetched from the ledger
    Real,
    /// Placeholder produced because the ledger could not be read
    Mock,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Real => "real",
            DataSource::Mock => "mock",
        }
    }

    /// Status label used in response metadata
    pub fn status(&self) -> &'static str {
        match self {
            DataSource::Real => "live_data",
            DataSource::Mock => "demo_mode",
        }
    }
}

/// Final analysis handed to callers: stats plus derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAnalysis {
    #[serde(flatten)]
    pub stats: PnlStats,
    /// PnL as a percentage of volume
    pub roi: f64,
    /// Coarse win-rate based proxy, not a real Sharpe ratio
    pub sharpe_ratio: f64,
    pub last_updated: String,
    pub wallet: String,
    pub data_source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_count: Option<usize>,
    /// SOL balance observed while fetching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl WalletAnalysis {
    pub fn new(wallet: &str, stats: PnlStats, data_source: DataSource) -> Self {
        Self {
            roi: roi(&stats),
            sharpe_ratio: sharpe_proxy(&stats),
            stats,
            last_updated: timestamp(),
            wallet: wallet.to_string(),
            data_source,
            transaction_count: None,
            current_balance: None,
            note: None,
        }
    }

    pub fn with_transaction_count(mut self, count: usize) -> Self {
        self.transaction_count = Some(count);
        self
    }

    pub fn with_current_balance(mut self, balance_sol: f64) -> Self {
        self.current_balance = Some(balance_sol);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

pub fn roi(stats: &PnlStats) -> f64 {
    if stats.total_volume > 0.0 {
        stats.total_pnl / stats.total_volume * 100.0
    } else {
        0.0
    }
}

pub fn sharpe_proxy(stats: &PnlStats) -> f64 {
    if stats.win_rate > 50.0 {
        1.2
    } else {
        0.8
    }
}

pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub wallet: String,
    pub data_source: DataSource,
    pub timestamp: String,
    pub status: String,
}

/// Envelope returned to the web/CLI caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiResponse<WalletAnalysis> {
    pub fn analysis(analysis: WalletAnalysis) -> Self {
        let meta = ResponseMeta {
            wallet: analysis.wallet.clone(),
            data_source: analysis.data_source,
            timestamp: timestamp(),
            status: analysis.data_source.status().to_string(),
        };
        Self {
            success: true,
            data: Some(analysis),
            meta: Some(meta),
            error: None,
            details: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn failure(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            meta: None,
            error: Some(error.into()),
            details,
        }
    }
}
