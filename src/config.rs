use anyhow::{bail, Context, Result};
use solana_sdk::commitment_config::CommitmentConfig;
use std::str::FromStr;
use std::time::Duration;

use crate::analysis::AnalyzerConfig;
use crate::chain::FetchConfig;

/// Public mainnet endpoints used when no RPC is configured
pub const DEFAULT_RPC_ENDPOINTS: [&str; 3] = [
    "https://solana-api.projectserum.com",
    "https://api.mainnet-beta.solana.com",
    "https://solana-mainnet.rpc.extrnode.com",
];

/// Main configuration struct containing all analyzer settings
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc: RpcConfig,
    pub fetch: FetchSettings,
    pub analyzer: AnalyzerSettings,
    pub logging: LoggingConfig,
}

/// RPC endpoint configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Primary endpoint first, then backups
    pub endpoints: Vec<String>,
    pub premium: bool,
    pub commitment_level: String,
    pub timeout_seconds: u64,
}

/// Retry and batching configuration
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub batch_size: usize,
    pub premium_batch_size: usize,
    pub batch_delay_ms: u64,
}

/// Request boundary configuration
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub default_tx_limit: usize,
    pub request_timeout_ms: Option<u64>,
    pub enable_mock_fallback: bool,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub json: bool,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Build configuration from the current process environment only
    pub fn from_env() -> Result<Self> {
        // RPC configuration
        let rpc = RpcConfig {
            endpoints: load_endpoints(),
            premium: get_bool_env("RPC_PREMIUM", false),
            commitment_level: get_env_or_default("COMMITMENT_LEVEL", "confirmed"),
            timeout_seconds: get_u64_env("RPC_TIMEOUT_SECONDS", 30)?,
        };
        parse_commitment(&rpc.commitment_level)?;

        // Fetch configuration
        let fetch = FetchSettings {
            max_retries: get_u32_env("MAX_RETRIES", 3)?,
            retry_delay_ms: get_u64_env("RETRY_DELAY_MS", 1000)?,
            batch_size: get_usize_env("BATCH_SIZE", 10)?,
            premium_batch_size: get_usize_env("PREMIUM_BATCH_SIZE", 50)?,
            batch_delay_ms: get_u64_env("BATCH_DELAY_MS", 100)?,
        };
        if fetch.batch_size == 0 || fetch.premium_batch_size == 0 {
            bail!("BATCH_SIZE and PREMIUM_BATCH_SIZE must be greater than zero");
        }

        // Analyzer configuration
        let analyzer = AnalyzerSettings {
            default_tx_limit: get_usize_env("DEFAULT_TX_LIMIT", 20)?,
            request_timeout_ms: match std::env::var("REQUEST_TIMEOUT_MS") {
                Ok(value) => Some(
                    value
                        .parse()
                        .context("Failed to parse REQUEST_TIMEOUT_MS as u64")?,
                ),
                Err(_) => None,
            },
            enable_mock_fallback: get_bool_env("ENABLE_MOCK_FALLBACK", true),
        };

        // Logging configuration
        let logging = LoggingConfig {
            log_level: get_env_or_default("LOG_LEVEL", "info"),
            json: get_env_or_default("LOG_FORMAT", "pretty").eq_ignore_ascii_case("json"),
            log_dir: std::env::var("LOG_DIR").ok().filter(|dir| !dir.is_empty()),
        };

        Ok(Config {
            rpc,
            fetch,
            analyzer,
            logging,
        })
    }

    pub fn commitment(&self) -> Result<CommitmentConfig> {
        parse_commitment(&self.rpc.commitment_level)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.timeout_seconds)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_retries: self.fetch.max_retries,
            retry_delay_ms: self.fetch.retry_delay_ms,
            batch_size: self.fetch.batch_size,
            premium_batch_size: self.fetch.premium_batch_size,
            primary_is_premium: self.rpc.premium,
            batch_delay_ms: self.fetch.batch_delay_ms,
            ..FetchConfig::default()
        }
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            default_limit: self.analyzer.default_tx_limit,
            enable_fallback: self.analyzer.enable_mock_fallback,
        }
    }
}

/// Primary first, then backups; public defaults when neither is set
fn load_endpoints() -> Vec<String> {
    let mut endpoints = Vec::new();
    if let Ok(primary) = std::env::var("RPC_URL") {
        let primary = primary.trim().to_string();
        if !primary.is_empty() {
            endpoints.push(primary);
        }
    }
    for backup in parse_string_list(&get_env_or_default("BACKUP_RPC_URLS", "")) {
        if !endpoints.contains(&backup) {
            endpoints.push(backup);
        }
    }

    if endpoints.is_empty() {
        endpoints = DEFAULT_RPC_ENDPOINTS.iter().map(|s| s.to_string()).collect();
    }
    endpoints
}

/// Parse a commitment level name ("processed", "confirmed", "finalized")
pub fn parse_commitment(level: &str) -> Result<CommitmentConfig> {
    CommitmentConfig::from_str(level)
        .map_err(|_| anyhow::anyhow!("Unknown COMMITMENT_LEVEL '{}'", level))
}

// ============================================================================
// Helper Functions for Environment Variable Parsing
// ============================================================================

/// Get environment variable or return default value
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get boolean environment variable with default
fn get_bool_env(key: &str, default: bool) -> bool {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

/// Get u32 environment variable with default
fn get_u32_env(key: &str, default: u32) -> Result<u32> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .context(format!("Failed to parse {} as u32", key))
}

/// Get u64 environment variable with default
fn get_u64_env(key: &str, default: u64) -> Result<u64> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .context(format!("Failed to parse {} as u64", key))
}

/// Get usize environment variable with default
fn get_usize_env(key: &str, default: usize) -> Result<usize> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .context(format!("Failed to parse {} as usize", key))
}

/// Parse comma-separated string list
fn parse_string_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
