use super::pnl::{PnlAggregator, PnlStats};
use super::report::{DataSource, WalletAnalysis};
use crate::data::TransactionRecord;

pub const MOCK_NOTE: &str = "Demo data: live ledger data is currently unavailable";
pub const DEMO_NOTE: &str = "Offline demo history";

/// Wallet the offline demo history is built around
pub const DEMO_WALLET: &str = "4EPNLZHUnEbpxZm6qTPkXpMG2EDektbjUA1yAugHJLc4";

/// Alternative data source used when the ledger cannot be read.
pub trait FallbackSource: Send + Sync {
    fn analyze(&self, address: &str) -> WalletAnalysis;
}

/// Deterministic placeholder analysis seeded from the address characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDataSource;

impl MockDataSource {
    pub fn seed(address: &str) -> u64 {
        let hash: u64 = address.encode_utf16().map(u64::from).sum();
        hash % 1000
    }

    pub fn stats(address: &str) -> PnlStats {
        let seed = Self::seed(address);
        let total_trades = 5 + seed % 95;
        let win_rate = 30 + seed % 40;

        PnlStats {
            total_pnl: (seed % 100) as f64 - 50.0,
            total_volume: 100.0 + (seed % 500) as f64,
            total_trades,
            wins: total_trades * win_rate / 100,
            losses: total_trades * (70 - seed % 40) / 100,
            win_rate: win_rate as f64,
            profit_factor: 0.5 + (seed % 20) as f64 / 10.0,
        }
    }
}

impl FallbackSource for MockDataSource {
    fn analyze(&self, address: &str) -> WalletAnalysis {
        WalletAnalysis::new(address, Self::stats(address), DataSource::Mock).with_note(MOCK_NOTE)
    }
}

/// Offline history for `wallet`: 5 -> 4.8 -> 5.2 -> 4.9 SOL, 5000-lamport fees.
pub fn demo_history(wallet: &str) -> Vec<TransactionRecord> {
    const COUNTERPARTY: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    let balances: [u64; 4] = [5_000_000_000, 4_800_000_000, 5_200_000_000, 4_900_000_000];

    balances
        .windows(2)
        .enumerate()
        .map(|(i, pair)| TransactionRecord {
            signature: format!("demo{}", i + 1),
            block_time: Some(1_700_000_000 + i as i64 * 60),
            slot: 250_000_000 + i as u64,
            err: None,
            account_keys: vec![wallet.to_string(), COUNTERPARTY.to_string()],
            pre_balances: vec![pair[0], 1_000_000_000],
            post_balances: vec![pair[1], 1_000_000_000],
            fee: 5000,
            pre_token_balances: Vec::new(),
            post_token_balances: Vec::new(),
        })
        .collect()
}

/// Analysis of `demo_history`; never touches the ledger, so it is tagged `Mock`.
pub fn demo_analysis() -> WalletAnalysis {
    let records = demo_history(DEMO_WALLET);
    let stats = PnlAggregator::default().aggregate(&records, DEMO_WALLET);

    WalletAnalysis::new(DEMO_WALLET, stats, DataSource::Mock)
        .with_transaction_count(records.len())
        .with_note(DEMO_NOTE)
}
