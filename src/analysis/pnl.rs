use serde::{Deserialize, Serialize};

use crate::data::TransactionRecord;

/// Smallest absolute SOL movement that counts as a trade
pub const TRADE_THRESHOLD_SOL: f64 = 0.001;

/// Trading statistics folded from a wallet's transactions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlStats {
    /// Net SOL change after fees
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    /// Sum of absolute SOL changes
    pub total_volume: f64,
    pub total_trades: u64,
    pub wins: u64,
    pub losses: u64,
    /// Percentage of trades with positive PnL, 0-100
    pub win_rate: f64,
    pub profit_factor: f64,
}

#[derive(Debug, Default)]
struct Totals {
    pnl: f64,
    volume: f64,
    trades: u64,
    wins: u64,
}

/// Folds transaction records into `PnlStats`.
///
/// Pure and total: no I/O, and every division has a defined fallback.
#[derive(Debug, Clone, Copy)]
pub struct PnlAggregator {
    trade_threshold_sol: f64,
}

impl Default for PnlAggregator {
    fn default() -> Self {
        Self {
            trade_threshold_sol: TRADE_THRESHOLD_SOL,
        }
    }
}

impl PnlAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trade_threshold(trade_threshold_sol: f64) -> Self {
        Self { trade_threshold_sol }
    }

    pub fn aggregate(&self, records: &[TransactionRecord], subject: &str) -> PnlStats {
        let mut totals = Totals::default();

        for record in records {
            if record.is_failed() {
                continue;
            }

            let sol_change = record.sol_change(subject);
            let pnl = sol_change - record.fee_sol();
            let volume = sol_change.abs();

            totals.pnl += pnl;
            totals.volume += volume;

            // Rent and fee-only movements stay out of the trade statistics
            if volume > self.trade_threshold_sol {
                totals.trades += 1;
                if pnl > 0.0 {
                    totals.wins += 1;
                }
            }
        }

        Self::finish(totals)
    }

    fn finish(totals: Totals) -> PnlStats {
        let Totals {
            pnl,
            volume,
            trades,
            wins,
        } = totals;
        let losses = trades - wins;

        let win_rate = if trades > 0 {
            wins as f64 / trades as f64 * 100.0
        } else {
            0.0
        };

        // Divides the aggregate PnL, not the sum of winning trades
        let avg_win = if wins > 0 { pnl / wins as f64 } else { 0.0 };
        let avg_loss = if losses > 0 { pnl.abs() / losses as f64 } else { 1.0 };
        let profit_factor = if avg_loss > 0.0 { avg_win / avg_loss } else { 0.0 };

        PnlStats {
            total_pnl: pnl,
            total_volume: volume,
            total_trades: trades,
            wins,
            losses,
            win_rate,
            profit_factor,
        }
    }
}

/// `PnlAggregator::default().aggregate(records, subject)`
pub fn aggregate(records: &[TransactionRecord], subject: &str) -> PnlStats {
    PnlAggregator::default().aggregate(records, subject)
}
