use crate::analysis::{DataSource, WalletAnalysis};

/// Format an analysis into a readable Markdown report
pub fn format_report(analysis: &WalletAnalysis) -> String {
    let stats = &analysis.stats;
    let mut report = String::new();

    report.push_str("# Wallet Performance Report\n\n");
    report.push_str(&format!("**Wallet**: `{}`\n\n", analysis.wallet));

    if analysis.data_source == DataSource::Mock {
        report.push_str("> ⚠️  **Demo data**: figures below are not from the live ledger.\n");
        if let Some(ref note) = analysis.note {
            report.push_str(&format!("> {}\n", note));
        }
        report.push('\n');
    }

    report.push_str("## Executive Summary\n\n");
    report.push_str(&format!("- **Total PnL**: {:+.6} SOL\n", stats.total_pnl));
    report.push_str(&format!("- **Total Volume**: {:.6} SOL\n", stats.total_volume));
    report.push_str(&format!("- **ROI**: {:.2}%\n", analysis.roi));
    if let Some(balance) = analysis.current_balance {
        report.push_str(&format!("- **Current Balance**: {:.4} SOL\n", balance));
    }
    if let Some(count) = analysis.transaction_count {
        report.push_str(&format!("- **Transactions Analyzed**: {}\n", count));
    }
    report.push('\n');

    report.push_str("## Trade Statistics\n\n");
    report.push_str(&format!("- **Trades**: {}\n", stats.total_trades));
    report.push_str(&format!("- **Wins**: {}\n", stats.wins));
    report.push_str(&format!("- **Losses**: {}\n", stats.losses));
    report.push_str(&format!("- **Win Rate**: {:.2}%\n", stats.win_rate));
    report.push_str(&format!("- **Profit Factor**: {:.2}\n", stats.profit_factor));
    report.push_str(&format!("- **Sharpe (proxy)**: {:.1}\n\n", analysis.sharpe_ratio));

    if stats.total_trades > 0 {
        report.push_str("### Assessment\n\n");
        if stats.total_pnl > 0.0 && stats.win_rate > 50.0 {
            report.push_str("✅ **Net profitable** with a majority of winning trades\n\n");
        } else if stats.total_pnl > 0.0 {
            report.push_str("⚠️  **Net profitable** but most trades lost\n\n");
        } else {
            report.push_str("⚠️  **Net loss** over the analyzed transactions\n\n");
        }
    }

    report.push_str("---\n\n");
    report.push_str(&format!(
        "*Data source: {} | generated at: {}*\n",
        analysis.data_source.as_str(),
        analysis.last_updated
    ));

    report
}
