pub mod mock;
pub mod pnl;
pub mod report;
pub mod service;

pub use mock::{demo_analysis, demo_history, FallbackSource, MockDataSource, DEMO_WALLET};
pub use pnl::{aggregate, PnlAggregator, PnlStats, TRADE_THRESHOLD_SOL};
pub use report::{ApiResponse, DataSource, ResponseMeta, WalletAnalysis};
pub use service::{AnalyzerConfig, WalletAnalyzer};
