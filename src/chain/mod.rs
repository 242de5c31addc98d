pub mod endpoint_pool;
pub mod fetcher;
pub mod ledger;

pub use endpoint_pool::EndpointPool;
pub use fetcher::{FetchConfig, RetryingFetcher};
pub use ledger::{LedgerClient, SolanaLedgerClient};

#[cfg(test)]
pub use ledger::MockLedgerClient;
