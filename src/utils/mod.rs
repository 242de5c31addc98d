pub mod address;
pub mod cancel;
pub mod retry;

pub use address::{parse_wallet_address, validate_wallet_address};
pub use cancel::CancelSignal;
pub use retry::{is_rate_limited, LinearBackoff, RateLimitPredicate, RetryPolicy};
