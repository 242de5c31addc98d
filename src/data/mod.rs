pub mod transaction_record;

pub use transaction_record::{
    SignatureInfo, TokenBalance, TransactionRecord, LAMPORTS_PER_SOL,
};
