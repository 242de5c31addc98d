use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: f64 = 1e9;

/// Entry returned by the signature listing, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    /// Unix seconds, when the node knows it
    pub block_time: Option<i64>,
    /// Set when the transaction failed on-chain
    pub err: Option<String>,
    pub memo: Option<String>,
}

/// Token balance snapshot for one account of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub account_index: u8,
    pub mint: String,
    pub owner: Option<String>,
    /// Raw amount in the token's base units
    pub amount: String,
    pub decimals: u8,
    pub ui_amount: Option<f64>,
}

/// A resolved transaction reduced to the fields the analysis needs.
///
/// `pre_balances` and `post_balances` run parallel to `account_keys`; the
/// fee payer sits at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub signature: String,
    pub block_time: Option<i64>,
    pub slot: u64,

    /// Non-empty when the transaction failed on-chain
    pub err: Option<String>,

    pub account_keys: Vec<String>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,

    /// Lamports charged to the fee payer
    pub fee: u64,

    #[serde(default)]
    pub pre_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub post_token_balances: Vec<TokenBalance>,
}

impl TransactionRecord {
    pub fn is_failed(&self) -> bool {
        self.err.is_some()
    }

    /// Position of `address` among the account keys
    pub fn account_index(&self, address: &str) -> Option<usize> {
        self.account_keys.iter().position(|key| key == address)
    }

    /// Signed lamport change of `address`, or `None` when it is not a party.
    ///
    /// Missing balance entries read as zero.
    pub fn lamport_change(&self, address: &str) -> Option<i128> {
        let idx = self.account_index(address)?;
        let pre = self.pre_balances.get(idx).copied().unwrap_or(0);
        let post = self.post_balances.get(idx).copied().unwrap_or(0);
        Some(post as i128 - pre as i128)
    }

    /// SOL change of `address`; zero when it is not a party to the transaction
    pub fn sol_change(&self, address: &str) -> f64 {
        self.lamport_change(address)
            .map(|lamports| lamports as f64 / LAMPORTS_PER_SOL)
            .unwrap_or(0.0)
    }

    pub fn fee_sol(&self) -> f64 {
        self.fee as f64 / LAMPORTS_PER_SOL
    }

    /// Per-mint UI amount change for token accounts owned by `owner`.
    ///
    /// Mints whose balance did not move are left out.
    pub fn token_balance_changes(&self, owner: &str) -> BTreeMap<String, f64> {
        let mints: BTreeSet<&str> = self
            .pre_token_balances
            .iter()
            .chain(self.post_token_balances.iter())
            .map(|b| b.mint.as_str())
            .collect();

        let owned_amount = |balances: &[TokenBalance], mint: &str| {
            balances
                .iter()
                .find(|b| b.mint == mint && b.owner.as_deref() == Some(owner))
                .and_then(|b| b.ui_amount)
                .unwrap_or(0.0)
        };

        let mut changes = BTreeMap::new();
        for mint in mints {
            let change = owned_amount(&self.post_token_balances, mint)
                - owned_amount(&self.pre_token_balances, mint);
            if change != 0.0 {
                changes.insert(mint.to_string(), change);
            }
        }
        changes
    }
}
