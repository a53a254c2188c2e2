//! Wallet Ledger Models

use serde::{Deserialize, Serialize};

/// One signed ledger entry
///
/// The balance is the sum of entries; uniqueness on `(owner_id, source_key)`
/// is the idempotency guard for awards and debits alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WalletLedgerEntry {
    pub id: i64,
    pub owner_id: i64,
    /// Unique per owner: e.g. "diamond-42" for a scratch-card claim,
    /// "checkout:<txn>" for a payment debit
    pub source_key: String,
    /// Signed amount; negative for spends
    pub amount: f64,
    /// Base amount before the tier multiplier (0 for debits)
    pub base_amount: f64,
    /// Multiplier applied at award time
    pub multiplier: f64,
    /// Loyalty tier resolved at award time
    pub tier: i64,
    pub created_at: i64,
}

/// Result of an award call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardResult {
    /// Credited amount (base × multiplier, 2dp)
    pub amount: f64,
    pub new_balance: f64,
    /// True when the `(owner, source_key)` pair had already been credited
    /// and this call was a no-op replay
    pub already_claimed: bool,
}

/// Award request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardRequest {
    pub source_key: String,
    pub base_amount: f64,
}
