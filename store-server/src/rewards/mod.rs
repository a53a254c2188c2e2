//! Reward Ledger (Wallet)
//!
//! - **tiers**: pure loyalty tier resolution over the configured ladder
//! - **ledger**: idempotent award/balance/spend over the wallet ledger

pub mod ledger;
pub mod tiers;

pub use ledger::WalletService;
