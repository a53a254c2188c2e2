//! Data models
//!
//! Shared between store-server and the storefront frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), all timestamps Unix millis.

pub mod batch;
pub mod checkout;
pub mod coupon;
pub mod gift;
pub mod loyalty;
pub mod order;
pub mod reward_source;
pub mod shopper;
pub mod wallet;

// Re-exports
pub use batch::*;
pub use checkout::*;
pub use coupon::*;
pub use gift::*;
pub use loyalty::*;
pub use order::*;
pub use reward_source::*;
pub use shopper::*;
pub use wallet::*;
