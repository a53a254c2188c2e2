//! Checkout Aggregator
//!
//! Composes coupon, wallet and gift effects into the final payable total
//! at the moment of payment, in a fixed order: coupon strictly before
//! wallet. All side effects (wallet debit, coupon consume, order record,
//! point accrual) are deferred until the Payment Collaborator reports
//! success and then commit in one transaction.

pub mod calculator;
pub mod service;

pub use calculator::{QuoteContext, compute_breakdown};
pub use service::CheckoutService;
