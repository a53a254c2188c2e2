//! Batch Lifecycle Manager
//!
//! Owns the pending/validated/expired/cancelled state machine that groups
//! a shopper's orders into one consolidated shipment:
//!
//! ```text
//! pending --finalize success--> validated
//! pending --expiry sweep-----> expired
//! pending --owner cancels----> cancelled
//! ```
//!
//! All three target states are terminal. Correctness under concurrent
//! requests relies on conditional writes, never locks: every transition is
//! `UPDATE … WHERE status = 'PENDING'`, and a lost race re-reads and
//! returns the winner's result.

pub mod expiry_worker;
pub mod manager;

pub use expiry_worker::ExpirySweeper;
pub use manager::BatchManager;
