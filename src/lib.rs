//! Adaptive liquidity buffer engine.
//!
//! A shared reserve absorbs user deposits and withdrawals while surplus
//! liquidity is delegated to an external yield mechanism and reclaimed on
//! demand. The engine guarantees:
//! 1. Withdrawals are priced against buffer health - draining the liquid
//!    buffer is economically discouraged, never outright blocked
//! 2. The liquidity target adapts to recent health history, clamped to an
//!    absolute floor of half the neutral base target
//! 3. Reconciliation trusts only the amounts the external mechanism reports
//!    moving, tolerating partial reclaims
//! 4. Every operation is atomic - a failed call leaves all state untouched
//!
//! All state lives in an explicitly owned engine value; operations take it
//! by `&mut` receiver, so a host runtime that linearizes calls gets the
//! serialized execution model for free.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(kani)]
extern crate kani;

extern crate alloc;

pub mod curve;
pub mod engine;
pub mod history;
pub mod math;
pub mod rebalance;
pub mod state;
pub mod target;

// Re-export commonly used types
pub use engine::{BufferEngine, Ledger, MapBufferEngine, MapLedger};
pub use history::HealthHistory;
pub use rebalance::{NoOpYield, RebalanceAction, SimYield, YieldMechanism};
pub use state::*;
