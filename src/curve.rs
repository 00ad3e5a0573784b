//! Withdrawal pricing curve.
//!
//! Maps (requested amount, current health) to the amount actually paid out.
//! At or above the healthy threshold withdrawals are exact; below it the
//! payout is discounted linearly in health, with a floor multiplier so a
//! withdrawal is never driven to a zero rate, only discounted.

use crate::math;
use crate::state::{BufferError, BufferParams, Result, SCALE};

/// Quote the payout for `requested` at the given health.
///
/// Invariants: `payout <= requested`, and for any health
/// `payout >= requested * min_multiplier_offset / SCALE` (truncating).
/// Liquidity coverage is checked by the caller, which sees the balance.
pub fn quote(requested: u128, health: u128, params: &BufferParams) -> Result<u128> {
    if health >= params.healthy_threshold {
        return Ok(requested);
    }
    let multiplier = params
        .min_multiplier_offset
        .checked_add(health.min(params.healthy_threshold))
        .ok_or(BufferError::Overflow)?;
    math::percent_of(requested, multiplier, SCALE)
}


// ============================================================================
// Kani Formal Verification Proofs
// ============================================================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Below the threshold the payout is bounded by the floor multiplier
    /// from below and the requested amount from above.
    #[kani::proof]
    fn proof_quote_bounds() {
        let requested: u128 = kani::any();
        let health: u128 = kani::any();
        let params = BufferParams::default();

        kani::assume(requested <= u128::MAX / SCALE);
        kani::assume(health < params.healthy_threshold);

        let payout = quote(requested, health, &params).unwrap();

        assert!(payout <= requested);
        assert!(payout >= requested * params.min_multiplier_offset / SCALE);
    }

    /// At or above the threshold the quote is the identity.
    #[kani::proof]
    fn proof_quote_exact_when_healthy() {
        let requested: u128 = kani::any();
        let health: u128 = kani::any();
        let params = BufferParams::default();

        kani::assume(health >= params.healthy_threshold);

        let payout = quote(requested, health, &params).unwrap();
        assert!(payout == requested);
    }
}
