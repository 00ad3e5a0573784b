//! Fixed-point ratio arithmetic.
//!
//! All percentages are scaled integers and every division truncates toward
//! zero. Truncation under-estimates payouts and target increases, which is
//! the conservative direction for a liquidity reserve.

use crate::state::{BufferError, Result};

/// `amount * pct / scale`, truncating.
#[inline]
pub fn percent_of(amount: u128, pct: u128, scale: u128) -> Result<u128> {
    if scale == 0 {
        return Err(BufferError::DivisionByZero);
    }
    let scaled = amount.checked_mul(pct).ok_or(BufferError::Overflow)?;
    Ok(scaled / scale)
}

/// `numerator * scale / denominator`, truncating.
///
/// Fails with `DivisionByZero` when `denominator` is 0. Callers must
/// special-case a zero denominator where policy defines one (the zero-target
/// health rule) rather than rely on this error for normal flow.
#[inline]
pub fn ratio_scaled(numerator: u128, denominator: u128, scale: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(BufferError::DivisionByZero);
    }
    let scaled = numerator.checked_mul(scale).ok_or(BufferError::Overflow)?;
    Ok(scaled / denominator)
}


// ============================================================================
// Kani Formal Verification Proofs
// ============================================================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// percent_of never exceeds the input for pct <= scale
    #[kani::proof]
    fn proof_percent_of_bounded() {
        let amount: u128 = kani::any();
        let pct: u128 = kani::any();
        let scale: u128 = kani::any();

        kani::assume(scale > 0 && scale <= 10_000);
        kani::assume(pct <= scale);
        kani::assume(amount <= u128::MAX / 10_000);

        let result = percent_of(amount, pct, scale).unwrap();
        assert!(result <= amount);
    }

    /// ratio_scaled is exact for evenly divisible inputs
    #[kani::proof]
    fn proof_ratio_scaled_exact() {
        let ratio: u128 = kani::any();
        let denominator: u128 = kani::any();
        let scale: u128 = kani::any();

        kani::assume(scale > 0 && scale <= 10_000);
        kani::assume(denominator > 0 && denominator <= 1_000_000);
        kani::assume(ratio <= 1_000_000);

        let numerator = ratio * denominator;
        let result = ratio_scaled(numerator, denominator, scale).unwrap();
        assert!(result == ratio * scale);
    }
}
