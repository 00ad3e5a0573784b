//! Adaptive target controller.
//!
//! Recomputes the desired liquid balance from total managed funds and the
//! aggregated health history. A health deficit raises the target to pre-fund
//! future demand; a surplus shrinks it to free funds for external
//! allocation. The result is always clamped to half the neutral base target.

use crate::math;
use crate::state::{BufferError, BufferParams, Result, SCALE};

/// Neutral target: `total_managed * base_target_pct / SCALE`.
pub fn base_target(total_managed: u128, params: &BufferParams) -> Result<u128> {
    math::percent_of(total_managed, params.base_target_pct, SCALE)
}

/// Recompute the target for one update cycle.
///
/// The adjustment is linear in the deviation from the healthy threshold:
/// a deficit of `d` points adds `base * d / SCALE`, a surplus of `s` points
/// removes `base * s / SCALE` (capped at removing the whole base). The clamp
/// to `base / 2` is an absolute invariant and applies regardless of how
/// healthy the history looks.
pub fn recompute(
    total_managed: u128,
    aggregated_health: u128,
    params: &BufferParams,
) -> Result<u128> {
    let base = base_target(total_managed, params)?;
    let threshold = params.healthy_threshold;

    let adjusted = if aggregated_health < threshold {
        let deficit = threshold - aggregated_health;
        let raise = math::percent_of(base, deficit, SCALE)?;
        base.checked_add(raise).ok_or(BufferError::Overflow)?
    } else if aggregated_health > threshold {
        // Health is uncapped, so bound the cut at 100% of base.
        let surplus = (aggregated_health - threshold).min(SCALE);
        let cut = math::percent_of(base, surplus, SCALE)?;
        base.saturating_sub(cut)
    } else {
        base
    };

    Ok(adjusted.max(base / 2))
}


// ============================================================================
// Kani Formal Verification Proofs
// ============================================================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// The floor `base / 2` holds for any aggregated health.
    #[kani::proof]
    fn proof_recompute_floor() {
        let total_managed: u128 = kani::any();
        let aggregated_health: u128 = kani::any();
        let params = BufferParams::default();

        kani::assume(total_managed <= 1_000_000_000_000);

        let target = recompute(total_managed, aggregated_health, &params).unwrap();
        let base = base_target(total_managed, &params).unwrap();

        assert!(target >= base / 2);
    }
}
