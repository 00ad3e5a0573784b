//! Stake/unstake reconciliation against the external yield mechanism.

use crate::state::{BufferError, Reserve, Result};

// ============================================================================
// Yield Mechanism Trait
// ============================================================================

/// Narrow interface to the external yield-bearing allocation.
///
/// The engine updates its own bookkeeping only from the amounts reported
/// here. `allocate` either fully applies or fails; `reclaim` returns the
/// amount actually unwound, which may fall short of the request.
pub trait YieldMechanism {
    /// Delegate `amount` to the external allocation.
    fn allocate(&mut self, amount: u128) -> Result<()>;

    /// Reclaim up to `amount`; returns the amount actually returned.
    fn reclaim(&mut self, amount: u128) -> u128;
}

/// Mechanism that accepts every allocation and always reclaims in full.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpYield;

impl YieldMechanism for NoOpYield {
    fn allocate(&mut self, _amount: u128) -> Result<()> {
        Ok(())
    }

    fn reclaim(&mut self, amount: u128) -> u128 {
        amount
    }
}

/// Simulated mechanism with configurable failure modes, for tests and the
/// scenario driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimYield {
    /// Funds the mechanism currently holds
    pub held: u128,

    /// Refuse every `allocate` call
    pub reject_allocations: bool,

    /// Cap on any single `reclaim`, simulating a partial unwind
    pub reclaim_cap: Option<u128>,
}

impl SimYield {
    pub fn new() -> Self {
        Self::default()
    }
}

impl YieldMechanism for SimYield {
    fn allocate(&mut self, amount: u128) -> Result<()> {
        if self.reject_allocations {
            return Err(BufferError::AllocationRejected);
        }
        self.held = self
            .held
            .checked_add(amount)
            .ok_or(BufferError::Overflow)?;
        Ok(())
    }

    fn reclaim(&mut self, amount: u128) -> u128 {
        let mut granted = amount.min(self.held);
        if let Some(cap) = self.reclaim_cap {
            granted = granted.min(cap);
        }
        self.held -= granted;
        granted
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// What a reconciliation did, if anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebalanceAction {
    /// Surplus delegated externally
    Staked(u128),

    /// Liquidity reclaimed; carries the amount actually returned
    Unstaked(u128),
}

/// Reconcile the liquid balance with the target.
///
/// Surplus is allocated externally in full or not at all; a shortfall is
/// reclaimed for whatever the mechanism actually returns. Idempotent when
/// `liquid == target`: no call, no action. The reserve is only mutated after
/// the external call reports success, so a rejected allocation leaves state
/// untouched.
pub fn reconcile<Y: YieldMechanism>(
    reserve: &mut Reserve,
    mech: &mut Y,
) -> Result<Option<RebalanceAction>> {
    if reserve.liquid > reserve.target {
        let surplus = reserve.liquid - reserve.target;
        mech.allocate(surplus)?;
        reserve.staked = reserve
            .staked
            .checked_add(surplus)
            .ok_or(BufferError::Overflow)?;
        reserve.liquid -= surplus;
        Ok(Some(RebalanceAction::Staked(surplus)))
    } else if reserve.liquid < reserve.target {
        let shortfall = reserve.target - reserve.liquid;
        // The mechanism must not return more than requested or more than it
        // was ever given; clamp so a misbehaving one cannot corrupt books.
        let actual = mech.reclaim(shortfall).min(shortfall).min(reserve.staked);
        if actual == 0 {
            return Ok(None);
        }
        reserve.liquid += actual;
        reserve.staked -= actual;
        Ok(Some(RebalanceAction::Unstaked(actual)))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserve(liquid: u128, staked: u128, target: u128) -> Reserve {
        Reserve {
            liquid,
            staked,
            target,
        }
    }

    #[test]
    fn surplus_is_staked() {
        let mut res = reserve(1_000, 0, 200);
        let mut mech = SimYield::new();

        let action = reconcile(&mut res, &mut mech).unwrap();
        assert_eq!(action, Some(RebalanceAction::Staked(800)));
        assert_eq!(res.liquid, 200);
        assert_eq!(res.staked, 800);
        assert_eq!(mech.held, 800);
    }

    #[test]
    fn shortfall_is_reclaimed() {
        let mut res = reserve(100, 500, 300);
        let mut mech = SimYield {
            held: 500,
            ..SimYield::new()
        };

        let action = reconcile(&mut res, &mut mech).unwrap();
        assert_eq!(action, Some(RebalanceAction::Unstaked(200)));
        assert_eq!(res.liquid, 300);
        assert_eq!(res.staked, 300);
        assert_eq!(mech.held, 300);
    }

    #[test]
    fn partial_reclaim_is_tolerated() {
        let mut res = reserve(100, 500, 300);
        let mut mech = SimYield {
            held: 500,
            reclaim_cap: Some(50),
            ..SimYield::new()
        };

        let action = reconcile(&mut res, &mut mech).unwrap();
        assert_eq!(action, Some(RebalanceAction::Unstaked(50)));
        assert_eq!(res.liquid, 150);
        assert_eq!(res.staked, 450);
    }

    #[test]
    fn fully_dry_reclaim_is_not_an_action() {
        let mut res = reserve(100, 500, 300);
        let mut mech = SimYield {
            held: 500,
            reclaim_cap: Some(0),
            ..SimYield::new()
        };

        let action = reconcile(&mut res, &mut mech).unwrap();
        assert_eq!(action, None);
        assert_eq!(res, reserve(100, 500, 300));
    }

    #[test]
    fn balanced_reserve_is_a_noop() {
        let mut res = reserve(300, 100, 300);
        let mut mech = SimYield {
            held: 100,
            ..SimYield::new()
        };
        let before = res;

        let action = reconcile(&mut res, &mut mech).unwrap();
        assert_eq!(action, None);
        assert_eq!(res, before);
        assert_eq!(mech.held, 100);
    }

    #[test]
    fn rejected_allocation_leaves_state_untouched() {
        let mut res = reserve(1_000, 0, 200);
        let before = res;
        let mut mech = SimYield {
            reject_allocations: true,
            ..SimYield::new()
        };

        let err = reconcile(&mut res, &mut mech).unwrap_err();
        assert_eq!(err, BufferError::AllocationRejected);
        assert_eq!(res, before);
        assert_eq!(mech.held, 0);
    }

    #[test]
    fn reclaim_never_exceeds_tracked_stake() {
        // Mechanism claims to hold more than the reserve ever allocated.
        let mut res = reserve(0, 100, 300);
        let mut mech = SimYield {
            held: 10_000,
            ..SimYield::new()
        };

        let action = reconcile(&mut res, &mut mech).unwrap();
        assert_eq!(action, Some(RebalanceAction::Unstaked(100)));
        assert_eq!(res.staked, 0);
        assert_eq!(res.liquid, 100);
    }
}
