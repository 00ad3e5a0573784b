//! Core data structures: reserve state, parameters, events, errors.

use crate::math;

/// Percentage base for all scaled ratios (100 = whole units of percent).
pub const SCALE: u128 = 100;

/// Capacity of the rolling health history.
pub const MAX_HEALTH_SAMPLES: usize = 24;

/// User identity as seen by the external ledger.
pub type UserId = u64;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// Amount is zero
    ZeroAmount,

    /// Discounted payout still exceeds the liquid balance
    InsufficientLiquidity,

    /// Ledger balance cannot cover the debit
    InsufficientUserBalance,

    /// Denominator was zero
    DivisionByZero,

    /// Arithmetic overflow
    Overflow,

    /// External yield mechanism refused an allocation
    AllocationRejected,
}

pub type Result<T> = core::result::Result<T, BufferError>;

// ============================================================================
// Parameters
// ============================================================================

/// Buffer engine parameters, all percentages scaled by [`SCALE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferParams {
    /// Target as a percentage of total managed funds under neutral health
    pub base_target_pct: u128,

    /// Health at or above which withdrawals incur no slippage
    pub healthy_threshold: u128,

    /// Floor added to the health-derived payout multiplier
    pub min_multiplier_offset: u128,

    /// Below this many samples, `aggregate` returns the most recent sample
    pub min_aggregate_window: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            base_target_pct: 20,
            healthy_threshold: 80,
            min_multiplier_offset: 20,
            min_aggregate_window: 3,
        }
    }
}

// ============================================================================
// Reserve
// ============================================================================

/// Process-wide reserve state.
///
/// `total_managed = liquid + staked`. The target invariant
/// `target >= base_target / 2` is maintained by the controller, which clamps
/// rather than fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reserve {
    /// Funds held and immediately withdrawable
    pub liquid: u128,

    /// Funds currently allocated to the external yield mechanism
    pub staked: u128,

    /// Desired liquid balance
    pub target: u128,
}

impl Reserve {
    pub fn new(initial_target: u128) -> Self {
        Self {
            liquid: 0,
            staked: 0,
            target: initial_target,
        }
    }

    /// Liquid plus externally allocated funds.
    pub fn total_managed(&self) -> Result<u128> {
        self.liquid
            .checked_add(self.staked)
            .ok_or(BufferError::Overflow)
    }

    /// Health of `amount` relative to the current target, scaled by
    /// [`SCALE`] and uncapped above it.
    ///
    /// A zero target is defined as fully healthy rather than an error; the
    /// division-by-zero case never reaches `ratio_scaled`.
    pub fn buffer_health(&self, amount: u128) -> Result<u128> {
        if self.target == 0 {
            return Ok(SCALE);
        }
        math::ratio_scaled(amount, self.target, SCALE)
    }
}

// ============================================================================
// Health Samples & Events
// ============================================================================

/// One health observation, with its position in the sampling sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthSample {
    /// Health at sampling time, scaled by [`SCALE`]
    pub health: u128,

    /// Monotonic sequence number assigned by the engine
    pub seq: u64,
}

/// Observable, ordered record of a state transition.
///
/// No event is emitted for a no-op reconciliation or an unchanged target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A withdrawal paid out; `received <= requested`, strictly less
    /// whenever the discount branch applied below 100% health
    Withdrawal {
        user: UserId,
        requested: u128,
        received: u128,
    },

    /// The update cycle moved the target
    TargetUpdated { old_target: u128, new_target: u128 },

    /// Surplus liquidity was delegated to the yield mechanism
    StakeExecuted { amount: u128 },

    /// Liquidity was reclaimed; carries the amount actually returned
    UnstakeExecuted { amount: u128 },
}
