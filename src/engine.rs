//! The buffer engine: operation surface, ledger seam, update cycle.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::curve;
use crate::history::HealthHistory;
use crate::rebalance::{self, RebalanceAction, YieldMechanism};
use crate::state::{
    BufferError, BufferParams, Event, HealthSample, Reserve, Result, UserId,
};
use crate::target;

// ============================================================================
// Ledger Trait
// ============================================================================

/// External per-user balance bookkeeping.
///
/// The engine only increments and decrements balances; storage, identity and
/// the sum-of-balances invariant belong to the implementer.
pub trait Ledger {
    /// Add `amount` to the user's balance.
    fn credit(&mut self, user: UserId, amount: u128) -> Result<()>;

    /// Remove `amount` from the user's balance; fails with
    /// `InsufficientUserBalance` if it cannot cover the debit.
    fn debit(&mut self, user: UserId, amount: u128) -> Result<()>;

    /// Current balance, zero for unknown users.
    fn balance_of(&self, user: UserId) -> u128;
}

/// In-memory ledger over a `BTreeMap`, for tests and the scenario driver.
#[derive(Clone, Debug, Default)]
pub struct MapLedger {
    balances: BTreeMap<UserId, u128>,
}

impl MapLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ledger for MapLedger {
    fn credit(&mut self, user: UserId, amount: u128) -> Result<()> {
        let balance = self.balances.entry(user).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(BufferError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, user: UserId, amount: u128) -> Result<()> {
        match self.balances.get_mut(&user) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                Ok(())
            }
            _ => Err(BufferError::InsufficientUserBalance),
        }
    }

    fn balance_of(&self, user: UserId) -> u128 {
        self.balances.get(&user).copied().unwrap_or(0)
    }
}

// ============================================================================
// Buffer Engine
// ============================================================================

/// Single-writer engine state - generic over the ledger implementation.
#[derive(Clone, Debug)]
pub struct BufferEngine<L = MapLedger>
where
    L: Ledger,
{
    /// Liquid balance, external allocation and target
    pub reserve: Reserve,

    /// Engine parameters
    pub params: BufferParams,

    /// Rolling health history feeding the target controller
    pub history: HealthHistory,

    /// Per-user balances
    pub ledger: L,

    /// Ordered log of emitted events, drained by the caller
    pub events: Vec<Event>,

    /// Next health sample sequence number
    next_seq: u64,
}

/// Type alias for the default map-backed engine.
pub type MapBufferEngine = BufferEngine<MapLedger>;

impl BufferEngine<MapLedger> {
    /// Engine with an in-memory ledger and an explicit initial target.
    pub fn new(params: BufferParams, initial_target: u128) -> Self {
        Self::with_ledger(params, initial_target, MapLedger::new())
    }
}

impl<L: Ledger> BufferEngine<L> {
    pub fn with_ledger(params: BufferParams, initial_target: u128, ledger: L) -> Self {
        Self {
            reserve: Reserve::new(initial_target),
            params,
            history: HealthHistory::new(),
            ledger,
            events: Vec::new(),
            next_seq: 0,
        }
    }

    // ========================================
    // Queries
    // ========================================

    /// Health of `amount` against the current target. Pure query.
    pub fn buffer_health(&self, amount: u128) -> Result<u128> {
        self.reserve.buffer_health(amount)
    }

    pub fn balance_of(&self, user: UserId) -> u128 {
        self.ledger.balance_of(user)
    }

    pub fn target(&self) -> u128 {
        self.reserve.target
    }

    pub fn liquid(&self) -> u128 {
        self.reserve.liquid
    }

    pub fn staked(&self) -> u128 {
        self.reserve.staked
    }

    pub fn total_managed(&self) -> Result<u128> {
        self.reserve.total_managed()
    }

    /// Take the ordered event log, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }

    // ========================================
    // Deposits & Withdrawals
    // ========================================

    /// Credit the user and grow the liquid balance by `amount`.
    pub fn deposit(&mut self, user: UserId, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(BufferError::ZeroAmount);
        }
        let new_liquid = self
            .reserve
            .liquid
            .checked_add(amount)
            .ok_or(BufferError::Overflow)?;
        // Total managed funds must stay representable too.
        new_liquid
            .checked_add(self.reserve.staked)
            .ok_or(BufferError::Overflow)?;

        self.ledger.credit(user, amount)?;
        self.reserve.liquid = new_liquid;
        Ok(())
    }

    /// Withdraw up to `requested`, priced by the current health.
    ///
    /// Returns the amount actually paid out. The user's balance and the
    /// liquid balance both decrease by the payout, not the request.
    pub fn withdraw(&mut self, user: UserId, requested: u128) -> Result<u128> {
        if requested == 0 {
            return Err(BufferError::ZeroAmount);
        }
        let health = self.reserve.buffer_health(self.reserve.liquid)?;
        let payout = curve::quote(requested, health, &self.params)?;
        if payout > self.reserve.liquid {
            return Err(BufferError::InsufficientLiquidity);
        }

        self.ledger.debit(user, payout)?;
        self.reserve.liquid -= payout;
        self.events.push(Event::Withdrawal {
            user,
            requested,
            received: payout,
        });
        Ok(payout)
    }

    // ========================================
    // Update Cycle
    // ========================================

    /// Sample current health against the current target and append it to the
    /// history. Returns the sampled health.
    pub fn record_health_sample(&mut self) -> Result<u128> {
        let health = self.reserve.buffer_health(self.reserve.liquid)?;
        let seq = self.next_seq;
        self.history.record(HealthSample { health, seq });
        self.next_seq += 1;
        Ok(health)
    }

    /// Run one full update cycle: Sample -> Record -> RecomputeTarget ->
    /// Reconcile, in that order, with health sampled against the pre-update
    /// target.
    ///
    /// The cycle is atomic: everything is computed on scratch copies and the
    /// external mechanism is consulted before any field is committed, so a
    /// rejected allocation leaves reserve, history and sequence untouched.
    pub fn update_target<Y: YieldMechanism>(&mut self, mech: &mut Y) -> Result<()> {
        // Sample + Record, on a scratch history.
        let health = self.reserve.buffer_health(self.reserve.liquid)?;
        let mut history = self.history.clone();
        history.record(HealthSample {
            health,
            seq: self.next_seq,
        });

        // Recompute.
        let total_managed = self.reserve.total_managed()?;
        let aggregated = history.aggregate(&self.params);
        let new_target = target::recompute(total_managed, aggregated, &self.params)?;

        // Reconcile on a scratch reserve; allocate may still reject here.
        let old_target = self.reserve.target;
        let mut reserve = self.reserve;
        reserve.target = new_target;
        let action = rebalance::reconcile(&mut reserve, mech)?;

        // Commit.
        self.history = history;
        self.next_seq += 1;
        self.reserve = reserve;
        if new_target != old_target {
            self.events.push(Event::TargetUpdated {
                old_target,
                new_target,
            });
        }
        match action {
            Some(RebalanceAction::Staked(amount)) => {
                self.events.push(Event::StakeExecuted { amount });
            }
            Some(RebalanceAction::Unstaked(amount)) => {
                self.events.push(Event::UnstakeExecuted { amount });
            }
            None => {}
        }
        Ok(())
    }
}
