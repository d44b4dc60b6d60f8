//! # Reward Ledger
//!
//! Reward-per-share accounting for proportional fee distribution in O(1) per
//! operation. Invariants:
//!
//! - `acc_per_share` never decreases.
//! - Every balance change pays out pending rewards first, then resets
//!   `reward_debt = ceil(balance * acc_per_share / ACC_SCALE)`.
//! - Total payouts never exceed total accrued fees. Accumulator increments
//!   round down and debts round up, so rounding dust stays with the payer.
//! - Fees arriving while no shares are outstanding are carried in
//!   `undistributed` and folded into the next accrual.

use crate::constants::ACC_SCALE;
use crate::errors::{CoreError, CoreResult};
use bootstrap_math::{mul_div, mul_div_up, safe_add_u128, safe_sub_u128};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerPosition {
    pub balance: u128,
    pub reward_debt: u128,
    pub deposit_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardLedger<K: Ord + Copy> {
    acc_per_share: u128,
    total_shares: u128,
    undistributed: u128,
    positions: BTreeMap<K, LedgerPosition>,
}

impl<K: Ord + Copy> Default for RewardLedger<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy> RewardLedger<K> {
    pub fn new() -> Self {
        Self {
            acc_per_share: 0,
            total_shares: 0,
            undistributed: 0,
            positions: BTreeMap::new(),
        }
    }

    pub fn acc_per_share(&self) -> u128 {
        self.acc_per_share
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    pub fn undistributed(&self) -> u128 {
        self.undistributed
    }

    pub fn position(&self, key: &K) -> Option<&LedgerPosition> {
        self.positions.get(key)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&K, &LedgerPosition)> {
        self.positions.iter()
    }

    /// Distribute `fee` over outstanding shares. Returns the amount that
    /// reached the accumulator; the remainder below one accumulator step is
    /// not carried.
    pub fn accrue(&mut self, fee: u128) -> CoreResult<u128> {
        let amount = safe_add_u128(fee, self.undistributed)?;
        if self.total_shares == 0 || amount == 0 {
            self.undistributed = amount;
            return Ok(0);
        }

        let increment = mul_div(amount, ACC_SCALE, self.total_shares)?;
        let distributed = mul_div(increment, self.total_shares, ACC_SCALE)?;

        self.acc_per_share = safe_add_u128(self.acc_per_share, increment)?;
        self.undistributed = 0;
        Ok(distributed)
    }

    /// Harvestable amount for `key`
    pub fn pending(&self, key: &K) -> CoreResult<u128> {
        match self.positions.get(key) {
            Some(position) => self.pending_for(position),
            None => Ok(0),
        }
    }

    fn pending_for(&self, position: &LedgerPosition) -> CoreResult<u128> {
        let accrued = mul_div(position.balance, self.acc_per_share, ACC_SCALE)?;
        Ok(accrued.saturating_sub(position.reward_debt))
    }

    fn debt_for(&self, balance: u128) -> CoreResult<u128> {
        Ok(mul_div_up(balance, self.acc_per_share, ACC_SCALE)?)
    }

    /// Add `shares` to `key`, restamping its deposit time. Returns rewards
    /// paid out on the existing balance.
    pub fn credit(&mut self, key: K, shares: u128, now: i64) -> CoreResult<u128> {
        let mut position = self.positions.get(&key).copied().unwrap_or_default();
        let paid = self.pending_for(&position)?;

        position.balance = safe_add_u128(position.balance, shares)?;
        position.reward_debt = self.debt_for(position.balance)?;
        position.deposit_timestamp = now;

        self.total_shares = safe_add_u128(self.total_shares, shares)?;
        self.positions.insert(key, position);
        Ok(paid)
    }

    /// Remove `shares` from `key`. Returns all pending rewards, not only the
    /// withdrawn fraction.
    pub fn debit(&mut self, key: K, shares: u128) -> CoreResult<u128> {
        let mut position = self.positions.get(&key).copied().ok_or(CoreError::PositionNotFound)?;
        if shares > position.balance {
            return Err(CoreError::InsufficientVaultShares {
                requested: shares,
                balance: position.balance,
            });
        }
        let paid = self.pending_for(&position)?;

        position.balance -= shares;
        self.total_shares = safe_sub_u128(self.total_shares, shares)?;

        if position.balance == 0 {
            self.positions.remove(&key);
        } else {
            position.reward_debt = self.debt_for(position.balance)?;
            self.positions.insert(key, position);
        }
        Ok(paid)
    }

    /// Pay out pending rewards without touching the balance
    pub fn harvest(&mut self, key: K) -> CoreResult<u128> {
        let Some(mut position) = self.positions.get(&key).copied() else {
            return Ok(0);
        };
        let paid = self.pending_for(&position)?;
        if paid > 0 {
            position.reward_debt = self.debt_for(position.balance)?;
            self.positions.insert(key, position);
        }
        Ok(paid)
    }
}
