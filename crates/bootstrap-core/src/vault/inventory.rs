//! Packed dual-sided vault inventory.
//!
//! The record is a value type: every transition reads all fields once and
//! returns a whole new record, which the caller writes back in one assignment.

use crate::errors::CoreResult;
use crate::types::{Side, TradeDirection};
use bootstrap_math::{safe_add_u128, safe_sub_u128};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "anchor", derive(anchor_lang::AnchorSerialize, anchor_lang::AnchorDeserialize))]
pub struct VaultInventory {
    pub yes: u128,
    pub no: u128,
    pub last_activity: i64,
}

impl VaultInventory {
    pub fn get(&self, side: Side) -> u128 {
        match side {
            Side::Yes => self.yes,
            Side::No => self.no,
        }
    }

    /// Strictly smaller side, `None` when balanced
    pub fn scarce_side(&self) -> Option<Side> {
        match self.yes.cmp(&self.no) {
            std::cmp::Ordering::Less => Some(Side::Yes),
            std::cmp::Ordering::Greater => Some(Side::No),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn is_scarce(&self, side: Side) -> bool {
        self.scarce_side() == Some(side)
    }

    fn with_sides(&self, side: Side, side_amount: u128, other_amount: u128, now: i64) -> Self {
        let (yes, no) = match side {
            Side::Yes => (side_amount, other_amount),
            Side::No => (other_amount, side_amount),
        };
        Self { yes, no, last_activity: now }
    }

    /// Taker trades `size` of `side` against the vault.
    ///
    /// A buy releases `side` and takes on the opposite; a sell does the reverse.
    pub fn with_otc_fill(&self, side: Side, size: u128, direction: TradeDirection, now: i64) -> CoreResult<Self> {
        let current = self.get(side);
        let opposite = self.get(side.opposite());
        let (current, opposite) = match direction {
            TradeDirection::Buy => (safe_sub_u128(current, size)?, safe_add_u128(opposite, size)?),
            TradeDirection::Sell => (safe_add_u128(current, size)?, safe_sub_u128(opposite, size)?),
        };
        Ok(self.with_sides(side, current, opposite, now))
    }

    pub fn with_deposit(&self, side: Side, amount: u128, now: i64) -> CoreResult<Self> {
        let current = safe_add_u128(self.get(side), amount)?;
        Ok(self.with_sides(side, current, self.get(side.opposite()), now))
    }

    pub fn with_withdrawal(&self, side: Side, amount: u128, now: i64) -> CoreResult<Self> {
        let current = safe_sub_u128(self.get(side), amount)?;
        Ok(self.with_sides(side, current, self.get(side.opposite()), now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreError;

    #[test]
    fn test_scarce_side() {
        let inv = VaultInventory { yes: 40, no: 60, last_activity: 0 };
        assert_eq!(inv.scarce_side(), Some(Side::Yes));
        assert!(!inv.is_scarce(Side::No));
        assert_eq!(VaultInventory { yes: 5, no: 5, last_activity: 0 }.scarce_side(), None);
    }

    #[test]
    fn test_fill_moves_both_sides_at_once() {
        let inv = VaultInventory { yes: 40, no: 60, last_activity: 1 };
        let bought = inv.with_otc_fill(Side::Yes, 10, TradeDirection::Buy, 7).unwrap();
        assert_eq!(bought, VaultInventory { yes: 30, no: 70, last_activity: 7 });

        let sold = inv.with_otc_fill(Side::No, 10, TradeDirection::Sell, 8).unwrap();
        assert_eq!(sold, VaultInventory { yes: 30, no: 70, last_activity: 8 });

        // Original record untouched
        assert_eq!(inv.yes, 40);
    }

    #[test]
    fn test_fill_cannot_underflow() {
        let inv = VaultInventory { yes: 3, no: 60, last_activity: 0 };
        assert_eq!(
            inv.with_otc_fill(Side::Yes, 4, TradeDirection::Buy, 0),
            Err(CoreError::MathUnderflow)
        );
    }

    #[test]
    fn test_deposit_and_withdrawal() {
        let inv = VaultInventory::default().with_deposit(Side::No, 25, 3).unwrap();
        assert_eq!(inv.get(Side::No), 25);
        let inv = inv.with_withdrawal(Side::No, 5, 4).unwrap();
        assert_eq!((inv.yes, inv.no, inv.last_activity), (0, 20, 4));
    }
}
