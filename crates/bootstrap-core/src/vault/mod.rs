//! # Bootstrap Vault
//!
//! Dual-sided inventory seeded at market bootstrap, the rebalance budget, and
//! one reward ledger per side for vault-share holders.

pub mod inventory;
pub mod otc;

pub use inventory::*;
pub use otc::*;

use crate::errors::{CoreError, CoreResult};
use crate::ledger::RewardLedger;
use crate::types::{AccountId, Side};
use bootstrap_math::{mul_div, safe_add_u128, safe_sub_u128};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub shares: u128,
    /// Rewards paid out on an existing position before the balance changed
    pub harvested: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    /// Underlying claims of the withdrawn side
    pub redeemed: u128,
    /// Collateral fees paid out
    pub harvested: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BootstrapVault {
    pub inventory: VaultInventory,
    /// Collateral reserved to subsidize OTC fills
    pub budget: u128,
    /// Collateral owed to share holders through the ledgers
    pub fee_reserve: u128,
    ledgers: [RewardLedger<AccountId>; 2],
}

impl BootstrapVault {
    pub fn new(now: i64) -> Self {
        Self {
            inventory: VaultInventory { yes: 0, no: 0, last_activity: now },
            ..Self::default()
        }
    }

    pub fn ledger(&self, side: Side) -> &RewardLedger<AccountId> {
        &self.ledgers[side.index()]
    }

    /// Outstanding vault shares on `side`
    pub fn total_shares(&self, side: Side) -> u128 {
        self.ledgers[side.index()].total_shares()
    }

    /// Inventory at zero while shares on it are outstanding
    pub fn is_depleted(&self, side: Side) -> bool {
        self.inventory.get(side) == 0 && self.total_shares(side) > 0
    }

    pub fn deposit(&mut self, side: Side, amount: u128, depositor: AccountId, now: i64) -> CoreResult<DepositReceipt> {
        if amount == 0 {
            return Err(CoreError::ZeroShares);
        }
        if self.is_depleted(side) {
            return Err(CoreError::VaultDepleted);
        }

        let total = self.total_shares(side);
        let shares = if total == 0 {
            amount
        } else {
            mul_div(amount, total, self.inventory.get(side))?
        };
        if shares == 0 {
            return Err(CoreError::ZeroShares);
        }

        let inventory = self.inventory.with_deposit(side, amount, now)?;
        let harvested = self.ledgers[side.index()].credit(depositor, shares, now)?;
        self.fee_reserve = safe_sub_u128(self.fee_reserve, harvested)?;
        self.inventory = inventory;

        debug!(%side, amount, shares, "vault deposit");
        Ok(DepositReceipt { shares, harvested })
    }

    pub fn withdraw(
        &mut self,
        side: Side,
        shares: u128,
        owner: AccountId,
        now: i64,
        cooldown: i64,
    ) -> CoreResult<WithdrawReceipt> {
        if shares == 0 {
            return Err(CoreError::ZeroVaultShares);
        }
        let ledger = &self.ledgers[side.index()];
        let position = ledger.position(&owner).ok_or(CoreError::PositionNotFound)?;
        check_cooldown(position.deposit_timestamp, now, cooldown)?;
        if shares > position.balance {
            return Err(CoreError::InsufficientVaultShares { requested: shares, balance: position.balance });
        }

        let redeemed = mul_div(shares, self.inventory.get(side), ledger.total_shares())?;
        let inventory = self.inventory.with_withdrawal(side, redeemed, now)?;
        let harvested = self.ledgers[side.index()].debit(owner, shares)?;
        self.fee_reserve = safe_sub_u128(self.fee_reserve, harvested)?;
        self.inventory = inventory;

        debug!(%side, shares, redeemed, harvested, "vault withdrawal");
        Ok(WithdrawReceipt { redeemed, harvested })
    }

    /// Pay out pending fees. Zero, not an error, without a position.
    pub fn harvest(&mut self, side: Side, owner: AccountId, now: i64, cooldown: i64) -> CoreResult<u128> {
        let Some(position) = self.ledgers[side.index()].position(&owner) else {
            return Ok(0);
        };
        check_cooldown(position.deposit_timestamp, now, cooldown)?;

        let harvested = self.ledgers[side.index()].harvest(owner)?;
        self.fee_reserve = safe_sub_u128(self.fee_reserve, harvested)?;
        Ok(harvested)
    }

    /// Apply a quoted OTC fill in one update. Returns the fee that reached
    /// the accumulator.
    pub fn apply_otc(&mut self, quote: &OtcQuote, now: i64) -> CoreResult<u128> {
        let inventory = self.inventory.with_otc_fill(quote.side, quote.size, quote.direction, now)?;
        let budget = safe_add_u128(safe_sub_u128(self.budget, quote.subsidy)?, quote.spread_fee)?;
        let fee_reserve = safe_add_u128(self.fee_reserve, quote.spread_fee)?;
        let accrued = self.ledgers[quote.side.index()].accrue(quote.spread_fee)?;

        self.inventory = inventory;
        self.budget = budget;
        self.fee_reserve = fee_reserve;
        Ok(accrued)
    }

    /// Take claims into inventory without minting shares
    pub fn absorb(&mut self, side: Side, amount: u128, now: i64) -> CoreResult<()> {
        self.inventory = self.inventory.with_deposit(side, amount, now)?;
        Ok(())
    }
}

fn check_cooldown(deposit_timestamp: i64, now: i64, cooldown: i64) -> CoreResult<()> {
    let available_at = deposit_timestamp.saturating_add(cooldown);
    if now < available_at {
        return Err(CoreError::WithdrawalTooSoon { available_at });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_WITHDRAW_COOLDOWN_SECS as COOLDOWN;
    use crate::types::TradeDirection;

    const ALICE: AccountId = AccountId::repeat(1);
    const BOB: AccountId = AccountId::repeat(2);

    fn fill(side: Side, size: u128, spread_fee: u128) -> OtcQuote {
        OtcQuote {
            side,
            direction: TradeDirection::Buy,
            size,
            collateral: size,
            price: 0,
            spread_fee,
            subsidy: 0,
        }
    }

    #[test]
    fn test_first_deposit_is_one_to_one() {
        let mut vault = BootstrapVault::new(0);
        let receipt = vault.deposit(Side::Yes, 100, ALICE, 0).unwrap();
        assert_eq!(receipt.shares, 100);
        assert_eq!(vault.inventory.yes, 100);
    }

    #[test]
    fn test_pro_rata_deposit() {
        let mut vault = BootstrapVault::new(0);
        vault.deposit(Side::No, 100, ALICE, 0).unwrap();
        vault.deposit(Side::Yes, 100, ALICE, 0).unwrap();
        // Inventory on NO grows to 150 backing 100 shares
        vault.apply_otc(&fill(Side::Yes, 50, 0), 1).unwrap();

        let receipt = vault.deposit(Side::No, 30, BOB, 2).unwrap();
        assert_eq!(receipt.shares, 20);
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let mut vault = BootstrapVault::new(0);
        assert_eq!(vault.deposit(Side::Yes, 0, ALICE, 0), Err(CoreError::ZeroShares));
    }

    #[test]
    fn test_depleted_side_rejects_deposits() {
        let mut vault = BootstrapVault::new(0);
        vault.deposit(Side::Yes, 10, ALICE, 0).unwrap();
        vault.deposit(Side::No, 100, ALICE, 0).unwrap();
        vault.apply_otc(&fill(Side::Yes, 10, 0), 1).unwrap();

        assert!(vault.is_depleted(Side::Yes));
        assert_eq!(vault.deposit(Side::Yes, 5, BOB, 2), Err(CoreError::VaultDepleted));

        // A sell of YES into the vault replenishes it
        let replenish = OtcQuote { direction: TradeDirection::Sell, ..fill(Side::Yes, 4, 0) };
        vault.apply_otc(&replenish, 3).unwrap();
        assert!(vault.deposit(Side::Yes, 5, BOB, 4).is_ok());
    }

    #[test]
    fn test_withdraw_cooldown_boundary() {
        let mut vault = BootstrapVault::new(0);
        vault.deposit(Side::Yes, 100, ALICE, 1_000).unwrap();

        let err = vault.withdraw(Side::Yes, 10, ALICE, 1_000 + COOLDOWN - 1, COOLDOWN).unwrap_err();
        assert_eq!(err, CoreError::WithdrawalTooSoon { available_at: 1_000 + COOLDOWN });

        assert!(vault.withdraw(Side::Yes, 10, ALICE, 1_000 + COOLDOWN + 1, COOLDOWN).is_ok());
    }

    #[test]
    fn test_withdraw_error_order() {
        let mut vault = BootstrapVault::new(0);
        assert_eq!(vault.withdraw(Side::Yes, 0, ALICE, 0, COOLDOWN), Err(CoreError::ZeroVaultShares));
        assert_eq!(vault.withdraw(Side::Yes, 1, ALICE, 0, COOLDOWN), Err(CoreError::PositionNotFound));

        vault.deposit(Side::Yes, 10, ALICE, 0).unwrap();
        assert_eq!(
            vault.withdraw(Side::Yes, 11, ALICE, COOLDOWN, COOLDOWN),
            Err(CoreError::InsufficientVaultShares { requested: 11, balance: 10 })
        );
    }

    #[test]
    fn test_withdraw_redeems_pro_rata_and_pays_all_fees() {
        let mut vault = BootstrapVault::new(0);
        vault.deposit(Side::Yes, 100, ALICE, 0).unwrap();
        vault.deposit(Side::No, 200, BOB, 0).unwrap();
        vault.apply_otc(&fill(Side::Yes, 20, 8), 1).unwrap();

        let receipt = vault.withdraw(Side::Yes, 50, ALICE, COOLDOWN, COOLDOWN).unwrap();
        // 50 of 100 shares over 80 inventory
        assert_eq!(receipt.redeemed, 40);
        assert_eq!(receipt.harvested, 8);
        assert_eq!(vault.fee_reserve, 0);
        assert_eq!(vault.inventory.yes, 40);
    }

    #[test]
    fn test_every_holder_can_exit_after_fees() {
        let mut vault = BootstrapVault::new(0);
        vault.deposit(Side::Yes, 11, ALICE, 0).unwrap();
        vault.deposit(Side::Yes, 11, BOB, 0).unwrap();
        vault.deposit(Side::No, 1_000, ALICE, 0).unwrap();
        for fee in [11_653_519_853_616, 2_709_524_880_360, 73_856_024_689_045] {
            vault.apply_otc(&fill(Side::Yes, 1, fee), 1).unwrap();
        }

        let alice = vault.withdraw(Side::Yes, 11, ALICE, COOLDOWN, COOLDOWN).unwrap();
        let bob = vault.withdraw(Side::Yes, 11, BOB, COOLDOWN, COOLDOWN).unwrap();
        assert_eq!(alice.harvested, bob.harvested);
        assert_eq!(alice.redeemed + bob.redeemed, 19);
        assert_eq!(vault.total_shares(Side::Yes), 0);
    }

    #[test]
    fn test_harvest_without_position_is_zero() {
        let mut vault = BootstrapVault::new(0);
        assert_eq!(vault.harvest(Side::No, ALICE, 0, COOLDOWN), Ok(0));
    }

    #[test]
    fn test_harvest_respects_cooldown() {
        let mut vault = BootstrapVault::new(0);
        vault.deposit(Side::Yes, 100, ALICE, 0).unwrap();
        vault.deposit(Side::No, 200, BOB, 0).unwrap();
        vault.apply_otc(&fill(Side::Yes, 20, 8), 1).unwrap();

        assert!(matches!(
            vault.harvest(Side::Yes, ALICE, 10, COOLDOWN),
            Err(CoreError::WithdrawalTooSoon { .. })
        ));
        assert_eq!(vault.harvest(Side::Yes, ALICE, COOLDOWN, COOLDOWN), Ok(8));
        assert_eq!(vault.harvest(Side::Yes, ALICE, COOLDOWN, COOLDOWN), Ok(0));
    }

    #[test]
    fn test_apply_otc_updates_budget() {
        let mut vault = BootstrapVault::new(0);
        vault.deposit(Side::Yes, 100, ALICE, 0).unwrap();
        vault.deposit(Side::No, 200, BOB, 0).unwrap();
        vault.budget = 10;

        let quote = OtcQuote { subsidy: 4, ..fill(Side::Yes, 20, 3) };
        vault.apply_otc(&quote, 5).unwrap();
        assert_eq!(vault.budget, 10 - 4 + 3);
        assert_eq!(vault.inventory, VaultInventory { yes: 80, no: 220, last_activity: 5 });

        let overdraw = OtcQuote { subsidy: 100, ..fill(Side::Yes, 1, 0) };
        assert!(vault.apply_otc(&overdraw, 6).is_err());
        assert_eq!(vault.inventory.yes, 80);
    }
}
