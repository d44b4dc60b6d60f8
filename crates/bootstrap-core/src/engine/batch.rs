//! Batched operations and native payment tracking

use super::BootstrapOutcome;
use crate::errors::{CoreError, CoreResult};
use crate::router::TradeResult;
use crate::types::{AccountId, CollateralAsset, MarketId, Side};
use crate::vault::{DepositReceipt, WithdrawReceipt};
use bootstrap_math::safe_add_u128;
use serde::{Deserialize, Serialize};

/// Parameters for seeding a new market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapParams {
    pub description: String,
    pub resolver: AccountId,
    pub collateral: CollateralAsset,
    pub close_time: i64,
    pub initial_collateral: u128,
    /// Keep this side's vault half as plain claims instead of vault shares
    pub side_preference: Option<Side>,
    pub deadline: i64,
}

/// One step of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    BootstrapMarket(BootstrapParams),
    Buy {
        market: MarketId,
        side: Side,
        collateral_in: u128,
        min_shares_out: u128,
        deadline: i64,
    },
    Sell {
        market: MarketId,
        side: Side,
        shares_in: u128,
        min_collateral_out: u128,
        deadline: i64,
    },
    DepositToVault {
        market: MarketId,
        side: Side,
        amount: u128,
        deadline: i64,
    },
    WithdrawFromVault {
        market: MarketId,
        side: Side,
        shares: u128,
        deadline: i64,
    },
    HarvestVaultFees {
        market: MarketId,
        side: Side,
    },
    UpdateTwapObservation {
        market: MarketId,
    },
    Multicall(Vec<Operation>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationResult {
    Bootstrapped(BootstrapOutcome),
    Traded(TradeResult),
    Deposited(DepositReceipt),
    Withdrawn(WithdrawReceipt),
    Harvested(u128),
    TwapUpdated(bool),
    Batch(Vec<OperationResult>),
}

/// Native value carried by a batch and how much of it has been consumed.
/// Nested batches share their parent's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentContext {
    pub provided: u128,
    pub spent: u128,
}

impl PaymentContext {
    pub fn new(provided: u128) -> Self {
        Self { provided, spent: 0 }
    }

    /// Consume `amount` of collateral for a market backed by `collateral`
    pub fn charge(&mut self, collateral: CollateralAsset, amount: u128) -> CoreResult<()> {
        match collateral {
            CollateralAsset::Native => {
                let spent = safe_add_u128(self.spent, amount)?;
                if spent > self.provided {
                    return Err(CoreError::InsufficientNativePayment { needed: spent, provided: self.provided });
                }
                self.spent = spent;
                Ok(())
            }
            CollateralAsset::Token(_) if self.provided > 0 => Err(CoreError::NativePaymentMismatch),
            CollateralAsset::Token(_) => Ok(()),
        }
    }

    pub fn refund(&self) -> u128 {
        self.provided - self.spent
    }
}

/// Results of a committed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<OperationResult>,
    pub native_spent: u128,
    pub native_refund: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_payment_leaves_no_refund() {
        let mut payment = PaymentContext::new(100);
        payment.charge(CollateralAsset::Native, 40).unwrap();
        payment.charge(CollateralAsset::Native, 60).unwrap();
        assert_eq!(payment.refund(), 0);
    }

    #[test]
    fn test_overspend_rejected() {
        let mut payment = PaymentContext::new(50);
        payment.charge(CollateralAsset::Native, 40).unwrap();
        assert_eq!(
            payment.charge(CollateralAsset::Native, 11),
            Err(CoreError::InsufficientNativePayment { needed: 51, provided: 50 })
        );
        assert_eq!(payment.spent, 40);
    }

    #[test]
    fn test_token_market_with_native_value() {
        let token = CollateralAsset::Token(AccountId::repeat(3));
        assert!(PaymentContext::new(0).charge(token, 10).is_ok());
        assert_eq!(PaymentContext::new(1).charge(token, 10), Err(CoreError::NativePaymentMismatch));
    }

    #[test]
    fn test_running_total_overflow_checked() {
        let mut payment = PaymentContext::new(u128::MAX);
        payment.charge(CollateralAsset::Native, u128::MAX).unwrap();
        assert_eq!(payment.charge(CollateralAsset::Native, 1), Err(CoreError::ComputationOverflow));
    }
}
