//! # Engine
//!
//! Public entry points. Every operation runs inside `atomically`: engine
//! state and collaborators are snapshotted, and restored if the operation
//! fails, so a rejected request leaves no trace.

pub mod batch;

pub use batch::*;

use crate::collaborators::{ClaimRegistry, ExternalVenue, RestingBook};
use crate::config::EngineConfig;
use crate::errors::{CoreError, CoreResult};
use crate::events::EngineEvent;
use crate::fees::{FeeConfig, FeeConfigStore, FeeContext, FeeCurve, FeeQuote};
use crate::oracle::{ReferencePrice, TwapObservation};
use crate::router::{check_deadline, RouteContext, TradeRequest, TradeResult};
use crate::state::{EngineState, MarketState};
use crate::types::{AccountId, ClockSnapshot, MarketId, PoolId, PoolReserves, Side, TradeDirection};
use crate::vault::{BootstrapVault, DepositReceipt, WithdrawReceipt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapOutcome {
    pub market: MarketId,
    pub pool: PoolId,
    /// Pairs placed in the external pool
    pub pool_seed: u128,
    /// Pairs placed in the vault
    pub vault_seed: u128,
    /// Vault shares minted to the creator, indexed by `Side::index`
    pub creator_shares: [u128; 2],
    /// Claims of the preferred side handed to the creator directly
    pub creator_claims: u128,
}

pub struct Engine<V, R, B> {
    config: EngineConfig,
    admin: AccountId,
    clock: ClockSnapshot,
    state: EngineState,
    venue: V,
    registry: R,
    book: B,
}

impl<V, R, B> Engine<V, R, B>
where
    V: ExternalVenue,
    R: ClaimRegistry,
    B: RestingBook,
{
    pub fn new(
        config: EngineConfig,
        admin: AccountId,
        venue: V,
        registry: R,
        book: B,
        clock: ClockSnapshot,
    ) -> CoreResult<Self> {
        config.validate()?;
        let fees = FeeConfigStore::new(config.fees)?;
        Ok(Self {
            config,
            admin,
            clock,
            state: EngineState::new(fees),
            venue,
            registry,
            book,
        })
    }

    // ========================================================================
    // Clock and Accessors
    // ========================================================================

    pub fn clock(&self) -> ClockSnapshot {
        self.clock
    }

    pub fn set_clock(&mut self, clock: ClockSnapshot) {
        self.clock = clock;
    }

    /// Move time forward by `secs` and the slot by `slots`
    pub fn advance_clock(&mut self, secs: i64, slots: u64) {
        self.clock = self.clock.advanced(secs, slots);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn book(&self) -> &B {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut B {
        &mut self.book
    }

    pub fn market_state(&self, market: MarketId) -> CoreResult<&MarketState> {
        self.state.markets.get(&market).ok_or(CoreError::MarketNotFound)
    }

    pub fn vault(&self, market: MarketId) -> CoreResult<&BootstrapVault> {
        Ok(&self.market_state(market)?.vault)
    }

    pub fn pool_reserves(&self, market: MarketId) -> CoreResult<PoolReserves> {
        self.venue.reserves(self.market_state(market)?.pool)
    }

    /// Effective fee configuration for a market
    pub fn fee_config(&self, market: MarketId) -> &FeeConfig {
        self.state.fees.resolve(market)
    }

    pub fn has_fee_override(&self, market: MarketId) -> bool {
        self.state.fees.has_override(market)
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.state.events
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.state.events)
    }

    // ========================================================================
    // Atomic Envelope
    // ========================================================================

    fn atomically<T>(&mut self, operation: &'static str, f: impl FnOnce(&mut Self) -> CoreResult<T>) -> CoreResult<T> {
        let snapshot = (
            self.state.clone(),
            self.venue.clone(),
            self.registry.clone(),
            self.book.clone(),
        );
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                let (state, venue, registry, book) = snapshot;
                self.state = state;
                self.venue = venue;
                self.registry = registry;
                self.book = book;
                warn!(operation, error = %err, "request rolled back");
                Err(err)
            }
        }
    }

    fn with_market<T>(
        &mut self,
        market: MarketId,
        f: impl FnOnce(&mut RouteContext<'_, V, R, B>) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let info = self.registry.market(market)?;
        let fee_config = *self.state.fees.resolve(market);
        let state = self.state.markets.get_mut(&market).ok_or(CoreError::MarketNotFound)?;
        let mut ctx = RouteContext {
            config: &self.config,
            fee_config,
            info: &info,
            market: state,
            venue: &mut self.venue,
            registry: &mut self.registry,
            book: &mut self.book,
            clock: self.clock,
            events: &mut self.state.events,
        };
        f(&mut ctx)
    }

    fn market_state_mut(&mut self, market: MarketId) -> CoreResult<&mut MarketState> {
        self.state.markets.get_mut(&market).ok_or(CoreError::MarketNotFound)
    }

    // ========================================================================
    // Market Lifecycle
    // ========================================================================

    /// Create a market, seed the external pool with half the collateral and
    /// the vault with the other half
    pub fn bootstrap_market(&mut self, creator: AccountId, params: BootstrapParams) -> CoreResult<BootstrapOutcome> {
        self.atomically("bootstrap_market", |engine| engine.do_bootstrap(creator, &params))
    }

    fn do_bootstrap(&mut self, creator: AccountId, params: &BootstrapParams) -> CoreResult<BootstrapOutcome> {
        let now = self.clock.unix_timestamp;
        if now > params.deadline {
            return Err(CoreError::DeadlineExpired);
        }
        if params.close_time <= now {
            return Err(CoreError::InvalidParameter("close time must be in the future"));
        }
        if params.initial_collateral < 2 {
            return Err(CoreError::ZeroAmount);
        }

        let market = self.registry.create_market(
            &params.description,
            params.resolver,
            params.collateral,
            params.close_time,
        )?;
        if self.state.markets.contains_key(&market) {
            return Err(CoreError::DuplicateRegistration);
        }

        let pairs = self.registry.split(market, params.initial_collateral)?;
        let pool_seed = pairs / 2;
        let vault_seed = pairs - pool_seed;
        let pool = self.venue.create_pool(market, PoolReserves::new(pool_seed, pool_seed))?;

        let mut vault = BootstrapVault::new(now);
        let mut creator_shares = [0u128; 2];
        let mut creator_claims = 0;
        for side in Side::ALL {
            if params.side_preference == Some(side) {
                creator_claims = vault_seed;
                continue;
            }
            creator_shares[side.index()] = vault.deposit(side, vault_seed, creator, now)?.shares;
        }

        let spot = self.venue.reserves(pool)?.price_yes()?;
        self.state.markets.insert(
            market,
            MarketState {
                pool,
                twap: TwapObservation::initialize(spot, self.clock),
                fee_curve: FeeCurve::new(now, self.config.price_history.volatility_reference_bps),
                vault,
            },
        );

        info!(%market, %pool, pool_seed, vault_seed, %creator, "market bootstrapped");
        self.state.events.push(EngineEvent::MarketBootstrapped {
            market,
            pool,
            creator,
            pool_seed,
            vault_seed,
            side_preference: params.side_preference,
            timestamp: now,
        });

        Ok(BootstrapOutcome { market, pool, pool_seed, vault_seed, creator_shares, creator_claims })
    }

    /// Resolve through the registry; only the market's resolver may call
    pub fn resolve_market(&mut self, caller: AccountId, market: MarketId, winning_side: Side) -> CoreResult<()> {
        self.atomically("resolve_market", |engine| {
            let info = engine.registry.market(market)?;
            if info.resolver != caller {
                return Err(CoreError::Unauthorized);
            }
            engine.registry.resolve(market, winning_side)?;
            info!(%market, %winning_side, "market resolved");
            engine.state.events.push(EngineEvent::MarketResolved {
                market,
                winning_side,
                timestamp: engine.clock.unix_timestamp,
            });
            Ok(())
        })
    }

    // ========================================================================
    // Trading
    // ========================================================================

    /// Spend `collateral_in` on `side`
    pub fn buy(
        &mut self,
        trader: AccountId,
        market: MarketId,
        side: Side,
        collateral_in: u128,
        min_shares_out: u128,
        deadline: i64,
    ) -> CoreResult<TradeResult> {
        self.trade(trader, TradeRequest {
            market,
            side,
            direction: TradeDirection::Buy,
            amount: collateral_in,
            min_output: min_shares_out,
            deadline,
        })
    }

    /// Sell `shares_in` of `side` for collateral
    pub fn sell(
        &mut self,
        trader: AccountId,
        market: MarketId,
        side: Side,
        shares_in: u128,
        min_collateral_out: u128,
        deadline: i64,
    ) -> CoreResult<TradeResult> {
        self.trade(trader, TradeRequest {
            market,
            side,
            direction: TradeDirection::Sell,
            amount: shares_in,
            min_output: min_collateral_out,
            deadline,
        })
    }

    pub fn trade(&mut self, trader: AccountId, request: TradeRequest) -> CoreResult<TradeResult> {
        self.atomically("trade", |engine| engine.do_trade(trader, &request))
    }

    fn do_trade(&mut self, trader: AccountId, request: &TradeRequest) -> CoreResult<TradeResult> {
        self.with_market(request.market, |ctx| ctx.route(trader, request))
    }

    // ========================================================================
    // Vault
    // ========================================================================

    pub fn deposit_to_vault(
        &mut self,
        depositor: AccountId,
        market: MarketId,
        side: Side,
        amount: u128,
        deadline: i64,
    ) -> CoreResult<DepositReceipt> {
        self.atomically("deposit_to_vault", |engine| engine.do_deposit(depositor, market, side, amount, deadline))
    }

    fn do_deposit(
        &mut self,
        depositor: AccountId,
        market: MarketId,
        side: Side,
        amount: u128,
        deadline: i64,
    ) -> CoreResult<DepositReceipt> {
        let now = self.clock.unix_timestamp;
        let info = self.registry.market(market)?;
        check_deadline(&info, deadline, now)?;

        let receipt = self.market_state_mut(market)?.vault.deposit(side, amount, depositor, now)?;

        info!(%market, %side, %depositor, amount, shares = receipt.shares, "vault deposit");
        self.state.events.push(EngineEvent::VaultDeposited {
            market,
            side,
            depositor,
            amount,
            shares: receipt.shares,
            timestamp: now,
        });
        Ok(receipt)
    }

    /// Redeem vault shares. Allowed after close; the cooldown still applies.
    pub fn withdraw_from_vault(
        &mut self,
        owner: AccountId,
        market: MarketId,
        side: Side,
        shares: u128,
        deadline: i64,
    ) -> CoreResult<WithdrawReceipt> {
        self.atomically("withdraw_from_vault", |engine| engine.do_withdraw(owner, market, side, shares, deadline))
    }

    fn do_withdraw(
        &mut self,
        owner: AccountId,
        market: MarketId,
        side: Side,
        shares: u128,
        deadline: i64,
    ) -> CoreResult<WithdrawReceipt> {
        let now = self.clock.unix_timestamp;
        self.registry.market(market)?;
        if now > deadline {
            return Err(CoreError::DeadlineExpired);
        }

        let cooldown = self.config.vault.withdraw_cooldown_secs;
        let receipt = self.market_state_mut(market)?.vault.withdraw(side, shares, owner, now, cooldown)?;

        info!(%market, %side, %owner, shares, redeemed = receipt.redeemed, harvested = receipt.harvested, "vault withdrawal");
        self.state.events.push(EngineEvent::VaultWithdrawn {
            market,
            side,
            owner,
            shares,
            redeemed: receipt.redeemed,
            harvested: receipt.harvested,
            timestamp: now,
        });
        Ok(receipt)
    }

    pub fn harvest_vault_fees(&mut self, owner: AccountId, market: MarketId, side: Side) -> CoreResult<u128> {
        self.atomically("harvest_vault_fees", |engine| engine.do_harvest(owner, market, side))
    }

    fn do_harvest(&mut self, owner: AccountId, market: MarketId, side: Side) -> CoreResult<u128> {
        let now = self.clock.unix_timestamp;
        let cooldown = self.config.vault.withdraw_cooldown_secs;
        let amount = self.market_state_mut(market)?.vault.harvest(side, owner, now, cooldown)?;

        if amount > 0 {
            info!(%market, %side, %owner, amount, "fees harvested");
            self.state.events.push(EngineEvent::FeesHarvested { market, side, owner, amount, timestamp: now });
        }
        Ok(amount)
    }

    // ========================================================================
    // Oracle and Fees
    // ========================================================================

    /// Record a TWAP sample if the slot and interval allow. Never fails for a
    /// known market.
    pub fn update_twap_observation(&mut self, market: MarketId) -> CoreResult<bool> {
        self.atomically("update_twap_observation", |engine| {
            engine.with_market(market, |ctx| ctx.observe_twap())
        })
    }

    pub fn reference_price(&self, market: MarketId) -> CoreResult<ReferencePrice> {
        let state = self.market_state(market)?;
        let spot = self.venue.reserves(state.pool)?.price_yes()?;
        state.twap.reference_price(spot, self.config.oracle.max_deviation_bps)
    }

    /// Fee the venue would charge right now
    pub fn current_fee_bps(&self, market: MarketId) -> CoreResult<FeeQuote> {
        let info = self.registry.market(market)?;
        let state = self.market_state(market)?;
        let ctx = FeeContext {
            now: self.clock.unix_timestamp,
            close_time: info.close_time,
            resolved: info.resolved,
            reserves: self.venue.reserves(state.pool)?,
        };
        state.fee_curve.quote(self.state.fees.resolve(market), &ctx)
    }

    /// Install a per-market fee override. Admin only.
    pub fn set_market_fee_config(&mut self, caller: AccountId, market: MarketId, config: FeeConfig) -> CoreResult<()> {
        self.atomically("set_market_fee_config", |engine| {
            engine.ensure_admin(caller)?;
            engine.market_state(market)?;
            engine.state.fees.set_override(market, config)?;
            info!(%market, "fee config override set");
            engine.state.events.push(EngineEvent::FeeConfigUpdated {
                market,
                has_override: true,
                timestamp: engine.clock.unix_timestamp,
            });
            Ok(())
        })
    }

    /// Drop a per-market override. Returns whether one was present.
    pub fn clear_market_fee_config(&mut self, caller: AccountId, market: MarketId) -> CoreResult<bool> {
        self.atomically("clear_market_fee_config", |engine| {
            engine.ensure_admin(caller)?;
            let cleared = engine.state.fees.clear_override(market);
            if cleared {
                engine.state.events.push(EngineEvent::FeeConfigUpdated {
                    market,
                    has_override: false,
                    timestamp: engine.clock.unix_timestamp,
                });
            }
            Ok(cleared)
        })
    }

    fn ensure_admin(&self, caller: AccountId) -> CoreResult<()> {
        if caller != self.admin {
            return Err(CoreError::Unauthorized);
        }
        Ok(())
    }

    // ========================================================================
    // Batching
    // ========================================================================

    /// Run `ops` in order as one atomic request funded with `native_value`.
    /// Unspent value is reported as the refund.
    pub fn multicall(&mut self, caller: AccountId, ops: Vec<Operation>, native_value: u128) -> CoreResult<BatchOutcome> {
        self.atomically("multicall", |engine| {
            let mut payment = PaymentContext::new(native_value);
            let results = engine.run_batch(caller, ops, &mut payment)?;
            Ok(BatchOutcome {
                results,
                native_spent: payment.spent,
                native_refund: payment.refund(),
            })
        })
    }

    /// Single operation with native payment checks
    pub fn execute(&mut self, caller: AccountId, op: Operation, native_value: u128) -> CoreResult<(OperationResult, u128)> {
        let mut outcome = self.multicall(caller, vec![op], native_value)?;
        let result = outcome.results.pop().ok_or(CoreError::InvalidParameter("empty batch result"))?;
        Ok((result, outcome.native_refund))
    }

    fn run_batch(&mut self, caller: AccountId, ops: Vec<Operation>, payment: &mut PaymentContext) -> CoreResult<Vec<OperationResult>> {
        let mut results = Vec::with_capacity(ops.len());
        for op in ops {
            results.push(self.apply(caller, op, payment)?);
        }
        Ok(results)
    }

    fn apply(&mut self, caller: AccountId, op: Operation, payment: &mut PaymentContext) -> CoreResult<OperationResult> {
        Ok(match op {
            Operation::BootstrapMarket(params) => {
                payment.charge(params.collateral, params.initial_collateral)?;
                OperationResult::Bootstrapped(self.do_bootstrap(caller, &params)?)
            }
            Operation::Buy { market, side, collateral_in, min_shares_out, deadline } => {
                let collateral = self.registry.market(market)?.collateral;
                payment.charge(collateral, collateral_in)?;
                let request = TradeRequest {
                    market,
                    side,
                    direction: TradeDirection::Buy,
                    amount: collateral_in,
                    min_output: min_shares_out,
                    deadline,
                };
                OperationResult::Traded(self.do_trade(caller, &request)?)
            }
            Operation::Sell { market, side, shares_in, min_collateral_out, deadline } => {
                let request = TradeRequest {
                    market,
                    side,
                    direction: TradeDirection::Sell,
                    amount: shares_in,
                    min_output: min_collateral_out,
                    deadline,
                };
                OperationResult::Traded(self.do_trade(caller, &request)?)
            }
            Operation::DepositToVault { market, side, amount, deadline } => {
                OperationResult::Deposited(self.do_deposit(caller, market, side, amount, deadline)?)
            }
            Operation::WithdrawFromVault { market, side, shares, deadline } => {
                OperationResult::Withdrawn(self.do_withdraw(caller, market, side, shares, deadline)?)
            }
            Operation::HarvestVaultFees { market, side } => {
                OperationResult::Harvested(self.do_harvest(caller, market, side)?)
            }
            Operation::UpdateTwapObservation { market } => {
                OperationResult::TwapUpdated(self.with_market(market, |ctx| ctx.observe_twap())?)
            }
            Operation::Multicall(nested) => OperationResult::Batch(self.run_batch(caller, nested, payment)?),
        })
    }
}
