//! Engine-owned per-market state

use crate::events::EngineEvent;
use crate::fees::{FeeConfigStore, FeeCurve};
use crate::oracle::TwapObservation;
use crate::types::{MarketId, PoolId};
use crate::vault::BootstrapVault;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketState {
    pub pool: PoolId,
    pub twap: TwapObservation,
    pub fee_curve: FeeCurve,
    pub vault: BootstrapVault,
}

/// Everything restored when a request rolls back
#[derive(Debug, Clone)]
pub struct EngineState {
    pub markets: BTreeMap<MarketId, MarketState>,
    pub fees: FeeConfigStore,
    pub events: Vec<EngineEvent>,
}

impl EngineState {
    pub fn new(fees: FeeConfigStore) -> Self {
        Self { markets: BTreeMap::new(), fees, events: Vec::new() }
    }
}
