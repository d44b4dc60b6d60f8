//! # Bootstrap Core - Claim Market Liquidity Engine
//!
//! Liquidity bootstrapping and order routing for binary YES/NO claim
//! markets. It provides:
//!
//! - A dual-sided bootstrap vault that fills scarce-side trades OTC
//! - A TWAP oracle over the external pool price
//! - A dynamic fee curve with bootstrap decay, skew and close-window modes
//! - A per-share fee accumulator for vault depositors
//! - A router that splits trades across the vault, the external pool and
//!   a mint fallback
//!
//! ## Feature Flags
//!
//! - `anchor`: Enables Anchor serialization and error conversion for on-chain use

pub mod collaborators;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod oracle;
pub mod router;
pub mod state;
pub mod types;
pub mod vault;

pub use config::EngineConfig;
pub use constants::*;
pub use engine::{BatchOutcome, BootstrapOutcome, BootstrapParams, Engine, Operation, OperationResult};
pub use errors::{CoreError, CoreResult};
pub use events::EngineEvent;
pub use router::{FillSource, TradeRequest, TradeResult};
pub use types::*;
