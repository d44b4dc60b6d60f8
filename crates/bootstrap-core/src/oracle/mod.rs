//! # Oracle Module
//!
//! Time-weighted reference price for OTC pricing.

pub mod twap;

pub use twap::*;
