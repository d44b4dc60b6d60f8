//! # Fee Module
//!
//! Fee configuration, the dynamic fee curve and its price history.

pub mod config;
pub mod curve;
pub mod history;

pub use config::*;
pub use curve::*;
pub use history::*;
