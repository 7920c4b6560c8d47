//! Memoization of expensive derived attributes.
//!
//! - `attribute`: cache keys, durability tiers and the `Attribute` contract
//! - `store`: the concurrent per-owner cache itself

pub mod attribute;
pub mod store;

pub use attribute::*;
pub use store::*;
