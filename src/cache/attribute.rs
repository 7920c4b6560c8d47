//! Attribute identities, durability tiers and the `Attribute` contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::AttributeCache;
use crate::error::Result;

/// Retention policy of a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    /// Kept for the owner's lifetime and included in persistence snapshots.
    Permanent,
    /// Kept until [`AttributeCache::evict_temporary`] drops it.
    Temporary,
    /// Never stored; every query recomputes.
    Never,
}

const X_TIME_BIT: u32 = 0b01;
const Y_TIME_BIT: u32 = 0b10;
const CLASS_SHIFT: u32 = 2;

/// Cache key: a dimension pair plus a discriminator.
///
/// The discriminator packs `is_x_time`, `is_y_time` and a numeric class id.
/// Two attributes of different Rust types that are built with the same class
/// id compare equal and therefore share one cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeIdentity {
    dim_x: usize,
    dim_y: usize,
    discriminator: u32,
}

impl AttributeIdentity {
    pub fn new(dim_x: usize, dim_y: usize, is_x_time: bool, is_y_time: bool, class_id: u16) -> Self {
        let mut discriminator = u32::from(class_id) << CLASS_SHIFT;
        if is_x_time {
            discriminator |= X_TIME_BIT;
        }
        if is_y_time {
            discriminator |= Y_TIME_BIT;
        }
        Self {
            dim_x,
            dim_y,
            discriminator,
        }
    }

    /// Rebuild an identity from its stored components (persistence).
    pub fn from_parts(dim_x: usize, dim_y: usize, discriminator: u32) -> Self {
        Self {
            dim_x,
            dim_y,
            discriminator,
        }
    }

    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    pub fn dim_y(&self) -> usize {
        self.dim_y
    }

    pub fn discriminator(&self) -> u32 {
        self.discriminator
    }

    pub fn is_x_time(&self) -> bool {
        self.discriminator & X_TIME_BIT != 0
    }

    pub fn is_y_time(&self) -> bool {
        self.discriminator & Y_TIME_BIT != 0
    }

    pub fn class_id(&self) -> u16 {
        // Built from a u16, so the shifted value always fits.
        (self.discriminator >> CLASS_SHIFT) as u16
    }
}

impl fmt::Display for AttributeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class {} (dim {} -> dim {}, x_time={}, y_time={})",
            self.class_id(),
            self.dim_x,
            self.dim_y,
            self.is_x_time(),
            self.is_y_time()
        )
    }
}

/// Outcome of an attribute computation.
///
/// `Absent` is the explicit "no value" answer; the cache never stores it and
/// reports it as [`crate::error::FitError::MissingValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum Computed<T> {
    Present(T),
    Absent,
}

impl<T> From<Option<T>> for Computed<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Computed::Present(v),
            None => Computed::Absent,
        }
    }
}

/// A derived value of an owner object that is worth caching.
pub trait Attribute<O: ?Sized> {
    type Value: Send + Sync + 'static;

    fn identity(&self) -> AttributeIdentity;

    fn durability(&self) -> Durability;

    /// Compute the value from scratch. Called at most once per stored entry.
    ///
    /// Must not query the same identity on the same cache (the slot is held
    /// while computing).
    fn compute(&self, owner: &O) -> Result<Computed<Self::Value>>;
}

/// An object that carries its own attribute cache.
pub trait CacheOwner {
    fn attribute_cache(&self) -> &AttributeCache;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminator_packs_flags_and_class() {
        let id = AttributeIdentity::new(0, 3, true, false, 7);
        assert!(id.is_x_time());
        assert!(!id.is_y_time());
        assert_eq!(id.class_id(), 7);
        assert_eq!(id.dim_y(), 3);
        assert_eq!(AttributeIdentity::from_parts(0, 3, id.discriminator()), id);
    }

    #[test]
    fn identities_differ_by_any_component() {
        let base = AttributeIdentity::new(0, 1, true, false, 1);
        assert_ne!(base, AttributeIdentity::new(1, 1, true, false, 1));
        assert_ne!(base, AttributeIdentity::new(0, 1, true, true, 1));
        assert_ne!(base, AttributeIdentity::new(0, 1, true, false, 2));
        assert_eq!(base, AttributeIdentity::new(0, 1, true, false, 1));
    }
}
