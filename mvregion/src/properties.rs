//! Named, live-mutable properties.

use crate::error::Error;
use anyhow::Result;
use std::ops::{Deref, DerefMut};

/// Object with custom properties.
pub trait Properties {
    /// Get available properties along with their current values.
    fn props(&self) -> Vec<(&'static str, Property)>;

    /// Update a property by name.
    ///
    /// Returns `Ok(false)` if the value was valid in kind, but rejected by the object.
    fn set_prop(&mut self, name: &str, prop: &Property) -> Result<bool>;

    /// Get a single property by name.
    fn prop(&self, name: &str) -> Option<Property> {
        self.props()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| p)
    }

    /// Parse a textual value into the kind of the named property and set it.
    fn set_prop_str(&mut self, name: &str, value: &str) -> Result<bool> {
        let prop = self
            .prop(name)
            .ok_or_else(|| Error::UnknownProperty(name.into()))?
            .parse_like(value)?;
        self.set_prop(name, &prop)
    }
}

/// Property with a lower and upper bound.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct BoundedProp<T> {
    pub val: T,
    pub min: T,
    pub max: T,
}

impl<T> Deref for BoundedProp<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.val
    }
}

impl<T> DerefMut for BoundedProp<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.val
    }
}

impl<T: PartialOrd> BoundedProp<T> {
    /// Check whether the value is within the bounds.
    pub fn in_bounds(&self) -> bool {
        self.val >= self.min && self.val <= self.max
    }
}

/// Describes the type of a property.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Property {
    Bool(bool),
    Usize(BoundedProp<usize>),
}

impl Property {
    /// Create an integer property.
    ///
    /// # Arguments
    ///
    /// * `val` - current value.
    /// * `min` - lowest value for the property.
    /// * `max` - highest value for the property.
    pub fn usize(val: usize, min: usize, max: usize) -> Self {
        Self::Usize(BoundedProp { val, min, max })
    }

    /// Parse `value` into a property of the same kind as `self`, keeping the bounds.
    pub fn parse_like(&self, value: &str) -> Result<Self> {
        Ok(match self {
            Self::Bool(_) => Self::Bool(value.trim().parse()?),
            Self::Usize(p) => Self::Usize(BoundedProp {
                val: value.trim().parse()?,
                ..*p
            }),
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Self::Usize(p) => Some(p.val),
            _ => None,
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Usize(p) => write!(f, "{} [{}..={}]", p.val, p.min, p.max),
        }
    }
}
