//! Resource kinds and amount bags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Grain,
    Gold,
    Wood,
    Stone,
    Iron,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Grain,
        Resource::Gold,
        Resource::Wood,
        Resource::Stone,
        Resource::Iron,
    ];
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Grain => "grain",
            Resource::Gold => "gold",
            Resource::Wood => "wood",
            Resource::Stone => "stone",
            Resource::Iron => "iron",
        };
        f.write_str(name)
    }
}

/// Signed amounts per resource. Absent entries read as zero.
///
/// Used both for costs and upkeep in reference data and for a player's
/// stored pool; a pool is kept non-negative by [`ResourceBag::clamp_non_negative`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceBag(BTreeMap<Resource, i64>);

impl ResourceBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, resource: Resource, amount: i64) -> Self {
        self.set(resource, amount);
        self
    }

    #[inline]
    pub fn get(&self, resource: Resource) -> i64 {
        self.0.get(&resource).copied().unwrap_or(0)
    }

    pub fn set(&mut self, resource: Resource, amount: i64) {
        self.0.insert(resource, amount);
    }

    pub fn add(&mut self, resource: Resource, amount: i64) {
        *self.0.entry(resource).or_insert(0) += amount;
    }

    /// Add every entry of `other` onto this bag.
    pub fn add_all(&mut self, other: &ResourceBag) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    /// Subtract every entry of `other` from this bag.
    pub fn subtract_all(&mut self, other: &ResourceBag) {
        for (resource, amount) in other.iter() {
            self.add(resource, -amount);
        }
    }

    /// True if every entry in `cost` is covered by this bag.
    pub fn can_afford(&self, cost: &ResourceBag) -> bool {
        cost.iter().all(|(resource, amount)| self.get(resource) >= amount)
    }

    /// Raise every negative entry to zero.
    pub fn clamp_non_negative(&mut self) {
        for amount in self.0.values_mut() {
            if *amount < 0 {
                *amount = 0;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, i64)> + '_ {
        self.0.iter().map(|(&r, &a)| (r, a))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|&a| a == 0)
    }
}

impl FromIterator<(Resource, i64)> for ResourceBag {
    fn from_iter<T: IntoIterator<Item = (Resource, i64)>>(iter: T) -> Self {
        let mut bag = ResourceBag::new();
        for (resource, amount) in iter {
            bag.add(resource, amount);
        }
        bag
    }
}
