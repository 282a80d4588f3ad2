//! Explicit host context passed into preparing and updating performances.
//!
//! Holds the numeric stat handles (speed multipliers, resources), the condition flags
//! external systems raise (e.g. `"grounded"`), and the id allocator for performances.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::ids::{IdAllocator, PerformanceId};

/// Numeric stat handle. `value()` is what gates and multipliers read; costs are deducted
/// from `base_value` and may drive it negative.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub base_value: f32,
    #[serde(default)]
    pub modifier: f32,
}

impl Stat {
    pub fn new(base_value: f32) -> Self {
        Self {
            base_value,
            modifier: 0.0,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.base_value + self.modifier
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    inner: HashMap<String, Stat>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: impl Into<String>, stat: Stat) -> Option<Stat> {
        self.inner.insert(id.into(), stat)
    }

    pub fn get(&self, id: &str) -> Option<&Stat> {
        self.inner.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Stat> {
        self.inner.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Stat> {
        self.inner.remove(id)
    }

    /// Current value of the stat, or `default` when it is not present.
    #[inline]
    pub fn value_or(&self, id: &str, default: f32) -> f32 {
        self.inner.get(id).map(Stat::value).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct World {
    pub stats: Stats,
    pub conditions: HashSet<String>,
    ids: IdAllocator,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stat(mut self, id: impl Into<String>, base_value: f32) -> Self {
        self.stats.set(id, Stat::new(base_value));
        self
    }

    pub fn with_condition(mut self, flag: impl Into<String>) -> Self {
        self.conditions.insert(flag.into());
        self
    }

    pub fn set_condition(&mut self, flag: &str, on: bool) {
        if on {
            self.conditions.insert(flag.to_string());
        } else {
            self.conditions.remove(flag);
        }
    }

    #[inline]
    pub fn has_condition(&self, flag: &str) -> bool {
        self.conditions.contains(flag)
    }

    /// Allocate a fresh id for a new performance. Shared by every performer that prepares
    /// against this world so nested performers never collide.
    #[inline]
    pub fn alloc_performance(&mut self) -> PerformanceId {
        self.ids.alloc_performance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_stats_fall_back_to_default() {
        let world = World::new().with_stat("Stamina", 3.0);
        assert_eq!(world.stats.value_or("Stamina", 1.0), 3.0);
        assert_eq!(world.stats.value_or("ChargeSpeed", 1.0), 1.0);
    }

    #[test]
    fn value_includes_modifier() {
        let mut stats = Stats::new();
        stats.set("Stamina", Stat { base_value: 2.0, modifier: -2.5 });
        assert_eq!(stats.value_or("Stamina", 0.0), -0.5);
    }

    #[test]
    fn condition_flags_toggle() {
        let mut world = World::new().with_condition("grounded");
        assert!(world.has_condition("grounded"));
        world.set_condition("grounded", false);
        assert!(!world.has_condition("grounded"));
    }
}
