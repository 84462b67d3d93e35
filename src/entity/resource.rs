//! Resource nodes agents collect energy from
//!
//! A resource depletes as agents collect from it and slowly regrows.
//! Resources are never removed from the world.

use crate::core::types::{ResourceId, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub position: Vec2,
    /// Always within `[0, max_amount]`
    pub amount: f64,
    pub max_amount: f64,
}

impl Resource {
    /// Create a resource starting half full
    pub fn new(id: ResourceId, position: Vec2, max_amount: f64) -> Self {
        Self {
            id,
            position,
            amount: max_amount / 2.0,
            max_amount,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount.clamp(0.0, self.max_amount);
        self
    }

    pub fn is_depleted(&self) -> bool {
        self.amount <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.amount >= self.max_amount
    }

    /// Take up to `amount`, returns what was actually taken
    pub fn collect(&mut self, amount: f64) -> f64 {
        let taken = amount.min(self.amount).max(0.0);
        self.amount -= taken;
        taken
    }

    /// Grow back by `amount`, staying within `[0, max_amount]`
    pub fn regrow(&mut self, amount: f64) {
        self.amount = (self.amount + amount).clamp(0.0, self.max_amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> Resource {
        Resource::new(ResourceId::new("res_0"), Vec2::new(0.0, 0.0), 100.0)
    }

    #[test]
    fn test_resource_starts_half_full() {
        let r = resource();
        assert_eq!(r.amount, 50.0);
        assert!(!r.is_depleted());
        assert!(!r.is_full());
    }

    #[test]
    fn test_collect_cannot_go_negative() {
        let mut r = resource().with_amount(0.5);
        let taken = r.collect(1.0);
        assert!((taken - 0.5).abs() < 1e-6);
        assert!(r.is_depleted());
        assert_eq!(r.collect(1.0), 0.0);
    }

    #[test]
    fn test_regrow_caps_at_max() {
        let mut r = resource().with_amount(99.5);
        r.regrow(1.0);
        assert_eq!(r.amount, 100.0);
        assert!(r.is_full());
    }

    #[test]
    fn test_with_amount_clamps() {
        assert_eq!(resource().with_amount(250.0).amount, 100.0);
        assert_eq!(resource().with_amount(-3.0).amount, 0.0);
    }
}
