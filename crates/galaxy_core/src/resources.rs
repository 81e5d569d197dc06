//! Resource amounts and the helpers every other module uses to move them.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Resource quantities held by a planet, carried by a fleet, or charged as a
/// cost.
///
/// `energy` is an instantaneous balance and is never stored or capped; the
/// four materials are clamped to planet capacity by the resource engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Basic mineral.
    pub metal: f64,
    /// Basic mineral.
    pub crystal: f64,
    /// Refined fuel.
    pub deuterium: f64,
    /// Rare matter.
    pub dark_matter: f64,
    /// Energy balance.
    pub energy: f64,
}

impl Resources {
    /// No resources.
    pub const ZERO: Self = Self {
        metal: 0.0,
        crystal: 0.0,
        deuterium: 0.0,
        dark_matter: 0.0,
        energy: 0.0,
    };

    /// Create an amount of the four materials with zero energy.
    #[must_use]
    pub const fn new(metal: f64, crystal: f64, deuterium: f64, dark_matter: f64) -> Self {
        Self {
            metal,
            crystal,
            deuterium,
            dark_matter,
            energy: 0.0,
        }
    }

    /// Sum of the four materials.
    #[must_use]
    pub fn total_materials(&self) -> f64 {
        self.metal + self.crystal + self.deuterium + self.dark_matter
    }

    /// Multiply the four materials by `factor`, leaving energy untouched.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            metal: self.metal * factor,
            crystal: self.crystal * factor,
            deuterium: self.deuterium * factor,
            dark_matter: self.dark_matter * factor,
            energy: self.energy,
        }
    }

    /// Clamp each material into `[0, capacity]`.
    pub fn clamp_to(&mut self, capacity: &Self) {
        self.metal = self.metal.clamp(0.0, capacity.metal.max(0.0));
        self.crystal = self.crystal.clamp(0.0, capacity.crystal.max(0.0));
        self.deuterium = self.deuterium.clamp(0.0, capacity.deuterium.max(0.0));
        self.dark_matter = self.dark_matter.clamp(0.0, capacity.dark_matter.max(0.0));
    }

    /// Subtract `amount` from each material, flooring at zero.
    pub fn saturating_sub(&mut self, amount: &Self) {
        self.metal = (self.metal - amount.metal).max(0.0);
        self.crystal = (self.crystal - amount.crystal).max(0.0);
        self.deuterium = (self.deuterium - amount.deuterium).max(0.0);
        self.dark_matter = (self.dark_matter - amount.dark_matter).max(0.0);
    }

    /// True if any material is negative.
    #[must_use]
    pub fn has_negative(&self) -> bool {
        self.metal < 0.0 || self.crystal < 0.0 || self.deuterium < 0.0 || self.dark_matter < 0.0
    }

    /// Check availability and return a descriptive error for the first
    /// material that falls short.
    pub fn ensure_available(&self, cost: &Self) -> Result<()> {
        let pairs = [
            ("metal", self.metal, cost.metal),
            ("crystal", self.crystal, cost.crystal),
            ("deuterium", self.deuterium, cost.deuterium),
            ("dark_matter", self.dark_matter, cost.dark_matter),
        ];
        for (resource, available, required) in pairs {
            if available < required {
                return Err(GameError::InsufficientResources {
                    resource: resource.to_string(),
                    required,
                    available,
                });
            }
        }
        Ok(())
    }
}

impl Add for Resources {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            metal: self.metal + rhs.metal,
            crystal: self.crystal + rhs.crystal,
            deuterium: self.deuterium + rhs.deuterium,
            dark_matter: self.dark_matter + rhs.dark_matter,
            energy: self.energy + rhs.energy,
        }
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Pure `>=` comparison over the four materials. Energy is ignored.
#[must_use]
pub fn check_resources_available(current: &Resources, cost: &Resources) -> bool {
    current.metal >= cost.metal
        && current.crystal >= cost.crystal
        && current.deuterium >= cost.deuterium
        && current.dark_matter >= cost.dark_matter
}

/// Subtract `cost` from the four materials.
///
/// Callers must have checked [`check_resources_available`] first.
pub fn deduct_resources(current: &mut Resources, cost: &Resources) {
    current.metal -= cost.metal;
    current.crystal -= cost.crystal;
    current.deuterium -= cost.deuterium;
    current.dark_matter -= cost.dark_matter;
}

/// Add `amount` to the four materials.
pub fn add_resources(current: &mut Resources, amount: &Resources) {
    current.metal += amount.metal;
    current.crystal += amount.crystal;
    current.deuterium += amount.deuterium;
    current.dark_matter += amount.dark_matter;
}
