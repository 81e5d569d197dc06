//! Building data structures and the standard building table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::Resources;
use crate::units::{BuildingLevels, BuildingType, Kind, TechLevels, TechnologyType};

/// A prerequisite: a building or technology that must reach a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Building level on the same planet.
    Building(BuildingType),
    /// Technology level of the owning player.
    Technology(TechnologyType),
}

/// Minimum levels keyed by prerequisite.
pub type Requirements = BTreeMap<Requirement, u32>;

/// First unmet prerequisite, as `(requirement, needed, have)`.
#[must_use]
pub fn first_unmet(
    requirements: &Requirements,
    buildings: &BuildingLevels,
    technologies: &TechLevels,
) -> Option<(Requirement, u32, u32)> {
    requirements.iter().find_map(|(&req, &needed)| {
        let have = match req {
            Requirement::Building(b) => buildings.get(b),
            Requirement::Technology(t) => technologies.get(t),
        };
        (have < needed).then_some((req, needed, have))
    })
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Building(b) => f.write_str(b.name()),
            Self::Technology(t) => f.write_str(t.name()),
        }
    }
}

/// Data-driven building definition.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     base_cost: (metal: 60.0, crystal: 15.0, deuterium: 0.0, dark_matter: 0.0, energy: 0.0),
///     base_time: 15,
///     cost_multiplier: 1.5,
///     space_usage: 3,
///     planet_only: true,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Cost of the first level.
    pub base_cost: Resources,

    /// Construction time of the first level, in seconds.
    pub base_time: u32,

    /// Cost and time growth per level.
    pub cost_multiplier: f64,

    /// Planet fields occupied per level.
    pub space_usage: u32,

    /// Cannot be built on moons.
    #[serde(default)]
    pub planet_only: bool,

    /// Can only be built on moons.
    #[serde(default)]
    pub moon_only: bool,

    /// Prerequisites.
    #[serde(default)]
    pub requirements: Requirements,
}

impl BuildingData {
    fn new(base_cost: Resources, base_time: u32, cost_multiplier: f64, space_usage: u32) -> Self {
        Self {
            base_cost,
            base_time,
            cost_multiplier,
            space_usage,
            planet_only: false,
            moon_only: false,
            requirements: Requirements::new(),
        }
    }

    fn planet_only(mut self) -> Self {
        self.planet_only = true;
        self
    }

    fn moon_only(mut self) -> Self {
        self.moon_only = true;
        self
    }

    fn requires(mut self, req: Requirement, level: u32) -> Self {
        self.requirements.insert(req, level);
        self
    }

    /// Cost of upgrading from `current_level` to the next level.
    #[must_use]
    pub fn upgrade_cost(&self, current_level: u32) -> Resources {
        self.base_cost
            .scale(self.cost_multiplier.powi(current_level as i32))
    }

    /// Base construction seconds for upgrading from `current_level`.
    #[must_use]
    pub fn upgrade_time(&self, current_level: u32) -> f64 {
        f64::from(self.base_time) * self.cost_multiplier.powi(current_level as i32)
    }
}

/// The standard building table.
#[must_use]
pub fn standard_buildings() -> BTreeMap<BuildingType, BuildingData> {
    use BuildingType as B;

    let cost = Resources::new;
    BTreeMap::from([
        (
            B::MetalMine,
            BuildingData::new(cost(60.0, 15.0, 0.0, 0.0), 15, 1.5, 3).planet_only(),
        ),
        (
            B::CrystalMine,
            BuildingData::new(cost(48.0, 24.0, 0.0, 0.0), 15, 1.6, 3).planet_only(),
        ),
        (
            B::DeuteriumSynthesizer,
            BuildingData::new(cost(225.0, 75.0, 0.0, 0.0), 20, 1.5, 4).planet_only(),
        ),
        (
            B::SolarPlant,
            BuildingData::new(cost(75.0, 30.0, 0.0, 0.0), 15, 1.5, 5),
        ),
        (
            B::RoboticsFactory,
            BuildingData::new(cost(400.0, 120.0, 200.0, 0.0), 40, 2.0, 6),
        ),
        (
            B::NaniteFactory,
            BuildingData::new(cost(1_000_000.0, 500_000.0, 100_000.0, 0.0), 240, 2.0, 15)
                .requires(Requirement::Building(B::RoboticsFactory), 10),
        ),
        (
            B::Shipyard,
            BuildingData::new(cost(400.0, 200.0, 100.0, 0.0), 30, 2.0, 8),
        ),
        (
            B::ResearchLab,
            BuildingData::new(cost(200.0, 400.0, 200.0, 0.0), 30, 2.0, 5),
        ),
        (
            B::MetalStorage,
            BuildingData::new(cost(1000.0, 0.0, 0.0, 0.0), 15, 2.0, 2),
        ),
        (
            B::CrystalStorage,
            BuildingData::new(cost(1000.0, 500.0, 0.0, 0.0), 15, 2.0, 2),
        ),
        (
            B::DeuteriumTank,
            BuildingData::new(cost(1000.0, 1000.0, 0.0, 0.0), 15, 2.0, 2),
        ),
        (
            B::DarkMatterCollector,
            BuildingData::new(cost(50_000.0, 100_000.0, 50_000.0, 0.0), 90, 2.0, 10)
                .planet_only(),
        ),
        (
            B::LunarBase,
            BuildingData::new(cost(20_000.0, 40_000.0, 20_000.0, 0.0), 45, 2.0, 0).moon_only(),
        ),
        (
            B::SensorPhalanx,
            BuildingData::new(cost(20_000.0, 40_000.0, 20_000.0, 0.0), 60, 2.0, 10).moon_only(),
        ),
        (
            B::JumpGate,
            BuildingData::new(cost(2_000_000.0, 4_000_000.0, 2_000_000.0, 0.0), 240, 2.0, 20)
                .moon_only(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_cost_grows_geometrically() {
        let table = standard_buildings();
        let mine = &table[&BuildingType::MetalMine];

        assert_eq!(mine.upgrade_cost(0), Resources::new(60.0, 15.0, 0.0, 0.0));
        // 60 * 1.5^2 = 135
        assert!((mine.upgrade_cost(2).metal - 135.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_unmet_requirement() {
        let table = standard_buildings();
        let nanite = &table[&BuildingType::NaniteFactory];

        let mut buildings = BuildingLevels::new();
        buildings.set(BuildingType::RoboticsFactory, 9);
        let techs = TechLevels::new();

        assert_eq!(
            first_unmet(&nanite.requirements, &buildings, &techs),
            Some((Requirement::Building(BuildingType::RoboticsFactory), 10, 9))
        );

        buildings.set(BuildingType::RoboticsFactory, 10);
        assert_eq!(first_unmet(&nanite.requirements, &buildings, &techs), None);
    }

    #[test]
    fn test_table_covers_every_building() {
        let table = standard_buildings();
        for kind in BuildingType::ALL {
            assert!(table.contains_key(kind), "missing {kind}");
        }
    }
}
