//! Technology data structures and the standard research table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::building_data::{Requirement, Requirements};
use crate::resources::Resources;
use crate::units::{BuildingType, TechnologyType};

/// Data-driven technology definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechData {
    /// Cost of the first level.
    pub base_cost: Resources,

    /// Research time of the first level, in seconds.
    pub base_time: u32,

    /// Cost and time growth per level.
    pub cost_multiplier: f64,

    /// Prerequisites.
    #[serde(default)]
    pub requirements: Requirements,
}

impl TechData {
    /// Cost of researching the level after `current_level`.
    #[must_use]
    pub fn research_cost(&self, current_level: u32) -> Resources {
        self.base_cost
            .scale(self.cost_multiplier.powi(current_level as i32))
    }

    /// Base research seconds for the level after `current_level`.
    #[must_use]
    pub fn research_time(&self, current_level: u32) -> f64 {
        f64::from(self.base_time) * self.cost_multiplier.powi(current_level as i32)
    }
}

/// The standard technology table.
#[must_use]
pub fn standard_technologies() -> BTreeMap<TechnologyType, TechData> {
    use Requirement::{Building, Technology};
    use TechnologyType as T;

    let tech = |metal, crystal, deuterium, base_time, reqs: &[(Requirement, u32)]| TechData {
        base_cost: Resources::new(metal, crystal, deuterium, 0.0),
        base_time,
        cost_multiplier: 2.0,
        requirements: reqs.iter().copied().collect(),
    };
    let lab = Building(BuildingType::ResearchLab);

    BTreeMap::from([
        (T::Energy, tech(0.0, 800.0, 400.0, 30, &[(lab, 1)])),
        (
            T::Laser,
            tech(200.0, 100.0, 0.0, 60, &[(lab, 1), (Technology(T::Energy), 2)]),
        ),
        (
            T::Ion,
            tech(
                1000.0,
                300.0,
                100.0,
                60,
                &[
                    (lab, 4),
                    (Technology(T::Laser), 5),
                    (Technology(T::Energy), 4),
                ],
            ),
        ),
        (
            T::Hyperspace,
            tech(0.0, 4000.0, 2000.0, 60, &[(lab, 7), (Technology(T::Energy), 5)]),
        ),
        (
            T::Plasma,
            tech(
                2000.0,
                4000.0,
                1000.0,
                60,
                &[
                    (lab, 4),
                    (Technology(T::Energy), 8),
                    (Technology(T::Laser), 10),
                    (Technology(T::Ion), 5),
                ],
            ),
        ),
        (T::Computer, tech(0.0, 400.0, 600.0, 60, &[(lab, 1)])),
        (
            T::CombustionDrive,
            tech(400.0, 0.0, 600.0, 60, &[(lab, 1), (Technology(T::Energy), 1)]),
        ),
        (
            T::ImpulseDrive,
            tech(2000.0, 4000.0, 600.0, 60, &[(lab, 2), (Technology(T::Energy), 1)]),
        ),
        (
            T::HyperspaceDrive,
            tech(
                10_000.0,
                20_000.0,
                6000.0,
                60,
                &[(lab, 7), (Technology(T::Hyperspace), 3)],
            ),
        ),
        (
            T::DarkMatter,
            tech(
                100_000.0,
                200_000.0,
                100_000.0,
                180,
                &[(lab, 8), (Technology(T::Hyperspace), 5)],
            ),
        ),
    ])
}
