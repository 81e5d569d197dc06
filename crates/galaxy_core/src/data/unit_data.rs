//! Ship and defense data structures and their standard tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::building_data::{Requirement, Requirements};
use crate::resources::Resources;
use crate::units::{BuildingType, DefenseType, ShipType, TechnologyType};

/// Combat statistics shared by ships and defenses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Damage dealt per round by one unit.
    pub attack: f64,
    /// Shield contributed to the side's pool by one unit.
    pub shield: f64,
    /// Structural points of one unit.
    pub armor: f64,
}

/// Data-driven ship definition.
///
/// # Example RON
///
/// ```ron
/// ShipData(
///     cost: (metal: 3000.0, crystal: 1000.0, deuterium: 0.0, dark_matter: 0.0, energy: 0.0),
///     build_time: 20,
///     cargo_capacity: 50.0,
///     combat: (attack: 50.0, shield: 10.0, armor: 400.0),
///     speed: 12500.0,
///     fuel_consumption: 20.0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipData {
    /// Build cost of one ship.
    pub cost: Resources,

    /// Build time of one ship, in seconds.
    pub build_time: u32,

    /// Cargo hold of one ship.
    pub cargo_capacity: f64,

    /// Combat statistics.
    pub combat: CombatStats,

    /// Flight speed.
    pub speed: f64,

    /// Deuterium burned per flight.
    pub fuel_consumption: f64,

    /// Prerequisites.
    #[serde(default)]
    pub requirements: Requirements,
}

/// Data-driven defense structure definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseData {
    /// Build cost of one structure.
    pub cost: Resources,

    /// Build time of one structure, in seconds.
    pub build_time: u32,

    /// Combat statistics.
    pub combat: CombatStats,

    /// Prerequisites.
    #[serde(default)]
    pub requirements: Requirements,
}

fn stats(attack: f64, shield: f64, armor: f64) -> CombatStats {
    CombatStats {
        attack,
        shield,
        armor,
    }
}

fn reqs(entries: &[(Requirement, u32)]) -> Requirements {
    entries.iter().copied().collect()
}

/// The standard ship table.
#[must_use]
pub fn standard_ships() -> BTreeMap<ShipType, ShipData> {
    use Requirement::{Building, Technology};
    use ShipType as S;
    use TechnologyType as T;

    let yard = Building(BuildingType::Shipyard);
    let ship = |cost: (f64, f64, f64),
                build_time,
                cargo_capacity,
                combat,
                speed,
                fuel_consumption,
                requirements| ShipData {
        cost: Resources::new(cost.0, cost.1, cost.2, 0.0),
        build_time,
        cargo_capacity,
        combat,
        speed,
        fuel_consumption,
        requirements,
    };

    BTreeMap::from([
        (
            S::LightFighter,
            ship(
                (3000.0, 1000.0, 0.0),
                20,
                50.0,
                stats(50.0, 10.0, 400.0),
                12_500.0,
                20.0,
                reqs(&[(yard, 1), (Technology(T::CombustionDrive), 1)]),
            ),
        ),
        (
            S::HeavyFighter,
            ship(
                (6000.0, 4000.0, 0.0),
                30,
                100.0,
                stats(150.0, 25.0, 1000.0),
                10_000.0,
                75.0,
                reqs(&[(yard, 3), (Technology(T::ImpulseDrive), 2)]),
            ),
        ),
        (
            S::Cruiser,
            ship(
                (20_000.0, 7000.0, 2000.0),
                60,
                800.0,
                stats(400.0, 50.0, 2700.0),
                15_000.0,
                300.0,
                reqs(&[
                    (yard, 5),
                    (Technology(T::ImpulseDrive), 4),
                    (Technology(T::Ion), 2),
                ]),
            ),
        ),
        (
            S::Battleship,
            ship(
                (45_000.0, 15_000.0, 0.0),
                90,
                1500.0,
                stats(1000.0, 200.0, 6000.0),
                10_000.0,
                500.0,
                reqs(&[(yard, 7), (Technology(T::HyperspaceDrive), 4)]),
            ),
        ),
        (
            S::SmallCargo,
            ship(
                (2000.0, 2000.0, 0.0),
                15,
                5000.0,
                stats(5.0, 10.0, 400.0),
                5000.0,
                10.0,
                reqs(&[(yard, 2), (Technology(T::CombustionDrive), 2)]),
            ),
        ),
        (
            S::LargeCargo,
            ship(
                (6000.0, 6000.0, 0.0),
                30,
                25_000.0,
                stats(5.0, 25.0, 1200.0),
                7500.0,
                50.0,
                reqs(&[(yard, 4), (Technology(T::CombustionDrive), 6)]),
            ),
        ),
        (
            S::ColonyShip,
            ship(
                (10_000.0, 20_000.0, 10_000.0),
                120,
                7500.0,
                stats(50.0, 100.0, 3000.0),
                2500.0,
                1000.0,
                reqs(&[(yard, 4), (Technology(T::ImpulseDrive), 3)]),
            ),
        ),
        (
            S::Recycler,
            ship(
                (10_000.0, 6000.0, 2000.0),
                60,
                20_000.0,
                stats(1.0, 10.0, 1600.0),
                2000.0,
                300.0,
                reqs(&[(yard, 4), (Technology(T::CombustionDrive), 6)]),
            ),
        ),
        (
            S::EspionageProbe,
            ship(
                (0.0, 1000.0, 0.0),
                5,
                5.0,
                stats(0.0, 0.0, 100.0),
                100_000_000.0,
                1.0,
                reqs(&[(yard, 3), (Technology(T::CombustionDrive), 3)]),
            ),
        ),
        (
            S::DarkMatterHarvester,
            ship(
                (100_000.0, 150_000.0, 50_000.0),
                120,
                1000.0,
                stats(10.0, 50.0, 2000.0),
                5000.0,
                500.0,
                reqs(&[
                    (yard, 8),
                    (Technology(T::HyperspaceDrive), 5),
                    (Technology(T::DarkMatter), 1),
                ]),
            ),
        ),
    ])
}

/// The standard defense table.
#[must_use]
pub fn standard_defenses() -> BTreeMap<DefenseType, DefenseData> {
    use DefenseType as D;
    use Requirement::{Building, Technology};
    use TechnologyType as T;

    let yard = Building(BuildingType::Shipyard);
    let defense = |cost: (f64, f64, f64), build_time, combat, requirements| DefenseData {
        cost: Resources::new(cost.0, cost.1, cost.2, 0.0),
        build_time,
        combat,
        requirements,
    };

    BTreeMap::from([
        (
            D::RocketLauncher,
            defense(
                (2000.0, 0.0, 0.0),
                10,
                stats(80.0, 20.0, 200.0),
                reqs(&[(yard, 1)]),
            ),
        ),
        (
            D::LightLaser,
            defense(
                (1500.0, 500.0, 0.0),
                12,
                stats(100.0, 25.0, 200.0),
                reqs(&[(yard, 2), (Technology(T::Laser), 3)]),
            ),
        ),
        (
            D::HeavyLaser,
            defense(
                (6000.0, 2000.0, 0.0),
                20,
                stats(250.0, 100.0, 800.0),
                reqs(&[(yard, 4), (Technology(T::Laser), 6)]),
            ),
        ),
        (
            D::GaussCannon,
            defense(
                (20_000.0, 15_000.0, 2000.0),
                35,
                stats(1100.0, 200.0, 3500.0),
                reqs(&[(yard, 6), (Technology(T::Energy), 6)]),
            ),
        ),
        (
            D::IonCannon,
            defense(
                (2000.0, 6000.0, 0.0),
                30,
                stats(150.0, 500.0, 800.0),
                reqs(&[(yard, 4), (Technology(T::Ion), 4)]),
            ),
        ),
        (
            D::PlasmaTurret,
            defense(
                (50_000.0, 50_000.0, 30_000.0),
                60,
                stats(3000.0, 300.0, 10_000.0),
                reqs(&[(yard, 8), (Technology(T::Plasma), 7)]),
            ),
        ),
        (
            D::SmallShieldDome,
            defense(
                (10_000.0, 10_000.0, 0.0),
                30,
                stats(1.0, 2000.0, 2000.0),
                reqs(&[(yard, 6), (Technology(T::Energy), 3)]),
            ),
        ),
        (
            D::LargeShieldDome,
            defense(
                (50_000.0, 50_000.0, 0.0),
                60,
                stats(1.0, 10_000.0, 10_000.0),
                reqs(&[(yard, 6), (Technology(T::Energy), 6)]),
            ),
        ),
    ])
}
