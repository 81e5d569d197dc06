//! Resource engine: energy balance, hourly production, storage capacity and
//! lazy integration of a planet's stock over elapsed time.
//!
//! Planets are not ticked. Their stock is brought up to date on demand from
//! `last_update`, so the same formulas serve a five-second refresh and a
//! week-long absence.

use serde::{Deserialize, Serialize};

use crate::bonuses::{percent_factor, Bonuses};
use crate::planet::{Planet, Timestamp, MILLIS_PER_SECOND};
use crate::resources::Resources;
use crate::units::BuildingType;

/// Per-level growth factor shared by every production formula.
pub const LEVEL_GROWTH: f64 = 1.1;

/// Solar output per plant level, before growth.
pub const SOLAR_BASE_OUTPUT: f64 = 50.0;

/// Hourly base output of the metal mine.
pub const METAL_BASE_RATE: f64 = 150.0;
/// Hourly base output of the crystal mine.
pub const CRYSTAL_BASE_RATE: f64 = 100.0;
/// Hourly base output of the deuterium synthesizer.
pub const DEUTERIUM_BASE_RATE: f64 = 50.0;
/// Hourly base output of the dark matter collector.
pub const DARK_MATTER_BASE_RATE: f64 = 2.5;

/// Base storage for metal, crystal and deuterium.
pub const BASE_STORAGE: f64 = 10_000.0;
/// Dark matter storage without a collector.
pub const DARK_MATTER_BASE_STORAGE: f64 = 1000.0;
/// Dark matter storage per collector level.
pub const DARK_MATTER_STORAGE_PER_LEVEL: f64 = 100.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

fn grown(level: u32, base: f64) -> f64 {
    f64::from(level) * base * LEVEL_GROWTH.powi(level as i32)
}

/// Energy generated by the solar plant.
#[must_use]
pub fn energy_production(planet: &Planet, bonuses: &Bonuses) -> f64 {
    grown(planet.building_level(BuildingType::SolarPlant), SOLAR_BASE_OUTPUT)
        * percent_factor(bonuses.energy_production)
}

/// Energy drawn by the mines and the synthesizer.
#[must_use]
pub fn energy_consumption(planet: &Planet) -> f64 {
    grown(planet.building_level(BuildingType::MetalMine), 10.0)
        + grown(planet.building_level(BuildingType::CrystalMine), 10.0)
        + grown(planet.building_level(BuildingType::DeuteriumSynthesizer), 15.0)
}

/// Fraction of nominal mine output achieved with the given energy balance.
///
/// Always within `[0, 1]`.
#[must_use]
pub fn production_efficiency(production: f64, consumption: f64) -> f64 {
    if production >= consumption {
        1.0
    } else {
        (production / consumption).max(0.0)
    }
}

/// Hourly production of each resource.
///
/// The `energy` field carries the balance (production minus consumption).
/// Dark matter ignores the energy balance.
#[must_use]
pub fn calculate_resource_production(planet: &Planet, bonuses: &Bonuses) -> Resources {
    let produced = energy_production(planet, bonuses);
    let consumed = energy_consumption(planet);
    let efficiency = production_efficiency(produced, consumed);
    let mines = percent_factor(bonuses.resource_production) * efficiency;

    Resources {
        metal: grown(planet.building_level(BuildingType::MetalMine), METAL_BASE_RATE) * mines,
        crystal: grown(planet.building_level(BuildingType::CrystalMine), CRYSTAL_BASE_RATE)
            * mines,
        deuterium: grown(
            planet.building_level(BuildingType::DeuteriumSynthesizer),
            DEUTERIUM_BASE_RATE,
        ) * mines,
        dark_matter: grown(
            planet.building_level(BuildingType::DarkMatterCollector),
            DARK_MATTER_BASE_RATE,
        ) * percent_factor(bonuses.dark_matter_production),
        energy: produced - consumed,
    }
}

/// Storage ceiling of each material. `energy` is always zero.
#[must_use]
pub fn calculate_resource_capacity(planet: &Planet, bonuses: &Bonuses) -> Resources {
    let bonus = percent_factor(bonuses.storage_capacity);
    let storage = |building| BASE_STORAGE * 2f64.powi(planet.building_level(building) as i32) * bonus;

    Resources::new(
        storage(BuildingType::MetalStorage),
        storage(BuildingType::CrystalStorage),
        storage(BuildingType::DeuteriumTank),
        DARK_MATTER_BASE_STORAGE
            + DARK_MATTER_STORAGE_PER_LEVEL
                * f64::from(planet.building_level(BuildingType::DarkMatterCollector)),
    )
}

/// Clamp a planet's stock to its current capacity.
pub fn clamp_to_capacity(planet: &mut Planet, bonuses: &Bonuses) {
    let capacity = calculate_resource_capacity(planet, bonuses);
    planet.resources.clamp_to(&capacity);
}

/// Integrate production from `last_update` to `now`, clamp, and stamp `now`.
///
/// Calling twice with the same `now` changes nothing the second time. A `now`
/// earlier than `last_update` is ignored.
pub fn update_planet_resources(planet: &mut Planet, now: Timestamp, bonuses: &Bonuses) {
    if now < planet.last_update {
        return;
    }
    let elapsed_hours =
        (now - planet.last_update) as f64 / MILLIS_PER_SECOND as f64 / SECONDS_PER_HOUR;

    if elapsed_hours > 0.0 {
        let rate = calculate_resource_production(planet, bonuses);
        let gained = Resources::new(rate.metal, rate.crystal, rate.deuterium, rate.dark_matter)
            .scale(elapsed_hours);
        planet.resources += gained;
    }
    clamp_to_capacity(planet, bonuses);
    planet.last_update = now;
}

/// Snapshot of a planet's economy, for reports and tools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomySummary {
    /// Hourly production; `energy` is the balance.
    pub production: Resources,
    /// Storage ceilings.
    pub capacity: Resources,
    /// Mine efficiency in `[0, 1]`.
    pub efficiency: f64,
}

/// Production, capacity and efficiency in one call.
#[must_use]
pub fn summarize(planet: &Planet, bonuses: &Bonuses) -> EconomySummary {
    EconomySummary {
        production: calculate_resource_production(planet, bonuses),
        capacity: calculate_resource_capacity(planet, bonuses),
        efficiency: production_efficiency(
            energy_production(planet, bonuses),
            energy_consumption(planet),
        ),
    }
}
