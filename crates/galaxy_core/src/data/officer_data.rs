//! Officer definitions: hire cost, upkeep and granted benefits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::Resources;
use crate::units::OfficerType;

/// Benefits granted while an officer is active.
///
/// Percentages are additive across officers. Omitted fields default to zero
/// in config files.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficerBenefits {
    /// Construction speed, percent.
    pub building_speed: f64,
    /// Research speed, percent.
    pub research_speed: f64,
    /// Metal, crystal and deuterium output, percent.
    pub resource_production: f64,
    /// Dark matter output, percent.
    pub dark_matter_production: f64,
    /// Solar output, percent.
    pub energy_production: f64,
    /// Storage capacity, percent.
    pub storage_capacity: f64,
    /// Shield and armor in combat, percent.
    pub defense: f64,
    /// Ship speed, percent.
    pub fleet_speed: f64,
    /// Fuel use reduction, percent.
    pub fuel_reduction: f64,
    /// Extra construction lanes.
    pub additional_build_queue: u32,
    /// Extra concurrent fleet missions.
    pub additional_fleet_slots: u32,
}

/// Data-driven officer definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerData {
    /// One-off hire cost.
    pub cost: Resources,
    /// Upkeep per week of service.
    pub weekly_maintenance: Resources,
    /// Benefits while active.
    pub benefits: OfficerBenefits,
}

/// The standard officer table.
#[must_use]
pub fn standard_officers() -> BTreeMap<OfficerType, OfficerData> {
    use OfficerType as O;

    let officer = |cost: Resources, benefits| OfficerData {
        cost,
        weekly_maintenance: cost.scale(0.1),
        benefits,
    };
    let none = OfficerBenefits::default();

    BTreeMap::from([
        (
            O::Commander,
            officer(
                Resources::new(0.0, 50_000.0, 25_000.0, 0.0),
                OfficerBenefits {
                    building_speed: 10.0,
                    additional_build_queue: 1,
                    storage_capacity: 10.0,
                    ..none
                },
            ),
        ),
        (
            O::Admiral,
            officer(
                Resources::new(50_000.0, 25_000.0, 0.0, 0.0),
                OfficerBenefits {
                    additional_fleet_slots: 2,
                    fleet_speed: 10.0,
                    fuel_reduction: 10.0,
                    ..none
                },
            ),
        ),
        (
            O::Engineer,
            officer(
                Resources::new(40_000.0, 20_000.0, 10_000.0, 0.0),
                OfficerBenefits {
                    defense: 15.0,
                    energy_production: 10.0,
                    building_speed: 5.0,
                    ..none
                },
            ),
        ),
        (
            O::Geologist,
            officer(
                Resources::new(30_000.0, 30_000.0, 20_000.0, 0.0),
                OfficerBenefits {
                    resource_production: 15.0,
                    storage_capacity: 10.0,
                    ..none
                },
            ),
        ),
        (
            O::Technocrat,
            officer(
                Resources::new(20_000.0, 40_000.0, 20_000.0, 0.0),
                OfficerBenefits {
                    research_speed: 15.0,
                    ..none
                },
            ),
        ),
        (
            O::DarkMatterSpecialist,
            officer(
                Resources::new(50_000.0, 100_000.0, 50_000.0, 100.0),
                OfficerBenefits {
                    dark_matter_production: 25.0,
                    ..none
                },
            ),
        ),
    ])
}
