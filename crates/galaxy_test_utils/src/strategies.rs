//! Proptest strategies for the simulation core.
//!
//! These generate random but reproducible inputs for property-based tests
//! of resources, forces and planets.

use galaxy_core::prelude::*;
use galaxy_core::units::{BuildingLevels, CountMap};
use proptest::prelude::*;

/// Generate a non-negative material amount.
///
/// Range: 0 to 1,000,000
pub fn arb_amount() -> impl Strategy<Value = f64> {
    0.0..1_000_000.0f64
}

/// Generate a resource bundle with zero energy.
pub fn arb_resources() -> impl Strategy<Value = Resources> {
    (arb_amount(), arb_amount(), arb_amount(), 0.0..5000.0f64)
        .prop_map(|(m, c, d, dm)| Resources::new(m, c, d, dm))
}

/// Generate slot coordinates inside a small galaxy.
pub fn arb_coordinates() -> impl Strategy<Value = Coordinates> {
    (1u32..5, 1u32..50, 1u32..16).prop_map(|(g, s, p)| Coordinates::new(g, s, p))
}

/// Generate a count map over any closed kind with up to `max_count` units
/// per kind.
pub fn arb_count_map<K: Kind>(
    max_count: u32,
) -> impl Strategy<Value = CountMap<K>> {
    proptest::collection::vec(0..=max_count, K::ALL.len()).prop_map(|counts| {
        K::ALL
            .iter()
            .copied()
            .zip(counts)
            .filter(|&(_, n)| n > 0)
            .collect()
    })
}

/// Generate a fleet with at least one ship.
pub fn arb_fleet(max_count: u32) -> impl Strategy<Value = Fleet> {
    arb_count_map::<ShipType>(max_count).prop_filter("fleet must not be empty", |f| !f.is_empty())
}

/// Generate a defense, possibly empty.
pub fn arb_defense(max_count: u32) -> impl Strategy<Value = Defense> {
    arb_count_map::<DefenseType>(max_count)
}

/// Generate building levels for the economy buildings.
pub fn arb_economy_levels() -> impl Strategy<Value = BuildingLevels> {
    (0u32..15, 0u32..15, 0u32..15, 0u32..20, 0u32..5, 0u32..5, 0u32..5).prop_map(
        |(metal, crystal, deuterium, solar, m_store, c_store, d_store)| {
            [
                (BuildingType::MetalMine, metal),
                (BuildingType::CrystalMine, crystal),
                (BuildingType::DeuteriumSynthesizer, deuterium),
                (BuildingType::SolarPlant, solar),
                (BuildingType::MetalStorage, m_store),
                (BuildingType::CrystalStorage, c_store),
                (BuildingType::DeuteriumTank, d_store),
            ]
            .into_iter()
            .collect()
        },
    )
}

/// Generate an elapsed time in milliseconds, up to about a month.
pub fn arb_elapsed_ms() -> impl Strategy<Value = u64> {
    0u64..2_600_000_000
}

/// Generate an owned planet with random economy and stock (already within
/// default capacity, since stock is clamped on every update).
pub fn arb_planet() -> impl Strategy<Value = Planet> {
    (arb_coordinates(), arb_economy_levels(), arb_resources()).prop_map(
        |(coordinates, buildings, resources)| {
            let mut planet = Planet::new_colony(PlanetId(1), PlayerId(1), coordinates, 0);
            planet.buildings = buildings;
            planet.resources = resources;
            galaxy_core::economy::clamp_to_capacity(&mut planet, &Bonuses::default());
            planet
        },
    )
}
