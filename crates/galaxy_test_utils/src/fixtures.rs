//! Test fixtures and helpers.
//!
//! Pre-built universes and planets for consistent testing.

use galaxy_core::prelude::*;

/// Starting stock for fixture home planets.
pub const RICH_STOCK: Resources = Resources::new(9000.0, 9000.0, 9000.0, 500.0);

/// A two-player universe with one developed home planet each.
#[derive(Debug, Clone)]
pub struct Duel {
    /// The universe.
    pub universe: Universe,
    /// First player.
    pub attacker: PlayerId,
    /// Second player.
    pub defender: PlayerId,
    /// Registry key of the attacker's home.
    pub attacker_home: String,
    /// Registry key of the defender's home.
    pub defender_home: String,
}

/// Build a fleet from `(ship, count)` pairs.
#[must_use]
pub fn fleet(entries: &[(ShipType, u32)]) -> Fleet {
    entries.iter().copied().collect()
}

/// Build a defense from `(structure, count)` pairs.
#[must_use]
pub fn defense(entries: &[(DefenseType, u32)]) -> Defense {
    entries.iter().copied().collect()
}

/// A planet with working mines, power and storage, stocked with
/// [`RICH_STOCK`].
#[must_use]
pub fn developed_planet(id: PlanetId, owner: PlayerId, coordinates: Coordinates) -> Planet {
    let mut planet = Planet::new_colony(id, owner, coordinates, 0);
    planet.name = format!("Home {coordinates}");
    for (building, level) in [
        (BuildingType::MetalMine, 5),
        (BuildingType::CrystalMine, 4),
        (BuildingType::DeuteriumSynthesizer, 2),
        (BuildingType::SolarPlant, 8),
        (BuildingType::Shipyard, 2),
        (BuildingType::ResearchLab, 1),
    ] {
        planet.buildings.set(building, level);
    }
    planet.resources = RICH_STOCK;
    planet
}

/// Two players in the same system, the attacker holding `attacker_fleet`
/// and the defender holding `defender_fleet` and `defender_defense`.
///
/// # Panics
///
/// Panics if the fixture cannot be assembled, which means a core invariant
/// broke.
#[must_use]
pub fn duel(attacker_fleet: Fleet, defender_fleet: Fleet, defender_defense: Defense) -> Duel {
    let mut universe = Universe::default();
    let attacker = universe.add_player("attacker");
    let defender = universe.add_player("defender");

    let mut home = developed_planet(PlanetId(1), attacker, Coordinates::new(1, 1, 1));
    home.fleet = attacker_fleet;
    let mut target = developed_planet(PlanetId(2), defender, Coordinates::new(1, 1, 4));
    target.fleet = defender_fleet;
    target.defense = defender_defense;

    let attacker_home = universe.add_planet(home).expect("attacker home slot is free");
    let defender_home = universe.add_planet(target).expect("defender home slot is free");

    Duel {
        universe,
        attacker,
        defender,
        attacker_home,
        defender_home,
    }
}

impl Duel {
    /// Launch an attack with the attacker's whole fleet at time `now`.
    ///
    /// # Errors
    ///
    /// Whatever dispatch rejects.
    pub fn launch_attack(&mut self, now: Timestamp) -> Result<MissionId> {
        let fleet = self
            .universe
            .planet(&self.attacker_home)
            .map(|p| p.fleet.clone())
            .unwrap_or_default();
        let target = self
            .universe
            .planet(&self.defender_home)
            .map(|p| p.coordinates)
            .ok_or_else(|| GameError::PlanetNotFound(self.defender_home.clone()))?;
        self.universe.dispatch(
            self.attacker,
            DispatchRequest {
                origin_key: self.attacker_home.clone(),
                target,
                kind: MissionKind::Attack,
                fleet,
                cargo: Resources::ZERO,
            },
            now,
        )
    }
}
