//! Planets, moons, coordinates and the registry that owns them.
//!
//! The registry keys every body by its coordinates: `"g:s:p"` for the planet
//! slot and `"g:s:p:moon"` for the moon slot. Keys are always derived from
//! the body being inserted, so a key can never disagree with its planet.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::GameConfig;
use crate::production::BuildQueue;
use crate::resources::Resources;
use crate::units::{BuildingLevels, BuildingType, Defense, Fleet};

/// Milliseconds since an arbitrary epoch chosen by the caller.
pub type Timestamp = u64;

/// Milliseconds in one second.
pub const MILLIS_PER_SECOND: u64 = 1000;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw id.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Player identifier.
    PlayerId,
    "player"
);
id_type!(
    /// Planet or moon identifier.
    PlanetId,
    "planet"
);
id_type!(
    /// Fleet mission identifier.
    MissionId,
    "mission"
);
id_type!(
    /// Battle or spy report identifier.
    ReportId,
    "report"
);

/// Monotonic id source owned by the universe.
///
/// Each id family has its own counter; ids start at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdAllocator {
    players: u64,
    planets: u64,
    missions: u64,
    reports: u64,
}

impl IdAllocator {
    /// Next player id.
    pub fn next_player(&mut self) -> PlayerId {
        self.players += 1;
        PlayerId(self.players)
    }

    /// Next planet id.
    pub fn next_planet(&mut self) -> PlanetId {
        self.planets += 1;
        PlanetId(self.planets)
    }

    /// Next mission id.
    pub fn next_mission(&mut self) -> MissionId {
        self.missions += 1;
        MissionId(self.missions)
    }

    /// Next report id.
    pub fn next_report(&mut self) -> ReportId {
        self.reports += 1;
        ReportId(self.reports)
    }

    /// Make sure future planet ids are above `id`.
    pub fn reserve_planet(&mut self, id: PlanetId) {
        self.planets = self.planets.max(id.0);
    }
}

/// Position of a slot in the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    /// Galaxy index.
    pub galaxy: u32,
    /// System index within the galaxy.
    pub system: u32,
    /// Slot within the system.
    pub position: u32,
}

impl Coordinates {
    /// Create coordinates.
    #[must_use]
    pub const fn new(galaxy: u32, system: u32, position: u32) -> Self {
        Self {
            galaxy,
            system,
            position,
        }
    }

    /// Registry key of the planet slot.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Registry key of the moon slot.
    #[must_use]
    pub fn moon_key(&self) -> String {
        format!("{self}:moon")
    }

    /// Euclidean distance over the three integer axes.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dg = f64::from(self.galaxy) - f64::from(other.galaxy);
        let ds = f64::from(self.system) - f64::from(other.system);
        let dp = f64::from(self.position) - f64::from(other.position);
        (dg * dg + ds * ds + dp * dp).sqrt()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.galaxy, self.system, self.position)
    }
}

/// Starting metal and crystal of a fresh colony.
pub const COLONY_START_RESOURCES: Resources = Resources::new(500.0, 500.0, 0.0, 0.0);

/// Field count of a fresh colony.
pub const COLONY_MAX_SPACE: u32 = 200;

/// A planet or moon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Unique id.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Owning player; `None` for unowned bodies.
    pub owner: Option<PlayerId>,
    /// Location.
    pub coordinates: Coordinates,
    /// Stored resources.
    pub resources: Resources,
    /// Building levels.
    pub buildings: BuildingLevels,
    /// Stationed ships.
    pub fleet: Fleet,
    /// Defense structures.
    pub defense: Defense,
    /// Pending construction and research.
    pub build_queue: BuildQueue,
    /// Base field count. Moons gain extra fields from the lunar base.
    pub max_space: u32,
    /// Time resources were last integrated up to.
    pub last_update: Timestamp,
    /// Moon flag; decides the registry slot.
    pub is_moon: bool,
    /// For moons, the planet they orbit.
    pub parent_planet: Option<PlanetId>,
}

impl Planet {
    /// A bare planet with no resources, buildings or units.
    #[must_use]
    pub fn new(
        id: PlanetId,
        name: impl Into<String>,
        owner: Option<PlayerId>,
        coordinates: Coordinates,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            coordinates,
            resources: Resources::ZERO,
            buildings: BuildingLevels::new(),
            fleet: Fleet::new(),
            defense: Defense::new(),
            build_queue: BuildQueue::default(),
            max_space: COLONY_MAX_SPACE,
            last_update: now,
            is_moon: false,
            parent_planet: None,
        }
    }

    /// A freshly founded colony.
    #[must_use]
    pub fn new_colony(
        id: PlanetId,
        owner: PlayerId,
        coordinates: Coordinates,
        now: Timestamp,
    ) -> Self {
        Self {
            resources: COLONY_START_RESOURCES,
            ..Self::new(id, format!("Colony {coordinates}"), Some(owner), coordinates, now)
        }
    }

    /// Registry key derived from coordinates and the moon flag.
    #[must_use]
    pub fn registry_key(&self) -> String {
        if self.is_moon {
            self.coordinates.moon_key()
        } else {
            self.coordinates.key()
        }
    }

    /// Building level, zero if never built.
    #[must_use]
    pub fn building_level(&self, building: BuildingType) -> u32 {
        self.buildings.get(building)
    }

    /// Fields occupied by buildings.
    #[must_use]
    pub fn used_space(&self, config: &GameConfig) -> u32 {
        self.buildings
            .iter()
            .map(|(kind, level)| level.saturating_mul(config.building(kind).space_usage))
            .fold(0, u32::saturating_add)
    }

    /// Field count including lunar base expansion on moons.
    #[must_use]
    pub fn total_space(&self, config: &GameConfig) -> u32 {
        if self.is_moon {
            let bonus = self
                .building_level(BuildingType::LunarBase)
                .saturating_mul(config.moon().lunar_base_space_bonus);
            self.max_space.saturating_add(bonus)
        } else {
            self.max_space
        }
    }
}

/// Every planet and moon, keyed by slot.
///
/// Iteration is in key order, which keeps evaluation deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanetRegistry {
    bodies: BTreeMap<String, Planet>,
}

impl PlanetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a body at the slot derived from its coordinates and moon flag.
    ///
    /// Returns the body previously in that slot.
    pub fn insert(&mut self, planet: Planet) -> Option<Planet> {
        self.bodies.insert(planet.registry_key(), planet)
    }

    /// Remove the body at `key`.
    pub fn remove(&mut self, key: &str) -> Option<Planet> {
        self.bodies.remove(key)
    }

    /// Body at `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Planet> {
        self.bodies.get(key)
    }

    /// Mutable body at `key`.
    ///
    /// Callers must not change `coordinates` or `is_moon` through this
    /// reference; re-insert instead.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Planet> {
        self.bodies.get_mut(key)
    }

    /// True if a body occupies `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.bodies.contains_key(key)
    }

    /// Planet (not moon) at `coordinates`.
    #[must_use]
    pub fn planet_at(&self, coordinates: &Coordinates) -> Option<&Planet> {
        self.get(&coordinates.key())
    }

    /// Moon at `coordinates`.
    #[must_use]
    pub fn moon_at(&self, coordinates: &Coordinates) -> Option<&Planet> {
        self.get(&coordinates.moon_key())
    }

    /// Body with the given id.
    #[must_use]
    pub fn find_by_id(&self, id: PlanetId) -> Option<&Planet> {
        self.bodies.values().find(|p| p.id == id)
    }

    /// Registry key of the body with the given id.
    #[must_use]
    pub fn key_of(&self, id: PlanetId) -> Option<String> {
        self.find_by_id(id).map(Planet::registry_key)
    }

    /// Keys of every body owned by `player`, in key order.
    #[must_use]
    pub fn keys_owned_by(&self, player: PlayerId) -> Vec<String> {
        self.bodies
            .iter()
            .filter(|(_, p)| p.owner == Some(player))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Iterate `(key, body)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Planet)> {
        self.bodies.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True if there are no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl FromIterator<Planet> for PlanetRegistry {
    fn from_iter<I: IntoIterator<Item = Planet>>(iter: I) -> Self {
        let mut registry = Self::new();
        for planet in iter {
            registry.insert(planet);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_keys() {
        let c = Coordinates::new(1, 42, 7);
        assert_eq!(c.key(), "1:42:7");
        assert_eq!(c.moon_key(), "1:42:7:moon");
    }

    #[test]
    fn test_distance_is_euclidean() {
        let a = Coordinates::new(1, 1, 1);
        let b = Coordinates::new(1, 4, 5);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_moon_and_planet_share_coordinates() {
        let c = Coordinates::new(2, 3, 4);
        let planet = Planet::new_colony(PlanetId(1), PlayerId(1), c, 0);
        let mut moon = Planet::new(PlanetId(2), "Moon", Some(PlayerId(1)), c, 0);
        moon.is_moon = true;
        moon.parent_planet = Some(PlanetId(1));

        let registry: PlanetRegistry = [planet, moon].into_iter().collect();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.planet_at(&c).map(|p| p.id), Some(PlanetId(1)));
        assert_eq!(registry.moon_at(&c).map(|p| p.id), Some(PlanetId(2)));
        assert_eq!(registry.key_of(PlanetId(2)).as_deref(), Some("2:3:4:moon"));
    }

    #[test]
    fn test_new_colony_defaults() {
        let colony = Planet::new_colony(PlanetId(9), PlayerId(3), Coordinates::new(1, 2, 3), 77);
        assert_eq!(colony.name, "Colony 1:2:3");
        assert_eq!(colony.resources, COLONY_START_RESOURCES);
        assert_eq!(colony.max_space, 200);
        assert_eq!(colony.last_update, 77);
        assert!(colony.buildings.is_empty());
        assert!(colony.fleet.is_empty());
        assert!(colony.defense.is_empty());
    }

    #[test]
    fn test_used_space_counts_levels() {
        let config = GameConfig::default();
        let mut planet = Planet::new_colony(PlanetId(1), PlayerId(1), Coordinates::new(1, 1, 1), 0);
        planet.buildings.set(BuildingType::MetalMine, 4);
        planet.buildings.set(BuildingType::SolarPlant, 2);
        // 4 * 3 + 2 * 5
        assert_eq!(planet.used_space(&config), 22);
    }

    #[test]
    fn test_id_allocator_is_monotonic() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.next_planet(), PlanetId(1));
        ids.reserve_planet(PlanetId(10));
        assert_eq!(ids.next_planet(), PlanetId(11));
        assert_eq!(ids.next_mission(), MissionId(1));
        assert_eq!(PlayerId(4).to_string(), "player-4");
    }
}
