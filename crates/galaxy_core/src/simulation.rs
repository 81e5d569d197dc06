//! The universe: owner of every planet, player and fleet in flight.
//!
//! Nothing here runs on a clock. Each request carries its own `now`, and
//! the universe brings the affected planets up to that time before acting:
//! resources are integrated, finished construction is applied, and due
//! fleet events are resolved in time order.
//!
//! # Determinism
//!
//! - All collections iterate in key order
//! - Ids come from a counter, never from the clock
//! - Randomness is supplied by the caller
//!
//! Two universes fed the same requests and equally seeded generators end
//! with the same [`state_hash`](Universe::state_hash).
//!
//! # Example
//!
//! ```
//! use galaxy_core::prelude::*;
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! let mut universe = Universe::default();
//! let player = universe.add_player("ada");
//! let home = universe
//!     .create_planet(player, Coordinates::new(1, 1, 1), 0)
//!     .unwrap();
//!
//! universe
//!     .enqueue(player, &home, BuildOrder::Building(BuildingType::MetalMine), 0)
//!     .unwrap();
//!
//! let mut rng = SmallRng::seed_from_u64(42);
//! universe.step(player, 60_000, &mut rng);
//! assert_eq!(universe.planet(&home).unwrap().building_level(BuildingType::MetalMine), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bonuses::{self, calculate_active_bonuses};
use crate::data::GameConfig;
use crate::economy::clamp_to_capacity;
use crate::error::{GameError, Result};
use crate::fleet::{
    dispatch_fleet, recall_fleet_mission, update_fleet_missions, DispatchRequest, FleetMission,
    MissionContext, MissionReport,
};
use crate::planet::{
    Coordinates, IdAllocator, MissionId, Planet, PlanetRegistry, PlayerId, Timestamp,
};
use crate::player::Player;
use crate::production::{self, advance_planet, BuildOrder, QueueItem};
use crate::units::OfficerType;

/// Authoritative world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    config: GameConfig,
    planets: PlanetRegistry,
    players: BTreeMap<PlayerId, Player>,
    missions: Vec<FleetMission>,
    ids: IdAllocator,
}

impl Universe {
    /// An empty universe using `config`.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            planets: PlanetRegistry::new(),
            players: BTreeMap::new(),
            missions: Vec::new(),
            ids: IdAllocator::default(),
        }
    }

    /// Static tables.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Every planet and moon.
    #[must_use]
    pub const fn planets(&self) -> &PlanetRegistry {
        &self.planets
    }

    /// Body at a registry key.
    #[must_use]
    pub fn planet(&self, key: &str) -> Option<&Planet> {
        self.planets.get(key)
    }

    /// A player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Every player, by id.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Fleets in flight, in dispatch order.
    #[must_use]
    pub fn missions(&self) -> &[FleetMission] {
        &self.missions
    }

    /// Number of missions `player` has in flight.
    #[must_use]
    pub fn active_missions(&self, player: PlayerId) -> usize {
        self.missions.iter().filter(|m| m.player == player).count()
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Register a new player.
    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerId {
        let id = self.ids.next_player();
        self.players.insert(id, Player::new(id, name));
        debug!(player = %id, "Player added");
        id
    }

    /// Insert a prepared planet or moon, keeping its id.
    ///
    /// Returns its registry key.
    ///
    /// # Errors
    ///
    /// Fails if the slot is taken or the owner is unknown.
    pub fn add_planet(&mut self, planet: Planet) -> Result<String> {
        let key = planet.registry_key();
        if self.planets.contains_key(&key) {
            return Err(GameError::InvalidState(format!("slot {key} is occupied")));
        }
        if let Some(owner) = planet.owner.filter(|id| !self.players.contains_key(id)) {
            return Err(GameError::PlayerNotFound(owner));
        }
        self.ids.reserve_planet(planet.id);
        self.planets.insert(planet);
        Ok(key)
    }

    /// Found a fresh colony for `owner` at `coordinates`.
    ///
    /// # Errors
    ///
    /// Fails if the slot is taken or the owner is unknown.
    pub fn create_planet(
        &mut self,
        owner: PlayerId,
        coordinates: Coordinates,
        now: Timestamp,
    ) -> Result<String> {
        if !self.players.contains_key(&owner) {
            return Err(GameError::PlayerNotFound(owner));
        }
        if self.planets.planet_at(&coordinates).is_some() {
            return Err(GameError::InvalidState(format!(
                "slot {coordinates} is occupied"
            )));
        }
        let planet = Planet::new_colony(self.ids.next_planet(), owner, coordinates, now);
        let key = planet.registry_key();
        self.planets.insert(planet);
        Ok(key)
    }

    // ========================================================================
    // Planets
    // ========================================================================

    /// Bring one body up to `now`, applying finished construction.
    ///
    /// # Errors
    ///
    /// Fails if no body has that key.
    pub fn refresh_planet(&mut self, key: &str, now: Timestamp) -> Result<Vec<QueueItem>> {
        let planet = self
            .planets
            .get_mut(key)
            .ok_or_else(|| GameError::PlanetNotFound(key.to_string()))?;
        let owner = planet.owner.and_then(|id| self.players.get_mut(&id));
        Ok(advance_planet(planet, owner, &self.config, now))
    }

    /// Bring every body owned by `player` up to `now`.
    pub fn refresh_player(&mut self, player: PlayerId, now: Timestamp) -> Vec<QueueItem> {
        let mut completed = Vec::new();
        for key in self.planets.keys_owned_by(player) {
            if let Ok(items) = self.refresh_planet(&key, now) {
                completed.extend(items);
            }
        }
        completed
    }

    fn owned_planet_mut(&mut self, player: PlayerId, key: &str) -> Result<&mut Planet> {
        if !self.players.contains_key(&player) {
            return Err(GameError::PlayerNotFound(player));
        }
        let planet = self
            .planets
            .get_mut(key)
            .ok_or_else(|| GameError::PlanetNotFound(key.to_string()))?;
        if planet.owner != Some(player) {
            return Err(GameError::NotPlanetOwner {
                player,
                planet: key.to_string(),
            });
        }
        Ok(planet)
    }

    /// Queue construction or research on an owned body, paying up front.
    ///
    /// # Errors
    ///
    /// Ownership errors plus everything [`production::enqueue`] rejects.
    pub fn enqueue(
        &mut self,
        player: PlayerId,
        key: &str,
        order: BuildOrder,
        now: Timestamp,
    ) -> Result<QueueItem> {
        self.refresh_planet(key, now)?;
        self.owned_planet_mut(player, key)?;

        let owner = self
            .players
            .get(&player)
            .ok_or(GameError::PlayerNotFound(player))?;
        let bonuses = calculate_active_bonuses(&owner.officers, &self.config, now);
        let planet = self
            .planets
            .get_mut(key)
            .ok_or_else(|| GameError::PlanetNotFound(key.to_string()))?;
        production::enqueue(planet, &owner.technologies, &self.config, &bonuses, order, now)
    }

    /// Cancel a queued item and refund it, clamped to storage.
    ///
    /// # Errors
    ///
    /// Ownership errors or an index outside the queue.
    pub fn cancel(
        &mut self,
        player: PlayerId,
        key: &str,
        index: usize,
        now: Timestamp,
    ) -> Result<QueueItem> {
        self.refresh_planet(key, now)?;
        let bonuses = self
            .players
            .get(&player)
            .map(|p| calculate_active_bonuses(&p.officers, &self.config, now))
            .unwrap_or_default();
        let planet = self.owned_planet_mut(player, key)?;
        let item = production::cancel_queue_item(planet, index, now)?;
        clamp_to_capacity(planet, &bonuses);
        Ok(item)
    }

    /// Hire an officer, paying from the resources of `key`.
    ///
    /// # Errors
    ///
    /// Ownership errors or insufficient resources on that body.
    pub fn hire_officer(
        &mut self,
        player: PlayerId,
        key: &str,
        officer: OfficerType,
        now: Timestamp,
    ) -> Result<Timestamp> {
        self.refresh_planet(key, now)?;
        self.owned_planet_mut(player, key)?;
        let planet = self
            .planets
            .get_mut(key)
            .ok_or_else(|| GameError::PlanetNotFound(key.to_string()))?;
        let hirer = self
            .players
            .get_mut(&player)
            .ok_or(GameError::PlayerNotFound(player))?;
        bonuses::hire_officer(hirer, &mut planet.resources, &self.config, officer, now)
    }

    // ========================================================================
    // Fleets
    // ========================================================================

    /// Launch a fleet from an owned body.
    ///
    /// # Errors
    ///
    /// Everything [`dispatch_fleet`] rejects.
    pub fn dispatch(
        &mut self,
        player: PlayerId,
        request: DispatchRequest,
        now: Timestamp,
    ) -> Result<MissionId> {
        self.refresh_planet(&request.origin_key, now)?;
        let active = self.active_missions(player);
        let sender = self
            .players
            .get(&player)
            .ok_or(GameError::PlayerNotFound(player))?;
        let mission = dispatch_fleet(
            &mut self.planets,
            sender,
            active,
            &self.config,
            &mut self.ids,
            request,
            now,
        )?;
        let id = mission.id;
        self.missions.push(mission);
        Ok(id)
    }

    /// Turn one of `player`'s outbound fleets around.
    pub fn recall(&mut self, player: PlayerId, mission: MissionId, now: Timestamp) -> bool {
        match self
            .missions
            .iter_mut()
            .find(|m| m.id == mission && m.player == player)
        {
            Some(m) => recall_fleet_mission(m, now),
            None => {
                warn!(%player, %mission, "Recall of unknown mission");
                false
            }
        }
    }

    /// Resolve `player`'s fleet events due by `now`, then bring the player's
    /// bodies up to `now`.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        player: PlayerId,
        now: Timestamp,
        rng: &mut R,
    ) -> MissionReport {
        let mut ctx = MissionContext {
            registry: &mut self.planets,
            players: &mut self.players,
            config: &self.config,
            ids: &mut self.ids,
        };
        let report = update_fleet_missions(&mut self.missions, &mut ctx, player, now, rng);
        self.refresh_player(player, now);
        report
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Serialize the full state.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize universe: {e}")))
    }

    /// Restore a universe from [`snapshot`](Self::snapshot) bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not decode.
    pub fn from_snapshot(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize universe: {e}")))
    }

    /// Hash of the serialized state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self.snapshot() {
            Ok(bytes) => bytes.hash(&mut hasher),
            Err(e) => warn!(error = %e, "State hash over unserializable universe"),
        }
        hasher.finish()
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::MissionKind;
    use crate::resources::Resources;
    use crate::units::{BuildingType, Fleet, ShipType};
    use rand::rngs::mock::StepRng;

    const SECOND: Timestamp = 1000;

    fn universe() -> (Universe, PlayerId, String) {
        let mut u = Universe::default();
        let player = u.add_player("ada");
        let home = u.create_planet(player, Coordinates::new(1, 1, 1), 0).unwrap();
        (u, player, home)
    }

    #[test]
    fn test_create_planet_rejects_occupied_slot() {
        let (mut u, player, _) = universe();
        let err = u.create_planet(player, Coordinates::new(1, 1, 1), 0).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
        let err = u
            .create_planet(PlayerId(99), Coordinates::new(2, 2, 2), 0)
            .unwrap_err();
        assert!(matches!(err, GameError::PlayerNotFound(PlayerId(99))));
    }

    #[test]
    fn test_enqueue_requires_ownership() {
        let (mut u, _, home) = universe();
        let other = u.add_player("bo");
        let err = u
            .enqueue(other, &home, BuildOrder::Building(BuildingType::MetalMine), 0)
            .unwrap_err();
        assert!(matches!(err, GameError::NotPlanetOwner { .. }));
    }

    #[test]
    fn test_step_completes_construction() {
        let (mut u, player, home) = universe();
        let item = u
            .enqueue(player, &home, BuildOrder::Building(BuildingType::MetalMine), 0)
            .unwrap();

        u.step(player, item.end_time, &mut StepRng::new(0, 0));
        let planet = u.planet(&home).unwrap();
        assert_eq!(planet.building_level(BuildingType::MetalMine), 1);
        assert!(planet.build_queue.is_empty());
        assert_eq!(planet.last_update, item.end_time);
    }

    #[test]
    fn test_cancel_refunds() {
        let (mut u, player, home) = universe();
        let before = u.planet(&home).unwrap().resources;
        u.enqueue(player, &home, BuildOrder::Building(BuildingType::MetalMine), 0)
            .unwrap();
        u.cancel(player, &home, 0, 0).unwrap();
        assert_eq!(u.planet(&home).unwrap().resources, before);
        assert!(matches!(
            u.cancel(player, &home, 0, 0),
            Err(GameError::QueueItemNotFound(0))
        ));
    }

    #[test]
    fn test_hire_officer_pays_from_planet() {
        let (mut u, player, home) = universe();
        let err = u
            .hire_officer(player, &home, OfficerType::Commander, 0)
            .unwrap_err();
        assert!(matches!(err, GameError::InsufficientResources { .. }));
    }

    #[test]
    fn test_dispatch_and_step_round_trip() {
        let (mut u, player, home) = universe();
        let other = u.add_player("bo");
        let target = u.create_planet(other, Coordinates::new(1, 1, 4), 0).unwrap();
        let mut planet = u.planets.get(&home).cloned().unwrap();
        planet.fleet = Fleet::from([(ShipType::SmallCargo, 1)]);
        u.planets.insert(planet);

        let id = u
            .dispatch(
                player,
                DispatchRequest {
                    origin_key: home.clone(),
                    target: Coordinates::new(1, 1, 4),
                    kind: MissionKind::Transport,
                    fleet: Fleet::from([(ShipType::SmallCargo, 1)]),
                    cargo: Resources::new(100.0, 0.0, 0.0, 0.0),
                },
                0,
            )
            .unwrap();
        assert_eq!(u.active_missions(player), 1);
        assert_eq!(u.planet(&home).unwrap().resources.metal, 400.0);

        let report = u.step(player, 20 * SECOND, &mut StepRng::new(0, 0));
        assert_eq!(report.completed, vec![id]);
        assert_eq!(u.active_missions(player), 0);
        assert_eq!(u.planet(&target).unwrap().resources.metal, 600.0);
        assert_eq!(u.planet(&home).unwrap().fleet.get(ShipType::SmallCargo), 1);
    }

    #[test]
    fn test_recall_checks_owner() {
        let (mut u, player, home) = universe();
        let mut planet = u.planets.get(&home).cloned().unwrap();
        planet.fleet = Fleet::from([(ShipType::LightFighter, 1)]);
        u.planets.insert(planet);
        let id = u
            .dispatch(
                player,
                DispatchRequest {
                    origin_key: home,
                    target: Coordinates::new(1, 1, 4),
                    kind: MissionKind::Attack,
                    fleet: Fleet::from([(ShipType::LightFighter, 1)]),
                    cargo: Resources::ZERO,
                },
                0,
            )
            .unwrap();

        assert!(!u.recall(PlayerId(77), id, SECOND));
        assert!(u.recall(player, id, SECOND));
        assert!(!u.recall(player, id, 2 * SECOND));
    }

    #[test]
    fn test_snapshot_preserves_hash() {
        let (mut u, player, home) = universe();
        u.enqueue(player, &home, BuildOrder::Building(BuildingType::SolarPlant), 0)
            .unwrap();
        let bytes = u.snapshot().unwrap();
        let restored = Universe::from_snapshot(&bytes).unwrap();
        assert_eq!(restored, u);
        assert_eq!(restored.state_hash(), u.state_hash());
        assert!(Universe::from_snapshot(&[1, 2, 3]).is_err());
    }
}
