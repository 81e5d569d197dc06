//! Fleet missions: dispatch, flight times and the mission state machine.
//!
//! A mission flies `outbound` until its arrival time, applies its arrival
//! effect, then flies `returning` until its return time and unloads at the
//! origin. A successful deploy ends at the target instead.
//!
//! Arrival handlers never fail. A vanished target, an occupied colony slot
//! or a foreign deploy target simply turns the fleet around.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bonuses::{calculate_active_bonuses, percent_factor, Bonuses};
use crate::combat::{
    cargo_capacity, repair_defense, simulate_battle, BattleInput, BattleParties, BattleResult,
};
use crate::data::GameConfig;
use crate::economy::clamp_to_capacity;
use crate::error::{GameError, Result};
use crate::moon::{create_moon, moon_eligibility, roll_moon};
use crate::planet::{
    Coordinates, IdAllocator, MissionId, Planet, PlanetId, PlanetRegistry, PlayerId, ReportId,
    Timestamp, MILLIS_PER_SECOND,
};
use crate::player::Player;
use crate::production::advance_planet;
use crate::resources::{add_resources, deduct_resources, Resources};
use crate::units::{BuildingLevels, Defense, Fleet, ShipType, TechLevels};

/// Shortest possible one-way flight, in seconds.
pub const MIN_FLIGHT_SECONDS: u64 = 10;

/// Distance-to-time scale of the flight formula.
pub const FLIGHT_DISTANCE_FACTOR: f64 = 10_000.0;

/// Fleet slots every player has without officers.
pub const BASE_FLEET_SLOTS: usize = 2;

/// Fixed chance that the target notices a spy probe.
pub const SPY_DETECTION_CHANCE: f64 = 0.3;

/// What a mission does on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    /// Deliver cargo and fly home.
    Transport,
    /// Fight the target and carry plunder home.
    Attack,
    /// Found a colony on an empty slot.
    Colonize,
    /// Report on the target.
    Spy,
    /// Station the fleet at an own planet.
    Deploy,
}

/// Leg of the flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Flying to the target.
    Outbound,
    /// Flying back to the origin.
    Returning,
}

/// One fleet in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetMission {
    /// Unique id.
    pub id: MissionId,
    /// Owning player.
    pub player: PlayerId,
    /// Planet the fleet launched from.
    pub origin_planet: PlanetId,
    /// Registry key of the origin, where the fleet returns.
    pub origin_key: String,
    /// Coordinates of the origin.
    pub origin: Coordinates,
    /// Target slot.
    pub target: Coordinates,
    /// Mission kind.
    pub kind: MissionKind,
    /// Ships in flight.
    pub fleet: Fleet,
    /// Resources carried.
    pub cargo: Resources,
    /// Launch time.
    pub departure_time: Timestamp,
    /// Arrival at the target.
    pub arrival_time: Timestamp,
    /// Arrival back at the origin.
    pub return_time: Timestamp,
    /// Current leg.
    pub status: MissionStatus,
}

impl FleetMission {
    /// Time of the next transition.
    #[must_use]
    pub const fn next_event_time(&self) -> Timestamp {
        match self.status {
            MissionStatus::Outbound => self.arrival_time,
            MissionStatus::Returning => self.return_time,
        }
    }
}

/// Snapshot of a planet taken by a spy mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpyReport {
    /// Report id.
    pub id: ReportId,
    /// When the probe arrived.
    pub timestamp: Timestamp,
    /// Spying player.
    pub spy_id: PlayerId,
    /// Observed planet.
    pub target_planet_id: PlanetId,
    /// Owner of the observed planet.
    pub target_player_id: Option<PlayerId>,
    /// Stock at arrival.
    pub resources: Resources,
    /// Stationed ships.
    pub fleet: Fleet,
    /// Defense structures.
    pub defense: Defense,
    /// Building levels.
    pub buildings: BuildingLevels,
    /// Owner's research.
    pub technologies: TechLevels,
    /// Chance the target noticed.
    pub detection_chance: f64,
}

/// Everything an evaluation pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionReport {
    /// Missions finished and removed.
    pub completed: Vec<MissionId>,
    /// Battles fought.
    pub battle_reports: Vec<BattleResult>,
    /// Spy reports gathered.
    pub spy_reports: Vec<SpyReport>,
    /// Colonies founded.
    pub new_colonies: Vec<Planet>,
    /// Moons formed.
    pub new_moons: Vec<Planet>,
}

/// Shared world state the scheduler reads and mutates.
pub struct MissionContext<'a> {
    /// Every planet and moon.
    pub registry: &'a mut PlanetRegistry,
    /// Every player, for bonuses and research.
    pub players: &'a mut BTreeMap<PlayerId, Player>,
    /// Static tables.
    pub config: &'a GameConfig,
    /// Id source for reports, colonies and moons.
    pub ids: &'a mut IdAllocator,
}

impl MissionContext<'_> {
    fn bonuses_of(&self, player: Option<PlayerId>, at: Timestamp) -> Bonuses {
        player
            .and_then(|id| self.players.get(&id))
            .map(|p| calculate_active_bonuses(&p.officers, self.config, at))
            .unwrap_or_default()
    }

    /// Bring the body at `key` up to `at`, if it exists.
    fn refresh(&mut self, key: &str, at: Timestamp) {
        if let Some(planet) = self.registry.get_mut(key) {
            let owner = planet.owner.and_then(|id| self.players.get_mut(&id));
            advance_planet(planet, owner, self.config, at);
        }
    }

    /// Credit `amount` to the body at `key` and clamp to its capacity.
    fn credit(&mut self, key: &str, amount: &Resources, at: Timestamp) -> bool {
        self.refresh(key, at);
        let owner = self.registry.get(key).and_then(|p| p.owner);
        let bonuses = self.bonuses_of(owner, at);
        match self.registry.get_mut(key) {
            Some(planet) => {
                add_resources(&mut planet.resources, amount);
                clamp_to_capacity(planet, &bonuses);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Flight
// ============================================================================

/// Euclidean distance between two slots.
#[must_use]
pub fn calculate_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    from.distance_to(to)
}

/// One-way flight seconds: `max(10, floor(distance * 10000 / min_speed))`.
#[must_use]
pub fn calculate_flight_time(distance: f64, min_speed: f64) -> u64 {
    let seconds = (distance * FLIGHT_DISTANCE_FACTOR / min_speed).floor();
    (seconds as u64).max(MIN_FLIGHT_SECONDS)
}

/// Speed of the slowest ship, scaled by the fleet speed bonus. `None` for an
/// empty fleet.
#[must_use]
pub fn min_fleet_speed(fleet: &Fleet, config: &GameConfig, bonuses: &Bonuses) -> Option<f64> {
    fleet
        .iter()
        .map(|(kind, _)| config.ship(kind).speed)
        .reduce(f64::min)
        .map(|speed| speed * percent_factor(bonuses.fleet_speed))
}

/// Concurrent missions allowed for a player.
#[must_use]
pub fn fleet_slots(bonuses: &Bonuses) -> usize {
    BASE_FLEET_SLOTS + bonuses.additional_fleet_slots as usize
}

/// A fleet launch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Registry key of the launching body.
    pub origin_key: String,
    /// Target slot.
    pub target: Coordinates,
    /// Mission kind.
    pub kind: MissionKind,
    /// Ships to send.
    pub fleet: Fleet,
    /// Resources to load.
    pub cargo: Resources,
}

/// Validate a launch, take ships and cargo off the origin and create the
/// mission.
///
/// The origin's resources should be current before calling.
///
/// # Errors
///
/// Returns an error if the origin is missing or foreign, the fleet is empty
/// or not stationed there, all fleet slots are busy, a colonize or spy fleet
/// lacks its mission ship, or the cargo exceeds the hold or the stock.
pub fn dispatch_fleet(
    registry: &mut PlanetRegistry,
    player: &Player,
    active_missions: usize,
    config: &GameConfig,
    ids: &mut IdAllocator,
    request: DispatchRequest,
    now: Timestamp,
) -> Result<FleetMission> {
    let origin = registry
        .get_mut(&request.origin_key)
        .ok_or_else(|| GameError::PlanetNotFound(request.origin_key.clone()))?;
    if origin.owner != Some(player.id) {
        return Err(GameError::NotPlanetOwner {
            player: player.id,
            planet: request.origin_key,
        });
    }
    if request.fleet.is_empty() {
        return Err(GameError::EmptyFleet);
    }
    if let Some((ship, requested, available)) = origin.fleet.shortfall(&request.fleet) {
        return Err(GameError::InsufficientShips {
            ship: ship.to_string(),
            requested,
            available,
        });
    }

    let bonuses = calculate_active_bonuses(&player.officers, config, now);
    let max = fleet_slots(&bonuses);
    if active_missions >= max {
        return Err(GameError::FleetSlotsExhausted { max });
    }

    let required_ship = match request.kind {
        MissionKind::Colonize => Some(ShipType::ColonyShip),
        MissionKind::Spy => Some(ShipType::EspionageProbe),
        _ => None,
    };
    if let Some(ship) = required_ship.filter(|&s| request.fleet.get(s) == 0) {
        return Err(GameError::MissingMissionShip(ship.to_string()));
    }

    if request.cargo.has_negative() {
        return Err(GameError::InvalidState("negative cargo".into()));
    }
    let capacity = cargo_capacity(&request.fleet, config);
    let cargo_total = request.cargo.total_materials();
    if cargo_total > capacity {
        return Err(GameError::CargoExceedsCapacity {
            cargo: cargo_total,
            capacity,
        });
    }
    origin.resources.ensure_available(&request.cargo)?;

    let speed = min_fleet_speed(&request.fleet, config, &bonuses).ok_or(GameError::EmptyFleet)?;
    let distance = calculate_distance(&origin.coordinates, &request.target);
    let flight_ms = calculate_flight_time(distance, speed) * MILLIS_PER_SECOND;

    origin.fleet.subtract_floor(&request.fleet);
    deduct_resources(&mut origin.resources, &request.cargo);

    let mission = FleetMission {
        id: ids.next_mission(),
        player: player.id,
        origin_planet: origin.id,
        origin_key: request.origin_key,
        origin: origin.coordinates,
        target: request.target,
        kind: request.kind,
        fleet: request.fleet,
        cargo: request.cargo,
        departure_time: now,
        arrival_time: now + flight_ms,
        return_time: now + 2 * flight_ms,
        status: MissionStatus::Outbound,
    };
    debug!(
        mission = %mission.id,
        kind = ?mission.kind,
        target = %mission.target,
        arrival_time = mission.arrival_time,
        "Fleet dispatched"
    );
    Ok(mission)
}

// ============================================================================
// Arrival Handlers
// ============================================================================

/// Unload cargo at the target. Cargo for a vanished target is lost.
pub fn process_transport_arrival(mission: &mut FleetMission, ctx: &mut MissionContext<'_>) {
    let at = mission.arrival_time;
    if !ctx.credit(&mission.target.key(), &mission.cargo, at) {
        debug!(mission = %mission.id, "Transport target vanished, cargo lost");
    }
    mission.cargo = Resources::ZERO;
    mission.status = MissionStatus::Returning;
}

/// Fight the target, apply losses and repairs, load plunder and roll for a
/// moon.
///
/// Returns the battle and the moon it formed, or `None` when there was
/// nothing to attack.
pub fn process_attack_arrival<R: Rng + ?Sized>(
    mission: &mut FleetMission,
    ctx: &mut MissionContext<'_>,
    rng: &mut R,
) -> Option<(BattleResult, Option<Planet>)> {
    let at = mission.arrival_time;
    let key = mission.target.key();
    mission.status = MissionStatus::Returning;

    ctx.refresh(&key, at);
    let target = ctx.registry.get(&key)?;
    if target.owner == Some(mission.player) {
        return None;
    }

    let attacker_bonuses = ctx.bonuses_of(Some(mission.player), at);
    let defender_bonuses = ctx.bonuses_of(target.owner, at);
    let parties = BattleParties {
        id: ctx.ids.next_report(),
        timestamp: at,
        attacker_id: mission.player,
        defender_id: target.owner,
        attacker_planet_id: mission.origin_planet,
        defender_planet_id: target.id,
    };
    let input = BattleInput {
        attacker_fleet: &mission.fleet,
        defender_fleet: &target.fleet,
        defender_defense: &target.defense,
        defender_resources: &target.resources,
        attacker_bonuses: &attacker_bonuses,
        defender_bonuses: &defender_bonuses,
    };
    let result = simulate_battle(parties, &input, ctx.config, rng);

    let target = ctx.registry.get_mut(&key)?;
    target.fleet.subtract_floor(&result.defender_losses.fleet);
    let defense_before = target.defense.clone();
    target.defense.subtract_floor(&result.defender_losses.defense);
    target.defense = repair_defense(&defense_before, &target.defense);
    target.resources.saturating_sub(&result.plunder);
    clamp_to_capacity(target, &defender_bonuses);
    let (target_id, target_owner) = (target.id, target.owner);

    mission.fleet = result.attacker_survivors();
    mission.cargo = result.plunder;

    let moon_config = ctx.config.moon();
    let eligibility = moon_eligibility(ctx.registry, &mission.target, &result.debris_field, moon_config);
    let moon = if eligibility.eligible && roll_moon(eligibility.chance, rng) {
        let moon = create_moon(
            ctx.ids.next_planet(),
            mission.target,
            target_id,
            target_owner,
            moon_config,
            at,
        );
        debug!(moon = %moon.id, at = %mission.target, chance = eligibility.chance, "Moon formed");
        ctx.registry.insert(moon.clone());
        Some(moon)
    } else {
        None
    };

    Some((result, moon))
}

/// Found a colony on an empty slot, consuming one colony ship.
///
/// An occupied slot, or a fleet that lost its colony ship, turns around
/// unchanged.
pub fn process_colonize_arrival(
    mission: &mut FleetMission,
    ctx: &mut MissionContext<'_>,
) -> Option<Planet> {
    mission.status = MissionStatus::Returning;
    if ctx.registry.planet_at(&mission.target).is_some()
        || mission.fleet.get(ShipType::ColonyShip) == 0
    {
        return None;
    }

    let colony = Planet::new_colony(
        ctx.ids.next_planet(),
        mission.player,
        mission.target,
        mission.arrival_time,
    );
    mission.fleet.remove(ShipType::ColonyShip, 1);
    debug!(planet = %colony.id, at = %mission.target, "Colony founded");
    ctx.registry.insert(colony.clone());
    Some(colony)
}

/// Take a snapshot of the target. No report if the slot is empty.
pub fn process_spy_arrival(
    mission: &mut FleetMission,
    ctx: &mut MissionContext<'_>,
) -> Option<SpyReport> {
    let at = mission.arrival_time;
    let key = mission.target.key();
    mission.status = MissionStatus::Returning;

    ctx.refresh(&key, at);
    let target = ctx.registry.get(&key)?;
    let technologies = target
        .owner
        .and_then(|id| ctx.players.get(&id))
        .map(|p| p.technologies.clone())
        .unwrap_or_default();

    Some(SpyReport {
        id: ctx.ids.next_report(),
        timestamp: at,
        spy_id: mission.player,
        target_planet_id: target.id,
        target_player_id: target.owner,
        resources: target.resources,
        fleet: target.fleet.clone(),
        defense: target.defense.clone(),
        buildings: target.buildings.clone(),
        technologies,
        detection_chance: SPY_DETECTION_CHANCE,
    })
}

/// Station the fleet and its cargo at an own planet.
///
/// Returns `true` when the mission ended there; otherwise it turns around
/// with everything aboard.
pub fn process_deploy_arrival(mission: &mut FleetMission, ctx: &mut MissionContext<'_>) -> bool {
    let key = mission.target.key();
    let owned = ctx
        .registry
        .get(&key)
        .is_some_and(|p| p.owner == Some(mission.player));
    if !owned {
        mission.status = MissionStatus::Returning;
        return false;
    }

    ctx.credit(&key, &mission.cargo, mission.arrival_time);
    if let Some(target) = ctx.registry.get_mut(&key) {
        target.fleet.merge(&mission.fleet);
    }
    mission.cargo = Resources::ZERO;
    true
}

/// Unload ships and cargo at the origin. A vanished origin loses both.
pub fn process_fleet_return(mission: &FleetMission, ctx: &mut MissionContext<'_>) {
    if !ctx.credit(&mission.origin_key, &mission.cargo, mission.return_time) {
        warn!(mission = %mission.id, origin = %mission.origin_key, "Origin vanished, fleet lost");
        return;
    }
    if let Some(origin) = ctx.registry.get_mut(&mission.origin_key) {
        origin.fleet.merge(&mission.fleet);
    }
}

/// Turn an outbound fleet around before it arrives.
///
/// The flight back takes as long as the flight so far. Fails once the fleet
/// has arrived or is already returning.
pub fn recall_fleet_mission(mission: &mut FleetMission, now: Timestamp) -> bool {
    if mission.status != MissionStatus::Outbound || now >= mission.arrival_time {
        return false;
    }
    let elapsed = now.saturating_sub(mission.departure_time);
    mission.status = MissionStatus::Returning;
    mission.return_time = now + elapsed;
    debug!(mission = %mission.id, return_time = mission.return_time, "Fleet recalled");
    true
}

// ============================================================================
// Evaluation Pass
// ============================================================================

/// Apply every arrival and return of `player`'s missions due by `now`.
///
/// Events run in time order (ties by mission id), so a fleet can arrive and
/// return within one pass. Finished missions are removed from `missions`;
/// other players' missions are left alone.
pub fn update_fleet_missions<R: Rng + ?Sized>(
    missions: &mut Vec<FleetMission>,
    ctx: &mut MissionContext<'_>,
    player: PlayerId,
    now: Timestamp,
    rng: &mut R,
) -> MissionReport {
    let mut report = MissionReport::default();

    loop {
        let due = missions
            .iter()
            .enumerate()
            .filter(|(_, m)| m.player == player && m.next_event_time() <= now)
            .min_by_key(|(_, m)| (m.next_event_time(), m.id))
            .map(|(index, _)| index);
        let Some(index) = due else { break };

        let mission = &mut missions[index];
        let finished = match mission.status {
            MissionStatus::Outbound => {
                debug!(mission = %mission.id, kind = ?mission.kind, "Fleet arrived");
                match mission.kind {
                    MissionKind::Transport => {
                        process_transport_arrival(mission, ctx);
                        false
                    }
                    MissionKind::Attack => {
                        if let Some((battle, moon)) = process_attack_arrival(mission, ctx, rng) {
                            report.battle_reports.push(battle);
                            report.new_moons.extend(moon);
                        }
                        false
                    }
                    MissionKind::Colonize => {
                        report.new_colonies.extend(process_colonize_arrival(mission, ctx));
                        false
                    }
                    MissionKind::Spy => {
                        report.spy_reports.extend(process_spy_arrival(mission, ctx));
                        false
                    }
                    MissionKind::Deploy => process_deploy_arrival(mission, ctx),
                }
            }
            MissionStatus::Returning => {
                debug!(mission = %mission.id, "Fleet returned");
                process_fleet_return(mission, ctx);
                true
            }
        };

        if finished {
            let done = missions.remove(index);
            report.completed.push(done.id);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TechnologyType;
    use rand::rngs::mock::StepRng;

    const SECOND: Timestamp = MILLIS_PER_SECOND;

    struct World {
        registry: PlanetRegistry,
        players: BTreeMap<PlayerId, Player>,
        config: GameConfig,
        ids: IdAllocator,
    }

    impl World {
        fn new() -> Self {
            let mut players = BTreeMap::new();
            players.insert(PlayerId(1), Player::new(PlayerId(1), "ada"));
            players.insert(PlayerId(2), Player::new(PlayerId(2), "bo"));

            let mut home = Planet::new_colony(PlanetId(1), PlayerId(1), Coordinates::new(1, 1, 1), 0);
            home.fleet = Fleet::from([
                (ShipType::SmallCargo, 5),
                (ShipType::LightFighter, 10),
                (ShipType::ColonyShip, 1),
                (ShipType::EspionageProbe, 2),
            ]);
            home.resources = Resources::new(5000.0, 5000.0, 5000.0, 0.0);
            let enemy = Planet::new_colony(PlanetId(2), PlayerId(2), Coordinates::new(1, 1, 5), 0);

            let mut ids = IdAllocator::default();
            ids.reserve_planet(PlanetId(2));
            Self {
                registry: [home, enemy].into_iter().collect(),
                players,
                config: GameConfig::default(),
                ids,
            }
        }

        fn ctx(&mut self) -> MissionContext<'_> {
            MissionContext {
                registry: &mut self.registry,
                players: &mut self.players,
                config: &self.config,
                ids: &mut self.ids,
            }
        }

        fn dispatch(&mut self, kind: MissionKind, target: Coordinates, fleet: Fleet, cargo: Resources) -> Result<FleetMission> {
            let player = self.players[&PlayerId(1)].clone();
            dispatch_fleet(
                &mut self.registry,
                &player,
                0,
                &self.config,
                &mut self.ids,
                DispatchRequest {
                    origin_key: "1:1:1".into(),
                    target,
                    kind,
                    fleet,
                    cargo,
                },
                0,
            )
        }
    }

    #[test]
    fn test_flight_time_has_floor() {
        assert_eq!(calculate_flight_time(0.0, 10_000.0), 10);
        // 4 * 10000 / 5000
        assert_eq!(calculate_flight_time(4.0, 5000.0), 10);
        assert_eq!(calculate_flight_time(100.0, 5000.0), 200);
    }

    #[test]
    fn test_min_speed_uses_slowest_ship() {
        let config = GameConfig::default();
        let fleet = Fleet::from([(ShipType::LightFighter, 3), (ShipType::Recycler, 1)]);
        assert_eq!(min_fleet_speed(&fleet, &config, &Bonuses::default()), Some(2000.0));

        let fast = Bonuses {
            fleet_speed: 10.0,
            ..Bonuses::default()
        };
        let speed = min_fleet_speed(&fleet, &config, &fast).unwrap();
        assert!((speed - 2200.0).abs() < 1e-9);
        assert_eq!(min_fleet_speed(&Fleet::new(), &config, &fast), None);
    }

    #[test]
    fn test_dispatch_takes_ships_and_cargo() {
        let mut world = World::new();
        let mission = world
            .dispatch(
                MissionKind::Transport,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::SmallCargo, 2)]),
                Resources::new(1000.0, 0.0, 0.0, 0.0),
            )
            .unwrap();

        let home = world.registry.get("1:1:1").unwrap();
        assert_eq!(home.fleet.get(ShipType::SmallCargo), 3);
        assert_eq!(home.resources.metal, 4000.0);
        // distance 4 at speed 5000 hits the 10 s floor
        assert_eq!(mission.arrival_time, 10 * SECOND);
        assert_eq!(mission.return_time, 20 * SECOND);
    }

    #[test]
    fn test_dispatch_validation() {
        let mut world = World::new();
        let target = Coordinates::new(1, 1, 5);

        let err = world
            .dispatch(MissionKind::Attack, target, Fleet::from([(ShipType::Cruiser, 1)]), Resources::ZERO)
            .unwrap_err();
        assert!(matches!(err, GameError::InsufficientShips { .. }));

        let err = world
            .dispatch(MissionKind::Spy, target, Fleet::from([(ShipType::LightFighter, 1)]), Resources::ZERO)
            .unwrap_err();
        assert!(matches!(err, GameError::MissingMissionShip(_)));

        let err = world
            .dispatch(
                MissionKind::Transport,
                target,
                Fleet::from([(ShipType::LightFighter, 1)]),
                Resources::new(51.0, 0.0, 0.0, 0.0),
            )
            .unwrap_err();
        assert!(matches!(err, GameError::CargoExceedsCapacity { .. }));

        let err = world
            .dispatch(MissionKind::Transport, target, Fleet::new(), Resources::ZERO)
            .unwrap_err();
        assert!(matches!(err, GameError::EmptyFleet));
    }

    #[test]
    fn test_fleet_slots_limit() {
        let mut world = World::new();
        let player = world.players[&PlayerId(1)].clone();
        let err = dispatch_fleet(
            &mut world.registry,
            &player,
            2,
            &world.config,
            &mut world.ids,
            DispatchRequest {
                origin_key: "1:1:1".into(),
                target: Coordinates::new(1, 1, 5),
                kind: MissionKind::Attack,
                fleet: Fleet::from([(ShipType::LightFighter, 1)]),
                cargo: Resources::ZERO,
            },
            0,
        )
        .unwrap_err();
        assert!(matches!(err, GameError::FleetSlotsExhausted { max: 2 }));
    }

    #[test]
    fn test_transport_round_trip() {
        let mut world = World::new();
        let mission = world
            .dispatch(
                MissionKind::Transport,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::SmallCargo, 1)]),
                Resources::new(1000.0, 500.0, 0.0, 0.0),
            )
            .unwrap();
        let mut missions = vec![mission];

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), 10 * SECOND, &mut StepRng::new(0, 0));
        assert!(report.completed.is_empty());
        assert_eq!(missions[0].status, MissionStatus::Returning);
        assert_eq!(missions[0].cargo, Resources::ZERO);
        let enemy = world.registry.get("1:1:5").unwrap();
        assert_eq!(enemy.resources.metal, 1500.0);
        assert_eq!(enemy.resources.crystal, 1000.0);

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), 20 * SECOND, &mut StepRng::new(0, 0));
        assert_eq!(report.completed.len(), 1);
        assert!(missions.is_empty());
        assert_eq!(world.registry.get("1:1:1").unwrap().fleet.get(ShipType::SmallCargo), 5);
    }

    #[test]
    fn test_arrival_and_return_in_one_pass() {
        let mut world = World::new();
        let mission = world
            .dispatch(
                MissionKind::Attack,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::LightFighter, 10)]),
                Resources::ZERO,
            )
            .unwrap();
        let mut missions = vec![mission];

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), 60 * SECOND, &mut StepRng::new(0, 0));
        assert_eq!(report.battle_reports.len(), 1);
        assert_eq!(report.completed.len(), 1);

        let battle = &report.battle_reports[0];
        assert_eq!(battle.parties.defender_id, Some(PlayerId(2)));
        // Plunder: half of the 500 metal/crystal pools, within the 500 hold.
        assert_eq!(battle.plunder, Resources::new(250.0, 150.0, 0.0, 0.0));

        let home = world.registry.get("1:1:1").unwrap();
        assert_eq!(home.fleet.get(ShipType::LightFighter), 10);
        assert_eq!(home.resources.metal, 5250.0);
        let enemy = world.registry.get("1:1:5").unwrap();
        assert_eq!(enemy.resources.metal, 250.0);
    }

    #[test]
    fn test_attack_on_own_planet_turns_around() {
        let mut world = World::new();
        let mut mission = world
            .dispatch(
                MissionKind::Attack,
                Coordinates::new(1, 1, 1),
                Fleet::from([(ShipType::LightFighter, 1)]),
                Resources::ZERO,
            )
            .unwrap();
        let result = process_attack_arrival(&mut mission, &mut world.ctx(), &mut StepRng::new(0, 0));
        assert!(result.is_none());
        assert_eq!(mission.status, MissionStatus::Returning);
        assert_eq!(mission.fleet.get(ShipType::LightFighter), 1);
    }

    #[test]
    fn test_colonize_occupied_slot_fails_silently() {
        let mut world = World::new();
        let mut mission = world
            .dispatch(
                MissionKind::Colonize,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::ColonyShip, 1)]),
                Resources::ZERO,
            )
            .unwrap();
        let before = world.registry.get("1:1:5").cloned();

        let colony = process_colonize_arrival(&mut mission, &mut world.ctx());
        assert!(colony.is_none());
        assert_eq!(mission.status, MissionStatus::Returning);
        assert_eq!(mission.fleet, Fleet::from([(ShipType::ColonyShip, 1)]));
        assert_eq!(world.registry.get("1:1:5").cloned(), before);
    }

    #[test]
    fn test_colonize_empty_slot() {
        let mut world = World::new();
        let target = Coordinates::new(1, 2, 3);
        let mut mission = world
            .dispatch(
                MissionKind::Colonize,
                target,
                Fleet::from([(ShipType::ColonyShip, 1), (ShipType::SmallCargo, 1)]),
                Resources::ZERO,
            )
            .unwrap();

        let colony = process_colonize_arrival(&mut mission, &mut world.ctx()).unwrap();
        assert_eq!(colony.owner, Some(PlayerId(1)));
        assert_eq!(colony.id, PlanetId(3));
        assert_eq!(mission.fleet, Fleet::from([(ShipType::SmallCargo, 1)]));
        assert!(world.registry.planet_at(&target).is_some());
    }

    #[test]
    fn test_spy_report_snapshot() {
        let mut world = World::new();
        world
            .players
            .get_mut(&PlayerId(2))
            .unwrap()
            .technologies
            .set(TechnologyType::Laser, 3);
        let mut mission = world
            .dispatch(
                MissionKind::Spy,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::EspionageProbe, 1)]),
                Resources::ZERO,
            )
            .unwrap();

        let report = process_spy_arrival(&mut mission, &mut world.ctx()).unwrap();
        assert_eq!(report.target_player_id, Some(PlayerId(2)));
        assert_eq!(report.resources.metal, 500.0);
        assert_eq!(report.technologies.get(TechnologyType::Laser), 3);
        assert_eq!(report.detection_chance, 0.3);

        let mut lost = mission.clone();
        lost.target = Coordinates::new(9, 9, 9);
        assert!(process_spy_arrival(&mut lost, &mut world.ctx()).is_none());
    }

    #[test]
    fn test_deploy_to_foreign_planet_turns_around() {
        let mut world = World::new();
        let mut missions = vec![world
            .dispatch(
                MissionKind::Deploy,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::LightFighter, 4)]),
                Resources::ZERO,
            )
            .unwrap()];

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), 10 * SECOND, &mut StepRng::new(0, 0));
        assert!(report.completed.is_empty());
        assert_eq!(missions[0].status, MissionStatus::Returning);
        assert_eq!(missions[0].fleet.get(ShipType::LightFighter), 4);
    }

    #[test]
    fn test_deploy_to_own_planet_completes() {
        let mut world = World::new();
        let mut second = Planet::new_colony(PlanetId(3), PlayerId(1), Coordinates::new(1, 1, 9), 0);
        second.resources = Resources::ZERO;
        world.registry.insert(second);

        let mut missions = vec![world
            .dispatch(
                MissionKind::Deploy,
                Coordinates::new(1, 1, 9),
                Fleet::from([(ShipType::SmallCargo, 1)]),
                Resources::new(100.0, 0.0, 0.0, 0.0),
            )
            .unwrap()];

        // distance 8 at speed 5000 is a 16 s flight
        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), 20 * SECOND, &mut StepRng::new(0, 0));
        assert_eq!(report.completed.len(), 1);
        assert!(missions.is_empty());
        let target = world.registry.get("1:1:9").unwrap();
        assert_eq!(target.fleet.get(ShipType::SmallCargo), 1);
        assert_eq!(target.resources.metal, 100.0);
    }

    #[test]
    fn test_transport_to_empty_slot_loses_cargo() {
        let mut world = World::new();
        let empty = Coordinates::new(1, 1, 7);
        let mission = world
            .dispatch(
                MissionKind::Transport,
                empty,
                Fleet::from([(ShipType::SmallCargo, 2)]),
                Resources::new(1000.0, 400.0, 0.0, 0.0),
            )
            .unwrap();
        let arrival = mission.arrival_time;
        let mut missions = vec![mission];

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), arrival, &mut StepRng::new(0, 0));
        assert!(report.completed.is_empty());
        assert_eq!(missions[0].status, MissionStatus::Returning);
        assert_eq!(missions[0].cargo, Resources::ZERO);
        assert_eq!(missions[0].fleet.get(ShipType::SmallCargo), 2);
        assert!(world.registry.planet_at(&empty).is_none());

        let back = missions[0].return_time;
        update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), back, &mut StepRng::new(0, 0));
        let home = world.registry.get("1:1:1").unwrap();
        assert_eq!(home.fleet.get(ShipType::SmallCargo), 5);
        assert_eq!(home.resources.metal, 4000.0);
    }

    #[test]
    fn test_attack_on_empty_slot_returns_without_battle() {
        let mut world = World::new();
        let mission = world
            .dispatch(
                MissionKind::Attack,
                Coordinates::new(1, 1, 7),
                Fleet::from([(ShipType::LightFighter, 3)]),
                Resources::ZERO,
            )
            .unwrap();
        let arrival = mission.arrival_time;
        let mut missions = vec![mission];

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), arrival, &mut StepRng::new(0, 0));
        assert!(report.battle_reports.is_empty());
        assert!(report.new_moons.is_empty());
        assert_eq!(missions[0].status, MissionStatus::Returning);
        assert_eq!(missions[0].fleet, Fleet::from([(ShipType::LightFighter, 3)]));
        assert_eq!(missions[0].cargo, Resources::ZERO);
    }

    #[test]
    fn test_deploy_to_empty_slot_returns_intact() {
        let mut world = World::new();
        let cargo = Resources::new(300.0, 200.0, 100.0, 0.0);
        let mission = world
            .dispatch(
                MissionKind::Deploy,
                Coordinates::new(1, 1, 7),
                Fleet::from([(ShipType::SmallCargo, 1), (ShipType::LightFighter, 2)]),
                cargo,
            )
            .unwrap();
        let arrival = mission.arrival_time;
        let mut missions = vec![mission];

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), arrival, &mut StepRng::new(0, 0));
        assert!(report.completed.is_empty());
        assert_eq!(missions[0].status, MissionStatus::Returning);
        assert_eq!(
            missions[0].fleet,
            Fleet::from([(ShipType::SmallCargo, 1), (ShipType::LightFighter, 2)])
        );
        assert_eq!(missions[0].cargo, cargo);

        let back = missions[0].return_time;
        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), back, &mut StepRng::new(0, 0));
        assert_eq!(report.completed.len(), 1);
        let home = world.registry.get("1:1:1").unwrap();
        assert_eq!(home.fleet.get(ShipType::LightFighter), 10);
        assert_eq!(home.resources.metal, 5000.0);
    }

    #[test]
    fn test_recall_window() {
        let mut world = World::new();
        let mut mission = world
            .dispatch(
                MissionKind::Attack,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::LightFighter, 1)]),
                Resources::ZERO,
            )
            .unwrap();

        assert!(!recall_fleet_mission(&mut mission.clone(), 10 * SECOND));
        assert!(recall_fleet_mission(&mut mission, 4 * SECOND));
        assert_eq!(mission.status, MissionStatus::Returning);
        assert_eq!(mission.return_time, 8 * SECOND);
        assert!(!recall_fleet_mission(&mut mission, 5 * SECOND));
    }

    #[test]
    fn test_return_to_vanished_origin_still_completes() {
        let mut world = World::new();
        let mission = world
            .dispatch(
                MissionKind::Transport,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::SmallCargo, 1)]),
                Resources::ZERO,
            )
            .unwrap();
        world.registry.remove("1:1:1");
        let mut missions = vec![mission];

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), 20 * SECOND, &mut StepRng::new(0, 0));
        assert_eq!(report.completed.len(), 1);
        assert!(missions.is_empty());
    }

    #[test]
    fn test_other_players_missions_untouched() {
        let mut world = World::new();
        let mut mission = world
            .dispatch(
                MissionKind::Transport,
                Coordinates::new(1, 1, 5),
                Fleet::from([(ShipType::SmallCargo, 1)]),
                Resources::ZERO,
            )
            .unwrap();
        mission.player = PlayerId(2);
        let mut missions = vec![mission.clone()];

        let report = update_fleet_missions(&mut missions, &mut world.ctx(), PlayerId(1), 20 * SECOND, &mut StepRng::new(0, 0));
        assert_eq!(report, MissionReport::default());
        assert_eq!(missions, vec![mission]);
    }
}
