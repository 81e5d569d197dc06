//! Construction and research queue of a planet.
//!
//! Handles costs, durations, prerequisites, field budgets and the two queue
//! lanes (construction and research). Orders pay up front when queued and
//! run back to back within their lane; completion is applied lazily when
//! the planet is next refreshed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bonuses::{calculate_active_bonuses, percent_factor, Bonuses};
use crate::data::{first_unmet, GameConfig, Requirements};
use crate::economy::update_planet_resources;
use crate::error::{GameError, Result};
use crate::planet::{Planet, Timestamp, MILLIS_PER_SECOND};
use crate::player::Player;
use crate::resources::{add_resources, deduct_resources, Resources};
use crate::units::{BuildingType, DefenseType, ShipType, TechLevels, TechnologyType};

/// Something a planet can be told to build or research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOrder {
    /// Raise a building by one level.
    Building(BuildingType),
    /// Raise a technology by one level.
    Research(TechnologyType),
    /// Build a batch of ships.
    Ships(ShipType, u32),
    /// Build a batch of defense structures.
    Defense(DefenseType, u32),
}

impl BuildOrder {
    /// Lane the order runs in.
    #[must_use]
    pub const fn lane(&self) -> QueueLane {
        match self {
            Self::Research(_) => QueueLane::Research,
            _ => QueueLane::Construction,
        }
    }
}

/// Independent sequences within one planet's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueLane {
    /// Buildings, ships and defenses.
    Construction,
    /// Technologies.
    Research,
}

/// One queued order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// What is being built.
    pub order: BuildOrder,
    /// Level reached on completion; batch size for ships and defenses.
    pub target_level: u32,
    /// Amount paid, refunded on cancel.
    pub cost: Resources,
    /// When work starts.
    pub start_time: Timestamp,
    /// When the order completes.
    pub end_time: Timestamp,
}

impl QueueItem {
    /// Milliseconds of work.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.end_time - self.start_time
    }
}

/// Pending orders, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildQueue {
    items: Vec<QueueItem>,
}

impl BuildQueue {
    /// Pending items.
    #[must_use]
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items in `lane`.
    pub fn lane(&self, lane: QueueLane) -> impl Iterator<Item = &QueueItem> {
        self.items.iter().filter(move |i| i.order.lane() == lane)
    }

    /// Earliest pending completion.
    #[must_use]
    pub fn next_completion(&self) -> Option<Timestamp> {
        self.items.iter().map(|i| i.end_time).min()
    }

    fn lane_end(&self, lane: QueueLane) -> Option<Timestamp> {
        self.lane(lane).map(|i| i.end_time).max()
    }

    fn pending_building_levels(&self, building: BuildingType) -> u32 {
        self.items
            .iter()
            .filter(|i| i.order == BuildOrder::Building(building))
            .count() as u32
    }

    fn pending_research_levels(&self, tech: TechnologyType) -> u32 {
        self.items
            .iter()
            .filter(|i| i.order == BuildOrder::Research(tech))
            .count() as u32
    }

    fn reschedule(&mut self, lane: QueueLane, now: Timestamp) {
        let mut cursor: Option<Timestamp> = None;
        for item in self.items.iter_mut().filter(|i| i.order.lane() == lane) {
            let duration = item.duration();
            let start = match cursor {
                Some(previous_end) => previous_end,
                None => item.start_time.min(now),
            };
            item.start_time = start;
            item.end_time = start + duration;
            cursor = Some(item.end_time);
        }
    }
}

// ============================================================================
// Costs, Times, Limits
// ============================================================================

/// Cost of the next level of `building` from `current_level`.
#[must_use]
pub fn upgrade_cost(config: &GameConfig, building: BuildingType, current_level: u32) -> Resources {
    config.building(building).upgrade_cost(current_level)
}

/// Cost of the next level of `tech` from `current_level`.
#[must_use]
pub fn research_cost(config: &GameConfig, tech: TechnologyType, current_level: u32) -> Resources {
    config.technology(tech).research_cost(current_level)
}

fn seconds_with_bonus(base_seconds: f64, speed_bonus: f64) -> u64 {
    ((base_seconds / percent_factor(speed_bonus)).floor() as u64).max(1)
}

/// Construction seconds for the next level of `building`.
#[must_use]
pub fn building_time(
    config: &GameConfig,
    building: BuildingType,
    current_level: u32,
    bonuses: &Bonuses,
) -> u64 {
    seconds_with_bonus(
        config.building(building).upgrade_time(current_level),
        bonuses.building_speed,
    )
}

/// Research seconds for the next level of `tech`.
#[must_use]
pub fn research_time(
    config: &GameConfig,
    tech: TechnologyType,
    current_level: u32,
    bonuses: &Bonuses,
) -> u64 {
    seconds_with_bonus(
        config.technology(tech).research_time(current_level),
        bonuses.research_speed,
    )
}

/// Seconds to build `count` ships or structures of `unit_time` each.
#[must_use]
pub fn batch_time(unit_time: u32, count: u32, bonuses: &Bonuses) -> u64 {
    seconds_with_bonus(
        f64::from(unit_time) * f64::from(count),
        bonuses.building_speed,
    )
}

/// Maximum queued items per lane.
#[must_use]
pub fn queue_limit(lane: QueueLane, planet: &Planet, technologies: &TechLevels, bonuses: &Bonuses) -> usize {
    let extra = match lane {
        QueueLane::Construction => {
            planet.building_level(BuildingType::NaniteFactory) + bonuses.additional_build_queue
        }
        QueueLane::Research => technologies.get(TechnologyType::Computer),
    };
    1 + extra as usize
}

fn check_requirements(
    requirements: &Requirements,
    planet: &Planet,
    technologies: &TechLevels,
) -> Result<()> {
    match first_unmet(requirements, &planet.buildings, technologies) {
        Some((req, needed, have)) => Err(GameError::RequirementNotMet(format!(
            "{req} level {needed} (have {have})"
        ))),
        None => Ok(()),
    }
}

fn check_placement(config: &GameConfig, building: BuildingType, planet: &Planet) -> Result<()> {
    let data = config.building(building);
    if (data.planet_only && planet.is_moon) || (data.moon_only && !planet.is_moon) {
        return Err(GameError::PlacementNotAllowed(building.to_string()));
    }
    Ok(())
}

fn check_space(config: &GameConfig, building: BuildingType, planet: &Planet) -> Result<()> {
    let pending: u32 = planet
        .build_queue
        .items()
        .iter()
        .filter_map(|i| match i.order {
            BuildOrder::Building(b) => Some(config.building(b).space_usage),
            _ => None,
        })
        .sum();
    let used = planet.used_space(config) + pending;
    let max = planet.total_space(config);
    let needed = config.building(building).space_usage;
    if used + needed > max {
        return Err(GameError::NotEnoughSpace { used, max, needed });
    }
    Ok(())
}

// ============================================================================
// Queue Operations
// ============================================================================

/// Validate `order`, pay for it and append it to the planet's queue.
///
/// The planet's resources should be current before calling.
///
/// # Errors
///
/// Returns an error if the lane is full, a prerequisite is missing, the
/// building does not fit or may not be placed on this body, the batch is
/// empty, or the planet cannot pay.
pub fn enqueue(
    planet: &mut Planet,
    technologies: &TechLevels,
    config: &GameConfig,
    bonuses: &Bonuses,
    order: BuildOrder,
    now: Timestamp,
) -> Result<QueueItem> {
    let lane = order.lane();
    let limit = queue_limit(lane, planet, technologies, bonuses);
    if planet.build_queue.lane(lane).count() >= limit {
        return Err(GameError::QueueFull { max: limit });
    }

    let (target_level, cost, seconds) = match order {
        BuildOrder::Building(building) => {
            check_placement(config, building, planet)?;
            check_requirements(&config.building(building).requirements, planet, technologies)?;
            check_space(config, building, planet)?;
            let level =
                planet.building_level(building) + planet.build_queue.pending_building_levels(building);
            (
                level + 1,
                upgrade_cost(config, building, level),
                building_time(config, building, level, bonuses),
            )
        }
        BuildOrder::Research(tech) => {
            check_requirements(&config.technology(tech).requirements, planet, technologies)?;
            let level = technologies.get(tech) + planet.build_queue.pending_research_levels(tech);
            (
                level + 1,
                research_cost(config, tech, level),
                research_time(config, tech, level, bonuses),
            )
        }
        BuildOrder::Ships(kind, count) => {
            if count == 0 {
                return Err(GameError::EmptyBatch);
            }
            let data = config.ship(kind);
            check_requirements(&data.requirements, planet, technologies)?;
            (
                count,
                data.cost.scale(f64::from(count)),
                batch_time(data.build_time, count, bonuses),
            )
        }
        BuildOrder::Defense(kind, count) => {
            if count == 0 {
                return Err(GameError::EmptyBatch);
            }
            let data = config.defense(kind);
            check_requirements(&data.requirements, planet, technologies)?;
            (
                count,
                data.cost.scale(f64::from(count)),
                batch_time(data.build_time, count, bonuses),
            )
        }
    };

    planet.resources.ensure_available(&cost)?;
    deduct_resources(&mut planet.resources, &cost);

    let start_time = planet.build_queue.lane_end(lane).map_or(now, |end| end.max(now));
    let item = QueueItem {
        order,
        target_level,
        cost,
        start_time,
        end_time: start_time + seconds * MILLIS_PER_SECOND,
    };
    debug!(planet = %planet.id, ?order, end_time = item.end_time, "Order queued");
    planet.build_queue.items.push(item.clone());
    Ok(item)
}

/// Apply every item finished by `now`, in completion order.
///
/// Research raises `technologies`; everything else lands on the planet.
/// Returns the completed items.
pub fn process_build_queue(
    planet: &mut Planet,
    technologies: &mut TechLevels,
    now: Timestamp,
) -> Vec<QueueItem> {
    let (mut done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut planet.build_queue.items)
        .into_iter()
        .partition(|i| i.end_time <= now);
    planet.build_queue.items = pending;
    done.sort_by_key(|i| i.end_time);

    for item in &done {
        match item.order {
            BuildOrder::Building(building) => {
                let level = planet.building_level(building).max(item.target_level);
                planet.buildings.set(building, level);
            }
            BuildOrder::Research(tech) => {
                let level = technologies.get(tech).max(item.target_level);
                technologies.set(tech, level);
            }
            BuildOrder::Ships(kind, count) => planet.fleet.add(kind, count),
            BuildOrder::Defense(kind, count) => planet.defense.add(kind, count),
        }
        debug!(planet = %planet.id, order = ?item.order, "Order completed");
    }
    done
}

/// Remove the item at `index`, refund its full cost and pull later items in
/// the same lane forward.
///
/// The refund is not clamped here; callers clamp to capacity afterwards.
///
/// # Errors
///
/// [`GameError::QueueItemNotFound`] if `index` is out of range.
pub fn cancel_queue_item(planet: &mut Planet, index: usize, now: Timestamp) -> Result<QueueItem> {
    if index >= planet.build_queue.items.len() {
        return Err(GameError::QueueItemNotFound(index));
    }
    let item = planet.build_queue.items.remove(index);
    add_resources(&mut planet.resources, &item.cost);

    // Later levels of the same building or tech drop by one.
    for later in planet.build_queue.items.iter_mut().skip(index) {
        if later.order == item.order && later.target_level > item.target_level {
            match later.order {
                BuildOrder::Building(_) | BuildOrder::Research(_) => later.target_level -= 1,
                BuildOrder::Ships(..) | BuildOrder::Defense(..) => {}
            }
        }
    }
    planet.build_queue.reschedule(item.order.lane(), now);
    debug!(planet = %planet.id, order = ?item.order, "Order cancelled");
    Ok(item)
}

/// Bring a planet up to `now`: integrate resources up to each queue
/// completion, apply it, and continue, so finished buildings only produce
/// from the moment they finish.
///
/// `owner` supplies officer bonuses and receives finished research. Returns
/// the completed items. A `now` before the planet's last update does nothing.
pub fn advance_planet(
    planet: &mut Planet,
    owner: Option<&mut Player>,
    config: &GameConfig,
    now: Timestamp,
) -> Vec<QueueItem> {
    let mut completed = Vec::new();
    if now < planet.last_update {
        return completed;
    }

    let bonuses = owner
        .as_ref()
        .map(|p| calculate_active_bonuses(&p.officers, config, now))
        .unwrap_or_default();
    let mut unowned = TechLevels::new();
    let technologies = match owner {
        Some(player) => &mut player.technologies,
        None => &mut unowned,
    };

    while let Some(at) = planet.build_queue.next_completion().filter(|&t| t <= now) {
        let at = at.max(planet.last_update);
        update_planet_resources(planet, at, &bonuses);
        completed.extend(process_build_queue(planet, technologies, at));
    }
    update_planet_resources(planet, now, &bonuses);
    completed
}
