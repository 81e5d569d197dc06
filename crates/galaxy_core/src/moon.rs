//! Moon formation from large debris fields.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::MoonConfig;
use crate::planet::{Coordinates, Planet, PlanetId, PlanetRegistry, PlayerId, Timestamp};
use crate::resources::Resources;

/// Whether a battle's debris may form a moon, and with what chance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonEligibility {
    /// A roll is allowed at all.
    pub eligible: bool,
    /// Chance of success in percent; zero when not eligible.
    pub chance: f64,
}

impl MoonEligibility {
    const NONE: Self = Self {
        eligible: false,
        chance: 0.0,
    };
}

/// Check whether debris at `coordinates` qualifies for a moon roll.
///
/// A moon needs a planet at the slot, no existing moon, and at least
/// `min_debris` metal plus crystal. The chance starts at `base_chance` and
/// gains one percent per full `chance_per_debris` above the minimum, up to
/// `max_chance`.
#[must_use]
pub fn moon_eligibility(
    registry: &PlanetRegistry,
    coordinates: &Coordinates,
    debris: &Resources,
    config: &MoonConfig,
) -> MoonEligibility {
    let has_planet = registry.planet_at(coordinates).is_some_and(|p| !p.is_moon);
    if !has_planet || registry.moon_at(coordinates).is_some() {
        return MoonEligibility::NONE;
    }

    let amount = debris.metal + debris.crystal;
    if amount < config.min_debris {
        return MoonEligibility::NONE;
    }

    let extra = ((amount - config.min_debris) / config.chance_per_debris).floor();
    MoonEligibility {
        eligible: true,
        chance: (config.base_chance + extra).min(config.max_chance),
    }
}

/// Roll a `chance` percent trial.
pub fn roll_moon<R: Rng + ?Sized>(chance: f64, rng: &mut R) -> bool {
    chance > 0.0 && rng.gen_range(0.0..100.0) < chance
}

/// Build the moon body for a slot. The caller registers it.
#[must_use]
pub fn create_moon(
    id: PlanetId,
    coordinates: Coordinates,
    parent: PlanetId,
    owner: Option<PlayerId>,
    config: &MoonConfig,
    now: Timestamp,
) -> Planet {
    let mut moon = Planet::new(id, "Moon", owner, coordinates, now);
    moon.is_moon = true;
    moon.parent_planet = Some(parent);
    moon.max_space = config.base_size;
    moon
}
