//! Officer bonuses: aggregation of active officers and hiring.

use std::ops::AddAssign;

use tracing::debug;

use crate::data::{GameConfig, OfficerBenefits};
use crate::error::Result;
use crate::planet::{Timestamp, MILLIS_PER_SECOND};
use crate::player::{OfficerRoster, OfficerTerm, Player};
use crate::resources::{deduct_resources, Resources};
use crate::units::OfficerType;

/// Combined benefits of every active officer.
///
/// Same shape as a single officer's [`OfficerBenefits`]; percentages add up.
pub type Bonuses = OfficerBenefits;

/// One hire buys a week of service.
pub const OFFICER_TERM_MILLIS: u64 = 7 * 24 * 3600 * MILLIS_PER_SECOND;

impl AddAssign<&OfficerBenefits> for OfficerBenefits {
    fn add_assign(&mut self, rhs: &OfficerBenefits) {
        self.building_speed += rhs.building_speed;
        self.research_speed += rhs.research_speed;
        self.resource_production += rhs.resource_production;
        self.dark_matter_production += rhs.dark_matter_production;
        self.energy_production += rhs.energy_production;
        self.storage_capacity += rhs.storage_capacity;
        self.defense += rhs.defense;
        self.fleet_speed += rhs.fleet_speed;
        self.fuel_reduction += rhs.fuel_reduction;
        self.additional_build_queue += rhs.additional_build_queue;
        self.additional_fleet_slots += rhs.additional_fleet_slots;
    }
}

/// Multiplier for a percentage bonus: `1 + percent / 100`.
#[must_use]
pub fn percent_factor(percent: f64) -> f64 {
    1.0 + percent / 100.0
}

/// Sum of the benefits of every officer active at `now`.
#[must_use]
pub fn calculate_active_bonuses(
    roster: &OfficerRoster,
    config: &GameConfig,
    now: Timestamp,
) -> Bonuses {
    let mut bonuses = Bonuses::default();
    for officer in roster.active_at(now) {
        bonuses += &config.officer(officer).benefits;
    }
    bonuses
}

/// Hire `officer` for one week, paying from `wallet`.
///
/// Hiring an officer that is still active extends its current term by a
/// week. Returns the new expiry time.
///
/// # Errors
///
/// [`GameError::InsufficientResources`](crate::error::GameError::InsufficientResources)
/// if `wallet` cannot cover the hire cost.
pub fn hire_officer(
    player: &mut Player,
    wallet: &mut Resources,
    config: &GameConfig,
    officer: OfficerType,
    now: Timestamp,
) -> Result<Timestamp> {
    let cost = config.officer(officer).cost;
    wallet.ensure_available(&cost)?;
    deduct_resources(wallet, &cost);

    let term = match player.officers.term(officer) {
        Some(term) if term.is_active(now) => OfficerTerm {
            hired_at: term.hired_at,
            expires_at: term.expires_at + OFFICER_TERM_MILLIS,
        },
        _ => OfficerTerm {
            hired_at: now,
            expires_at: now + OFFICER_TERM_MILLIS,
        },
    };
    player.officers.set_term(officer, term);
    debug!(player = %player.id, %officer, expires_at = term.expires_at, "Officer hired");
    Ok(term.expires_at)
}
