//! Static configuration tables.
//!
//! Buildings, technologies, ships, defenses and officers are data, not logic:
//! the rest of the core looks them up read-only by kind. [`GameConfig`]
//! defaults to the standard tables and can be replaced by a RON document.
//!
//! **Note:** This module contains no IO. Callers read the file and hand the
//! text to [`GameConfig::from_ron`].

mod building_data;
mod officer_data;
mod tech_data;
mod unit_data;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use building_data::{first_unmet, BuildingData, Requirement, Requirements};
pub use officer_data::{OfficerBenefits, OfficerData};
pub use tech_data::TechData;
pub use unit_data::{CombatStats, DefenseData, ShipData};

use crate::error::{GameError, Result};
use crate::units::{BuildingType, DefenseType, Kind, OfficerType, ShipType, TechnologyType};

/// Moon formation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonConfig {
    /// Debris (metal + crystal) needed before a moon can form.
    pub min_debris: f64,
    /// Chance in percent at exactly `min_debris`.
    pub base_chance: f64,
    /// Upper bound of the chance, percent.
    pub max_chance: f64,
    /// Additional debris per extra percent of chance.
    pub chance_per_debris: f64,
    /// Fields available on a fresh moon.
    pub base_size: u32,
    /// Extra fields per lunar base level.
    pub lunar_base_space_bonus: u32,
}

impl Default for MoonConfig {
    fn default() -> Self {
        Self {
            min_debris: 100_000.0,
            base_chance: 1.0,
            max_chance: 20.0,
            chance_per_debris: 100_000.0,
            base_size: 100,
            lunar_base_space_bonus: 3,
        }
    }
}

/// Raw shape of a config document before validation.
#[derive(Deserialize)]
#[serde(rename = "GameConfig")]
struct GameConfigFile {
    buildings: BTreeMap<BuildingType, BuildingData>,
    technologies: BTreeMap<TechnologyType, TechData>,
    ships: BTreeMap<ShipType, ShipData>,
    defenses: BTreeMap<DefenseType, DefenseData>,
    officers: BTreeMap<OfficerType, OfficerData>,
    #[serde(default)]
    moon: MoonConfig,
}

/// Validated game tables.
///
/// Every kind of every table has an entry, so the lookups never fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GameConfigFile")]
pub struct GameConfig {
    buildings: BTreeMap<BuildingType, BuildingData>,
    technologies: BTreeMap<TechnologyType, TechData>,
    ships: BTreeMap<ShipType, ShipData>,
    defenses: BTreeMap<DefenseType, DefenseData>,
    officers: BTreeMap<OfficerType, OfficerData>,
    moon: MoonConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            buildings: building_data::standard_buildings(),
            technologies: tech_data::standard_technologies(),
            ships: unit_data::standard_ships(),
            defenses: unit_data::standard_defenses(),
            officers: officer_data::standard_officers(),
            moon: MoonConfig::default(),
        }
    }
}

impl TryFrom<GameConfigFile> for GameConfig {
    type Error = GameError;

    fn try_from(file: GameConfigFile) -> Result<Self> {
        require_complete(&file.buildings, "building")?;
        require_complete(&file.technologies, "technology")?;
        require_complete(&file.ships, "ship")?;
        require_complete(&file.defenses, "defense")?;
        require_complete(&file.officers, "officer")?;

        for (kind, data) in &file.buildings {
            require_non_negative(kind, &data.base_cost, &[data.cost_multiplier])?;
            if data.planet_only && data.moon_only {
                return Err(GameError::InvalidConfig(format!(
                    "{kind} cannot be both planet_only and moon_only"
                )));
            }
        }
        for (kind, data) in &file.technologies {
            require_non_negative(kind, &data.base_cost, &[data.cost_multiplier])?;
        }
        for (kind, data) in &file.ships {
            let c = data.combat;
            require_non_negative(
                kind,
                &data.cost,
                &[data.cargo_capacity, c.attack, c.shield, data.fuel_consumption],
            )?;
            if data.speed <= 0.0 || c.armor <= 0.0 {
                return Err(GameError::InvalidConfig(format!(
                    "{kind} needs positive speed and armor"
                )));
            }
        }
        for (kind, data) in &file.defenses {
            let c = data.combat;
            require_non_negative(kind, &data.cost, &[c.attack, c.shield])?;
            if c.armor <= 0.0 {
                return Err(GameError::InvalidConfig(format!(
                    "{kind} needs positive armor"
                )));
            }
        }
        for (kind, data) in &file.officers {
            require_non_negative(kind, &data.cost, &[])?;
            require_non_negative(kind, &data.weekly_maintenance, &[])?;
        }

        let moon = file.moon;
        if moon.chance_per_debris <= 0.0 || moon.max_chance < 0.0 || moon.min_debris < 0.0 {
            return Err(GameError::InvalidConfig(
                "moon settings must be non-negative with positive chance_per_debris".into(),
            ));
        }

        Ok(Self {
            buildings: file.buildings,
            technologies: file.technologies,
            ships: file.ships,
            defenses: file.defenses,
            officers: file.officers,
            moon,
        })
    }
}

fn require_complete<K: Kind + std::fmt::Display, V>(
    table: &BTreeMap<K, V>,
    what: &str,
) -> Result<()> {
    match K::ALL.iter().find(|k| !table.contains_key(k)) {
        Some(missing) => Err(GameError::InvalidConfig(format!(
            "missing {what} entry: {missing}"
        ))),
        None => Ok(()),
    }
}

fn require_non_negative(
    kind: &impl std::fmt::Display,
    cost: &crate::resources::Resources,
    values: &[f64],
) -> Result<()> {
    if cost.has_negative() || values.iter().any(|v| *v < 0.0 || v.is_nan()) {
        return Err(GameError::InvalidConfig(format!(
            "{kind} has a negative value"
        )));
    }
    Ok(())
}

impl GameConfig {
    /// Parse and validate a RON document.
    ///
    /// # Errors
    ///
    /// [`GameError::ConfigParse`] on malformed RON,
    /// [`GameError::InvalidConfig`] when a table is incomplete or holds a
    /// negative value.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str::<GameConfigFile>(text)
            .map_err(|e| GameError::ConfigParse(e.to_string()))?
            .try_into()
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// [`GameError::ConfigParse`] if serialization fails.
    pub fn to_ron_pretty(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::ConfigParse(e.to_string()))
    }

    /// Building definition.
    #[must_use]
    pub fn building(&self, kind: BuildingType) -> &BuildingData {
        &self.buildings[&kind]
    }

    /// Technology definition.
    #[must_use]
    pub fn technology(&self, kind: TechnologyType) -> &TechData {
        &self.technologies[&kind]
    }

    /// Ship definition.
    #[must_use]
    pub fn ship(&self, kind: ShipType) -> &ShipData {
        &self.ships[&kind]
    }

    /// Defense definition.
    #[must_use]
    pub fn defense(&self, kind: DefenseType) -> &DefenseData {
        &self.defenses[&kind]
    }

    /// Officer definition.
    #[must_use]
    pub fn officer(&self, kind: OfficerType) -> &OfficerData {
        &self.officers[&kind]
    }

    /// Moon formation settings.
    #[must_use]
    pub fn moon(&self) -> &MoonConfig {
        &self.moon
    }
}
