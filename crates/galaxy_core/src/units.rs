//! Closed enumerations of ship, defense, building, technology and officer
//! kinds, and the sparse count map keyed by them.
//!
//! Every lookup through [`CountMap::get`] defaults to zero, so planets and
//! missions can carry sparse compositions without ever holding a negative
//! or missing count.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Behaviour shared by every closed kind enumeration.
pub trait Kind: Copy + Ord + fmt::Debug + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// Stable snake_case identifier used in config files and the CLI.
    fn name(self) -> &'static str;

    /// Look up a variant by its [`name`](Kind::name).
    #[must_use]
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

macro_rules! closed_kind {
    (
        $(#[$meta:meta])*
        $vis:vis enum $ty:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $name:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        $vis enum $ty {
            $( $(#[$vmeta])* $variant, )+
        }

        impl Kind for $ty {
            const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_name(s).ok_or_else(|| format!("unknown {}: {s}", stringify!($ty)))
            }
        }
    };
}

closed_kind! {
    /// Ship classes.
    pub enum ShipType {
        /// Cheap fighter.
        LightFighter => "light_fighter",
        /// Armoured fighter.
        HeavyFighter => "heavy_fighter",
        /// Medium warship.
        Cruiser => "cruiser",
        /// Heavy warship.
        Battleship => "battleship",
        /// Small transport.
        SmallCargo => "small_cargo",
        /// Large transport.
        LargeCargo => "large_cargo",
        /// Founds new colonies; consumed on success.
        ColonyShip => "colony_ship",
        /// Debris collector.
        Recycler => "recycler",
        /// Scout used by spy missions.
        EspionageProbe => "espionage_probe",
        /// Dark matter gatherer.
        DarkMatterHarvester => "dark_matter_harvester",
    }
}

closed_kind! {
    /// Stationary defense structures.
    pub enum DefenseType {
        /// Basic launcher.
        RocketLauncher => "rocket_launcher",
        /// Light laser turret.
        LightLaser => "light_laser",
        /// Heavy laser turret.
        HeavyLaser => "heavy_laser",
        /// Gauss cannon.
        GaussCannon => "gauss_cannon",
        /// Ion cannon.
        IonCannon => "ion_cannon",
        /// Plasma turret.
        PlasmaTurret => "plasma_turret",
        /// Small planetary shield.
        SmallShieldDome => "small_shield_dome",
        /// Large planetary shield.
        LargeShieldDome => "large_shield_dome",
    }
}

closed_kind! {
    /// Planet and moon buildings.
    pub enum BuildingType {
        /// Metal extractor.
        MetalMine => "metal_mine",
        /// Crystal extractor.
        CrystalMine => "crystal_mine",
        /// Deuterium (fuel) synthesizer.
        DeuteriumSynthesizer => "deuterium_synthesizer",
        /// Energy source.
        SolarPlant => "solar_plant",
        /// Construction speed.
        RoboticsFactory => "robotics_factory",
        /// Extra construction queue per level.
        NaniteFactory => "nanite_factory",
        /// Builds ships and defenses.
        Shipyard => "shipyard",
        /// Enables research.
        ResearchLab => "research_lab",
        /// Metal capacity.
        MetalStorage => "metal_storage",
        /// Crystal capacity.
        CrystalStorage => "crystal_storage",
        /// Deuterium capacity.
        DeuteriumTank => "deuterium_tank",
        /// Dark matter production and capacity.
        DarkMatterCollector => "dark_matter_collector",
        /// Moon only: extra moon fields.
        LunarBase => "lunar_base",
        /// Moon only.
        SensorPhalanx => "sensor_phalanx",
        /// Moon only.
        JumpGate => "jump_gate",
    }
}

closed_kind! {
    /// Researchable technologies.
    pub enum TechnologyType {
        /// Energy technology.
        Energy => "energy_technology",
        /// Laser technology.
        Laser => "laser_technology",
        /// Ion technology.
        Ion => "ion_technology",
        /// Hyperspace technology.
        Hyperspace => "hyperspace_technology",
        /// Plasma technology.
        Plasma => "plasma_technology",
        /// Extra research queue per level.
        Computer => "computer_technology",
        /// Combustion drive.
        CombustionDrive => "combustion_drive",
        /// Impulse drive.
        ImpulseDrive => "impulse_drive",
        /// Hyperspace drive.
        HyperspaceDrive => "hyperspace_drive",
        /// Dark matter technology.
        DarkMatter => "dark_matter_technology",
    }
}

closed_kind! {
    /// Hireable officer roles.
    pub enum OfficerType {
        /// Construction and storage.
        Commander => "commander",
        /// Fleet slots and speed.
        Admiral => "admiral",
        /// Defense and energy.
        Engineer => "engineer",
        /// Resource production.
        Geologist => "geologist",
        /// Research speed.
        Technocrat => "technocrat",
        /// Dark matter production.
        DarkMatterSpecialist => "dark_matter_specialist",
    }
}

/// Sparse, non-negative count per kind.
///
/// Zero counts are never stored; [`get`](Self::get) returns zero for absent
/// keys. Iteration follows the kind's declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "K: Serialize",
    deserialize = "K: Deserialize<'de>"
))]
pub struct CountMap<K: Kind> {
    counts: BTreeMap<K, u32>,
}

/// Ship counts.
pub type Fleet = CountMap<ShipType>;
/// Defense structure counts.
pub type Defense = CountMap<DefenseType>;
/// Building levels.
pub type BuildingLevels = CountMap<BuildingType>;
/// Technology levels.
pub type TechLevels = CountMap<TechnologyType>;

impl<K: Kind> Default for CountMap<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Kind> CountMap<K> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `kind`, zero if absent.
    #[must_use]
    pub fn get(&self, kind: K) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Overwrite the count for `kind`.
    pub fn set(&mut self, kind: K, count: u32) {
        if count == 0 {
            self.counts.remove(&kind);
        } else {
            self.counts.insert(kind, count);
        }
    }

    /// Add `count` units of `kind`.
    pub fn add(&mut self, kind: K, count: u32) {
        let current = self.get(kind);
        self.set(kind, current.saturating_add(count));
    }

    /// Remove up to `count` units of `kind`, flooring at zero.
    ///
    /// Returns how many were actually removed.
    pub fn remove(&mut self, kind: K, count: u32) -> u32 {
        let current = self.get(kind);
        let removed = current.min(count);
        self.set(kind, current - removed);
        removed
    }

    /// Add every count of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for (kind, count) in other.iter() {
            self.add(kind, count);
        }
    }

    /// Remove every count of `other` from `self`, flooring each at zero.
    pub fn subtract_floor(&mut self, other: &Self) {
        for (kind, count) in other.iter() {
            self.remove(kind, count);
        }
    }

    /// Per-kind `self - after`, keeping only positive differences.
    #[must_use]
    pub fn losses_to(&self, after: &Self) -> Self {
        let mut losses = Self::new();
        for (kind, before) in self.iter() {
            losses.set(kind, before.saturating_sub(after.get(kind)));
        }
        losses
    }

    /// First kind where `self` holds fewer than `required`, as
    /// `(kind, required, available)`.
    #[must_use]
    pub fn shortfall(&self, required: &Self) -> Option<(K, u32, u32)> {
        required
            .iter()
            .find(|&(kind, count)| self.get(kind) < count)
            .map(|(kind, count)| (kind, count, self.get(kind)))
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// True when every count is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate `(kind, count)` pairs with non-zero counts.
    pub fn iter(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        self.counts.iter().map(|(&k, &c)| (k, c))
    }
}

impl<K: Kind> FromIterator<(K, u32)> for CountMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (kind, count) in iter {
            map.add(kind, count);
        }
        map
    }
}

impl<K: Kind, const N: usize> From<[(K, u32); N]> for CountMap<K> {
    fn from(entries: [(K, u32); N]) -> Self {
        entries.into_iter().collect()
    }
}
