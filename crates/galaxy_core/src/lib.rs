//! # Galaxy Core
//!
//! Deterministic simulation core for a persistent space-strategy universe.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No hidden global state
//! - No system randomness (generators are passed in)
//!
//! World state advances lazily. A planet's stock is integrated from its
//! `last_update` whenever it is touched, and fleet events are resolved when
//! their owner's state is stepped.
//!
//! ## Crate Structure
//!
//! - [`economy`] - Production, storage and resource integration
//! - [`production`] - Construction and research queues
//! - [`fleet`] - Fleet dispatch and the mission state machine
//! - [`combat`] - Round-based battle resolution
//! - [`moon`] - Moon formation from debris
//! - [`bonuses`] - Officer bonuses and hiring
//! - [`data`] - Static game tables
//! - [`simulation`] - The [`Universe`](simulation::Universe) that ties it together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod bonuses;
pub mod combat;
pub mod data;
pub mod economy;
pub mod error;
pub mod fleet;
pub mod moon;
pub mod planet;
pub mod player;
pub mod production;
pub mod resources;
pub mod simulation;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bonuses::{calculate_active_bonuses, Bonuses};
    pub use crate::combat::{simulate_battle, BattleInput, BattleParties, BattleResult, BattleWinner};
    pub use crate::data::GameConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::fleet::{DispatchRequest, FleetMission, MissionKind, MissionReport, MissionStatus, SpyReport};
    pub use crate::planet::{
        Coordinates, MissionId, Planet, PlanetId, PlanetRegistry, PlayerId, ReportId, Timestamp,
    };
    pub use crate::player::Player;
    pub use crate::production::{BuildOrder, QueueItem};
    pub use crate::resources::Resources;
    pub use crate::simulation::Universe;
    pub use crate::units::{
        BuildingType, Defense, DefenseType, Fleet, Kind, OfficerType, ShipType, TechnologyType,
    };
}
