//! Error types for the simulation core.
//!
//! Mission outcomes never produce errors (a failed colonization or a vanished
//! target are regular outcomes). Errors are reserved for rejected requests:
//! dispatching a fleet, queueing construction, hiring officers, and loading
//! configuration tables.

use thiserror::Error;

use crate::planet::PlayerId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation requests.
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration file failed to parse.
    #[error("Failed to parse game config: {0}")]
    ConfigParse(String),

    /// Configuration tables are incomplete or contain invalid values.
    #[error("Invalid game config: {0}")]
    InvalidConfig(String),

    /// No planet at the given registry key.
    #[error("Planet not found: {0}")]
    PlanetNotFound(String),

    /// No player with the given id.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The acting player does not own the planet.
    #[error("Player {player} does not own planet {planet}")]
    NotPlanetOwner {
        /// Acting player.
        player: PlayerId,
        /// Registry key of the planet.
        planet: String,
    },

    /// A fleet must contain at least one ship.
    #[error("Fleet is empty")]
    EmptyFleet,

    /// A ship or defense batch must build at least one unit.
    #[error("Build batch is empty")]
    EmptyBatch,

    /// Not enough ships of a class at the origin.
    #[error("Insufficient ships: need {requested} {ship}, have {available}")]
    InsufficientShips {
        /// Ship class name.
        ship: String,
        /// Requested count.
        requested: u32,
        /// Count stationed at the origin.
        available: u32,
    },

    /// Insufficient resources.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource name.
        resource: String,
        /// Amount required.
        required: f64,
        /// Amount available.
        available: f64,
    },

    /// Cargo exceeds the fleet's hold.
    #[error("Cargo {cargo} exceeds fleet capacity {capacity}")]
    CargoExceedsCapacity {
        /// Total cargo requested.
        cargo: f64,
        /// Total cargo capacity of the fleet.
        capacity: f64,
    },

    /// A mission needs a specific ship class that the fleet lacks.
    #[error("Mission requires at least one {0}")]
    MissingMissionShip(String),

    /// All fleet slots are occupied.
    #[error("No free fleet slots ({max} in use)")]
    FleetSlotsExhausted {
        /// Slot limit for the player.
        max: usize,
    },

    /// Construction or research queue is full.
    #[error("Queue is full ({max} slots)")]
    QueueFull {
        /// Slot limit for the lane.
        max: usize,
    },

    /// Building or tech requirement not met.
    #[error("Requirement not met: {0}")]
    RequirementNotMet(String),

    /// Not enough free planet space for another building level.
    #[error("Not enough space: {used} of {max} fields used, need {needed}")]
    NotEnoughSpace {
        /// Fields in use.
        used: u32,
        /// Planet field budget.
        max: u32,
        /// Fields the upgrade needs.
        needed: u32,
    },

    /// Building cannot be placed on this kind of body.
    #[error("{0} cannot be built here")]
    PlacementNotAllowed(String),

    /// Queue item index out of range.
    #[error("No queue item at index {0}")]
    QueueItemNotFound(usize),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
