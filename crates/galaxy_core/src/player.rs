//! Players and their hired officers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::planet::{PlayerId, Timestamp};
use crate::units::{OfficerType, TechLevels};

/// Service window of one hired officer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfficerTerm {
    /// When the current term started.
    pub hired_at: Timestamp,
    /// First instant the officer is no longer active.
    pub expires_at: Timestamp,
}

impl OfficerTerm {
    /// True while `now` lies in `[hired_at, expires_at)`.
    #[must_use]
    pub const fn is_active(&self, now: Timestamp) -> bool {
        self.hired_at <= now && now < self.expires_at
    }
}

/// Officers a player has hired, active or lapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfficerRoster {
    terms: BTreeMap<OfficerType, OfficerTerm>,
}

impl OfficerRoster {
    /// Empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Term of `officer`, if ever hired.
    #[must_use]
    pub fn term(&self, officer: OfficerType) -> Option<OfficerTerm> {
        self.terms.get(&officer).copied()
    }

    /// Record a term, replacing any previous one.
    pub fn set_term(&mut self, officer: OfficerType, term: OfficerTerm) {
        self.terms.insert(officer, term);
    }

    /// Officers active at `now`, in declaration order.
    pub fn active_at(&self, now: Timestamp) -> impl Iterator<Item = OfficerType> + '_ {
        self.terms
            .iter()
            .filter(move |(_, term)| term.is_active(now))
            .map(|(&officer, _)| officer)
    }
}

/// A participant in the universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Hired officers.
    pub officers: OfficerRoster,
    /// Researched technology levels.
    pub technologies: TechLevels,
}

impl Player {
    /// A new player with no officers or research.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            officers: OfficerRoster::new(),
            technologies: TechLevels::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_window_is_half_open() {
        let term = OfficerTerm {
            hired_at: 100,
            expires_at: 200,
        };
        assert!(!term.is_active(99));
        assert!(term.is_active(100));
        assert!(term.is_active(199));
        assert!(!term.is_active(200));
    }

    #[test]
    fn test_active_at_filters_lapsed_officers() {
        let mut roster = OfficerRoster::new();
        roster.set_term(
            OfficerType::Geologist,
            OfficerTerm {
                hired_at: 0,
                expires_at: 1000,
            },
        );
        roster.set_term(
            OfficerType::Admiral,
            OfficerTerm {
                hired_at: 0,
                expires_at: 10,
            },
        );

        let active: Vec<_> = roster.active_at(500).collect();
        assert_eq!(active, vec![OfficerType::Geologist]);
    }
}
