//! Stat value objects - the numeric block of a character draft.
//!
//! Provides type safety for stat references instead of magic strings like
//! `"defenseSupport"`. The wire names stay camelCase to match persisted records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// One named stat field of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    /// Trion capacity - forced to the account value in standard mode
    Trion,
    Speed,
    Range,
    Attack,
    DefenseSupport,
    Technique,
}

impl StatKind {
    /// Stats counted against the total ceiling (everything except trion).
    pub const COMBAT: [StatKind; 5] = [
        Self::Speed,
        Self::Range,
        Self::Attack,
        Self::DefenseSupport,
        Self::Technique,
    ];

    /// Returns the field name used in paths and persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trion => "trion",
            Self::Speed => "speed",
            Self::Range => "range",
            Self::Attack => "attack",
            Self::DefenseSupport => "defenseSupport",
            Self::Technique => "technique",
        }
    }

    /// Returns the in-game label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Trion => "トリオン",
            Self::Speed => "速度",
            Self::Range => "射程",
            Self::Attack => "攻撃",
            Self::DefenseSupport => "防御援護",
            Self::Technique => "技術",
        }
    }

    /// Returns every stat, trion first.
    pub fn all() -> [StatKind; 6] {
        [
            Self::Trion,
            Self::Speed,
            Self::Range,
            Self::Attack,
            Self::DefenseSupport,
            Self::Technique,
        ]
    }

    pub fn is_combat(&self) -> bool {
        !matches!(self, Self::Trion)
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trion" => Ok(Self::Trion),
            "speed" => Ok(Self::Speed),
            "range" => Ok(Self::Range),
            "attack" => Ok(Self::Attack),
            "defenseSupport" => Ok(Self::DefenseSupport),
            "technique" => Ok(Self::Technique),
            _ => Err(DomainError::parse(format!("Unknown stat: {}", s))),
        }
    }
}

/// The stat block of a character draft.
///
/// Unknown fields are ignored on read, so records written by the older schema
/// (which carried a `special` stat) load cleanly. Missing fields default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub trion: u32,
    pub speed: u32,
    pub range: u32,
    pub attack: u32,
    pub defense_support: u32,
    pub technique: u32,
}

impl Stats {
    pub fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Trion => self.trion,
            StatKind::Speed => self.speed,
            StatKind::Range => self.range,
            StatKind::Attack => self.attack,
            StatKind::DefenseSupport => self.defense_support,
            StatKind::Technique => self.technique,
        }
    }

    pub fn set(&mut self, kind: StatKind, value: u32) {
        let slot = match kind {
            StatKind::Trion => &mut self.trion,
            StatKind::Speed => &mut self.speed,
            StatKind::Range => &mut self.range,
            StatKind::Attack => &mut self.attack,
            StatKind::DefenseSupport => &mut self.defense_support,
            StatKind::Technique => &mut self.technique,
        };
        *slot = value;
    }

    /// Builder-style setter.
    pub fn with(mut self, kind: StatKind, value: u32) -> Self {
        self.set(kind, value);
        self
    }

    /// Sum of the five combat stats. Trion is not part of the total.
    pub fn combat_total(&self) -> u32 {
        StatKind::COMBAT
            .iter()
            .fold(0u32, |acc, kind| acc.saturating_add(self.get(*kind)))
    }
}
