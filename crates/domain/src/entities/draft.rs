//! Character draft and the typed field updates that edit it.
//!
//! Every legal edit is a [`FieldUpdate`] variant carrying a value of the right
//! type. Callers that only have a dotted path (`"stats.trion"`) go through
//! [`FieldPath`], which is the single place an unknown path can be reported.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::{SlotKind, StatKind, Stats, TriggerSlots};

/// The in-progress character being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterDraft {
    pub name: String,
    pub stats: Stats,
    pub triggers: TriggerSlots,
}

impl CharacterDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_triggers(mut self, triggers: TriggerSlots) -> Self {
        self.triggers = triggers;
        self
    }

    /// Whitespace-only names count as blank.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Apply a typed update in place.
    ///
    /// Slot writes that would exceed capacity are refused and leave the draft
    /// untouched.
    pub fn apply(&mut self, update: FieldUpdate) -> Result<(), DomainError> {
        match update {
            FieldUpdate::Name(name) => self.name = name,
            FieldUpdate::Stat(kind, value) => self.stats.set(kind, value),
            FieldUpdate::Slots(kind, names) => self.triggers.set_list(kind, names)?,
            FieldUpdate::Slot(kind, index, name) => self.triggers.set_slot(kind, index, name)?,
            FieldUpdate::ClearSlot(kind, index) => self.triggers.clear_slot(kind, index)?,
        }
        Ok(())
    }
}

/// A typed edit to one field of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "field", content = "value")]
pub enum FieldUpdate {
    /// `name`
    Name(String),
    /// `stats.<stat>`
    Stat(StatKind, u32),
    /// `triggers.<main|sub>` - whole list
    Slots(SlotKind, Vec<String>),
    /// `triggers.<main|sub>.<index>` - one slot
    Slot(SlotKind, usize, String),
    /// Empty one slot
    ClearSlot(SlotKind, usize),
}

impl FieldUpdate {
    pub fn path(&self) -> FieldPath {
        match self {
            Self::Name(_) => FieldPath::Name,
            Self::Stat(kind, _) => FieldPath::Stat(*kind),
            Self::Slots(kind, _) => FieldPath::Slots(*kind),
            Self::Slot(kind, index, _) | Self::ClearSlot(kind, index) => {
                FieldPath::Slot(*kind, *index)
            }
        }
    }
}

/// An untyped value arriving alongside a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(u32),
    Text(String),
    List(Vec<String>),
}

/// A parsed dotted path into the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Name,
    Stat(StatKind),
    Slots(SlotKind),
    Slot(SlotKind, usize),
}

impl FieldPath {
    /// Pair the path with a value, checking the value's type.
    pub fn with_value(self, value: FieldValue) -> Result<FieldUpdate, DomainError> {
        match (self, value) {
            (Self::Name, FieldValue::Text(name)) => Ok(FieldUpdate::Name(name)),
            (Self::Stat(kind), FieldValue::Number(n)) => Ok(FieldUpdate::Stat(kind, n)),
            (Self::Slots(kind), FieldValue::List(names)) => Ok(FieldUpdate::Slots(kind, names)),
            (Self::Slot(kind, index), FieldValue::Text(name)) if name.is_empty() => {
                Ok(FieldUpdate::ClearSlot(kind, index))
            }
            (Self::Slot(kind, index), FieldValue::Text(name)) => {
                Ok(FieldUpdate::Slot(kind, index, name))
            }
            (path, value) => Err(DomainError::validation(format!(
                "Value {:?} does not fit field {}",
                value, path
            ))),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Stat(kind) => write!(f, "stats.{}", kind),
            Self::Slots(kind) => write!(f, "triggers.{}", kind),
            Self::Slot(kind, index) => write!(f, "triggers.{}.{}", kind, index),
        }
    }
}

impl FromStr for FieldPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::invalid_path(s);
        let segments: Vec<&str> = s.split('.').collect();

        match segments.as_slice() {
            ["name"] => Ok(Self::Name),
            ["stats", stat] => stat.parse().map(Self::Stat).map_err(|_| invalid()),
            ["triggers", list] => list.parse().map(Self::Slots).map_err(|_| invalid()),
            ["triggers", list, index] => {
                let kind: SlotKind = list.parse().map_err(|_| invalid())?;
                let index: usize = index.parse().map_err(|_| invalid())?;
                Ok(Self::Slot(kind, index))
            }
            _ => Err(invalid()),
        }
    }
}
