//! Trigger slot lists (main / sub).
//!
//! Each list is an ordered sequence of catalog names with at most
//! [`SLOT_CAPACITY`] entries. An empty slot is an empty string, so a list can
//! hold interior gaps (`["弧月", "", "シールド"]`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Number of slots in each of the main and sub lists.
pub const SLOT_CAPACITY: usize = 4;

/// Which of the two slot lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Main,
    Sub,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Sub => "sub",
        }
    }

    pub fn all() -> [SlotKind; 2] {
        [Self::Main, Self::Sub]
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SlotKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "sub" => Ok(Self::Sub),
            _ => Err(DomainError::parse(format!("Unknown slot list: {}", s))),
        }
    }
}

/// Returns true when a slot value represents "no trigger".
pub fn is_empty_slot(name: &str) -> bool {
    name.trim().is_empty()
}

/// The two trigger lists of a draft.
///
/// Fields are public so a record loaded from storage is represented as-is,
/// even when it violates capacity; the checked setters below are what the
/// draft store uses for edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSlots {
    pub main: Vec<String>,
    pub sub: Vec<String>,
}

impl TriggerSlots {
    pub fn list(&self, kind: SlotKind) -> &[String] {
        match kind {
            SlotKind::Main => &self.main,
            SlotKind::Sub => &self.sub,
        }
    }

    fn list_mut(&mut self, kind: SlotKind) -> &mut Vec<String> {
        match kind {
            SlotKind::Main => &mut self.main,
            SlotKind::Sub => &mut self.sub,
        }
    }

    /// Replace a whole list, refusing more than [`SLOT_CAPACITY`] entries.
    pub fn set_list(&mut self, kind: SlotKind, names: Vec<String>) -> Result<(), DomainError> {
        if names.len() > SLOT_CAPACITY {
            return Err(DomainError::container_full(
                names.len() as u32,
                SLOT_CAPACITY as u32,
            ));
        }
        *self.list_mut(kind) = names;
        Ok(())
    }

    /// Put `name` into slot `index`, padding with empty slots up to it.
    pub fn set_slot(
        &mut self,
        kind: SlotKind,
        index: usize,
        name: impl Into<String>,
    ) -> Result<(), DomainError> {
        if index >= SLOT_CAPACITY {
            return Err(DomainError::validation(format!(
                "Slot index {} out of range for {} (capacity {})",
                index, kind, SLOT_CAPACITY
            )));
        }
        let list = self.list_mut(kind);
        while list.len() <= index {
            list.push(String::new());
        }
        list[index] = name.into();
        Ok(())
    }

    /// Empty slot `index`. Clearing a slot past the end of the list is a no-op.
    pub fn clear_slot(&mut self, kind: SlotKind, index: usize) -> Result<(), DomainError> {
        if index >= SLOT_CAPACITY {
            return Err(DomainError::validation(format!(
                "Slot index {} out of range for {} (capacity {})",
                index, kind, SLOT_CAPACITY
            )));
        }
        if let Some(slot) = self.list_mut(kind).get_mut(index) {
            slot.clear();
        }
        Ok(())
    }

    /// Non-empty names of one list, in slot order.
    pub fn occupied(&self, kind: SlotKind) -> impl Iterator<Item = &str> {
        self.list(kind)
            .iter()
            .map(String::as_str)
            .filter(|name| !is_empty_slot(name))
    }
}
