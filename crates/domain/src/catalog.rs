//! Trigger catalog - the static list of equippable triggers.
//!
//! The catalog is built once (from the built-in table or a JSON file) and is
//! read-only afterwards. Lookups are by name; category queries preserve the
//! order in which entries were declared.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Category of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Melee blades
    Attacker,
    /// Shaped trion bullets
    Shooter,
    /// Gun-type triggers
    Gunner,
    Sniper,
    Defense,
    /// Support triggers, often paired with another trigger
    Option,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attacker => "attacker",
            Self::Shooter => "shooter",
            Self::Gunner => "gunner",
            Self::Sniper => "sniper",
            Self::Defense => "defense",
            Self::Option => "option",
        }
    }

    /// In-game label shown in pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Attacker => "攻撃手",
            Self::Shooter => "射手",
            Self::Gunner => "銃手",
            Self::Sniper => "狙撃手",
            Self::Defense => "防御",
            Self::Option => "オプション",
        }
    }

    pub fn all() -> [TriggerType; 6] {
        [
            Self::Attacker,
            Self::Shooter,
            Self::Gunner,
            Self::Sniper,
            Self::Defense,
            Self::Option,
        ]
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == normalized || t.label() == s.trim())
            .ok_or_else(|| DomainError::parse(format!("Unknown trigger type: {}", s)))
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCatalogEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    /// Name of the trigger this one must be paired with (informational only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
    /// For compound gun entries: the weapon part
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    /// For compound gun entries: the ammunition part
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet: Option<String>,
}

impl TriggerCatalogEntry {
    pub fn new(name: impl Into<String>, trigger_type: TriggerType) -> Self {
        Self {
            name: name.into(),
            trigger_type,
            option: None,
            weapon: None,
            bullet: None,
        }
    }

    pub fn requires(mut self, other: impl Into<String>) -> Self {
        self.option = Some(other.into());
        self
    }

    pub fn compound(mut self, weapon: impl Into<String>, bullet: impl Into<String>) -> Self {
        self.weapon = Some(weapon.into());
        self.bullet = Some(bullet.into());
        self
    }
}

/// Immutable name index over the catalog entries.
#[derive(Debug, Clone, Default)]
pub struct TriggerCatalog {
    entries: Vec<TriggerCatalogEntry>,
    by_name: HashMap<String, usize>,
}

impl TriggerCatalog {
    /// Build an index from entries. Duplicate names are rejected.
    pub fn from_entries(entries: Vec<TriggerCatalogEntry>) -> Result<Self, DomainError> {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(DomainError::constraint(format!(
                    "Catalog entry {} has an empty name",
                    index
                )));
            }
            if by_name.insert(entry.name.clone(), index).is_some() {
                return Err(DomainError::constraint(format!(
                    "Duplicate catalog entry: {}",
                    entry.name
                )));
            }
        }
        Ok(Self { entries, by_name })
    }

    pub fn by_name(&self, name: &str) -> Option<&TriggerCatalogEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Distinct categories in first-appearance order.
    pub fn categories(&self) -> Vec<TriggerType> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.trigger_type) {
                seen.push(entry.trigger_type);
            }
        }
        seen
    }

    pub fn entries_of_type(&self, trigger_type: TriggerType) -> Vec<&TriggerCatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.trigger_type == trigger_type)
            .collect()
    }

    pub fn entries(&self) -> &[TriggerCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The stock Border trigger set.
    pub fn builtin() -> Self {
        use TriggerType as T;

        let entries = vec![
            TriggerCatalogEntry::new("弧月", T::Attacker),
            TriggerCatalogEntry::new("旋空", T::Attacker).requires("弧月"),
            TriggerCatalogEntry::new("幻踊", T::Attacker).requires("弧月"),
            TriggerCatalogEntry::new("スコーピオン", T::Attacker),
            TriggerCatalogEntry::new("レイガスト", T::Attacker),
            TriggerCatalogEntry::new("スラスター", T::Attacker).requires("レイガスト"),
            TriggerCatalogEntry::new("アステロイド", T::Shooter),
            TriggerCatalogEntry::new("ハウンド", T::Shooter),
            TriggerCatalogEntry::new("メテオラ", T::Shooter),
            TriggerCatalogEntry::new("バイパー", T::Shooter),
            TriggerCatalogEntry::new("拳銃(アステロイド)", T::Gunner).compound("拳銃", "アステロイド"),
            TriggerCatalogEntry::new("拳銃(ハウンド)", T::Gunner).compound("拳銃", "ハウンド"),
            TriggerCatalogEntry::new("突撃銃(アステロイド)", T::Gunner)
                .compound("突撃銃", "アステロイド"),
            TriggerCatalogEntry::new("突撃銃(メテオラ)", T::Gunner).compound("突撃銃", "メテオラ"),
            TriggerCatalogEntry::new("散弾銃(アステロイド)", T::Gunner)
                .compound("散弾銃", "アステロイド"),
            TriggerCatalogEntry::new("イーグレット", T::Sniper),
            TriggerCatalogEntry::new("アイビス", T::Sniper),
            TriggerCatalogEntry::new("ライトニング", T::Sniper),
            TriggerCatalogEntry::new("シールド", T::Defense),
            TriggerCatalogEntry::new("エスクード", T::Defense),
            TriggerCatalogEntry::new("カメレオン", T::Option),
            TriggerCatalogEntry::new("グラスホッパー", T::Option),
            TriggerCatalogEntry::new("スパイダー", T::Option),
            TriggerCatalogEntry::new("スタアメーカー", T::Option),
            TriggerCatalogEntry::new("バッグワーム", T::Option),
            TriggerCatalogEntry::new("鉛弾", T::Option),
            TriggerCatalogEntry::new("ダミービーコン", T::Option),
        ];

        // Names above are unique; index directly.
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
        Self { entries, by_name }
    }
}
