//! Validation engine for character drafts.
//!
//! `Validator::validate` is a pure function of (draft, mode, limits): it never
//! mutates anything and always returns every violated rule, so the caller can
//! render inline messages and gate saving on `is_empty()`.
//!
//! # Rules
//!
//! 1. Combat-stat total must not exceed the ceiling (account limit in standard
//!    mode, a fixed ceiling in VIP mode).
//! 2. Each stat must lie inside its per-mode bounds. Standard mode pins trion
//!    to the account's fixed value.
//! 3. The save requirements (technique / defenseSupport / attack minimums)
//!    must be met regardless of mode. This overlaps rule 2 on purpose: both
//!    are reported.
//! 4. Slot lists hold at most [`SLOT_CAPACITY`] entries.
//! 5. Every non-empty slot must name a catalog entry of an allowed category.
//! 6. The name must not be blank.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{TriggerCatalog, TriggerType};
use crate::entities::CharacterDraft;
use crate::value_objects::{AccountLimits, EditMode, SlotKind, StatKind, Stats, SLOT_CAPACITY};

/// Inclusive bounds for one stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBounds {
    pub min: u32,
    pub max: u32,
}

impl StatBounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Whether the field is effectively read-only (a single legal value).
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }
}

/// Tunable numbers behind the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRules {
    /// Upper bound for each combat stat in standard mode
    pub standard_stat_max: u32,
    /// Upper bound for each combat stat in VIP mode
    pub vip_stat_max: u32,
    /// Total ceiling in VIP mode (replaces the account limit)
    pub vip_total_ceiling: u32,
    /// Trion upper bound in VIP mode (lower bound is 0)
    pub vip_trion_max: u32,
    /// Per-field lower bounds (trion is ignored here)
    pub minimums: Stats,
    /// Requirements a character must meet to be saved
    pub save_requirements: Stats,
    /// Categories allowed in main slots
    pub main_categories: Vec<TriggerType>,
    /// Categories allowed in sub slots
    pub sub_categories: Vec<TriggerType>,
}

impl Default for StatRules {
    fn default() -> Self {
        let requirements = Stats {
            attack: 7,
            defense_support: 6,
            technique: 8,
            ..Stats::default()
        };
        Self {
            standard_stat_max: 15,
            vip_stat_max: 20,
            vip_total_ceiling: 100,
            vip_trion_max: 100,
            minimums: requirements,
            save_requirements: requirements,
            main_categories: TriggerType::all().to_vec(),
            sub_categories: TriggerType::all().to_vec(),
        }
    }
}

impl StatRules {
    fn allowed_categories(&self, slot: SlotKind) -> &[TriggerType] {
        match slot {
            SlotKind::Main => &self.main_categories,
            SlotKind::Sub => &self.sub_categories,
        }
    }
}

/// A single rule failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "code")]
pub enum Violation {
    StatTotalExceeded {
        total: u32,
        ceiling: u32,
    },
    StatOutOfRange {
        stat: StatKind,
        value: u32,
        min: u32,
        max: u32,
    },
    MinimumRequirementsUnmet {
        unmet: Vec<StatKind>,
    },
    SlotCapacityExceeded {
        slot: SlotKind,
        len: usize,
    },
    UnknownTrigger {
        slot: SlotKind,
        name: String,
    },
    DisallowedCategory {
        slot: SlotKind,
        name: String,
        category: TriggerType,
    },
    NameRequired,
}

impl Violation {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StatTotalExceeded { .. } => "stat_total_exceeded",
            Self::StatOutOfRange { .. } => "stat_out_of_range",
            Self::MinimumRequirementsUnmet { .. } => "minimum_requirements_unmet",
            Self::SlotCapacityExceeded { .. } => "slot_capacity_exceeded",
            Self::UnknownTrigger { .. } => "unknown_trigger",
            Self::DisallowedCategory { .. } => "disallowed_category",
            Self::NameRequired => "name_required",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatTotalExceeded { total, ceiling } => {
                write!(f, "Stat total {} exceeds the limit of {}", total, ceiling)
            }
            Self::StatOutOfRange {
                stat,
                value,
                min,
                max,
            } => write!(f, "{} must be between {} and {} (got {})", stat, min, max, value),
            Self::MinimumRequirementsUnmet { unmet } => {
                let names: Vec<&str> = unmet.iter().map(StatKind::as_str).collect();
                write!(f, "Minimum requirements not met: {}", names.join(", "))
            }
            Self::SlotCapacityExceeded { slot, len } => write!(
                f,
                "{} triggers hold at most {} entries (got {})",
                slot, SLOT_CAPACITY, len
            ),
            Self::UnknownTrigger { slot, name } => {
                write!(f, "Unknown trigger in {} slots: {}", slot, name)
            }
            Self::DisallowedCategory {
                slot,
                name,
                category,
            } => write!(
                f,
                "{} ({}) is not allowed in {} slots",
                name, category, slot
            ),
            Self::NameRequired => write!(f, "Name is required"),
        }
    }
}

/// All violations of a draft, in rule order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationSet(Vec<Violation>);

impl ViolationSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, violation: Violation) {
        if !self.0.contains(&violation) {
            self.0.push(violation);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.0.contains(violation)
    }

    /// True when any violation carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.0.iter().any(|v| v.code() == code)
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for ViolationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Running total against the ceiling, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSummary {
    pub total: u32,
    pub ceiling: u32,
    pub over_limit: bool,
}

/// Evaluates drafts against a rule set and a catalog.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    rules: &'a StatRules,
    catalog: &'a TriggerCatalog,
}

impl<'a> Validator<'a> {
    pub fn new(rules: &'a StatRules, catalog: &'a TriggerCatalog) -> Self {
        Self { rules, catalog }
    }

    pub fn total_ceiling(&self, mode: EditMode, limits: &AccountLimits) -> u32 {
        match mode {
            EditMode::Standard => limits.max_stat_total,
            EditMode::Vip => self.rules.vip_total_ceiling,
        }
    }

    /// Legal range for `stat` under `mode`.
    pub fn bounds(&self, stat: StatKind, mode: EditMode, limits: &AccountLimits) -> StatBounds {
        match (stat, mode) {
            (StatKind::Trion, EditMode::Standard) => {
                StatBounds::new(limits.fixed_trion, limits.fixed_trion)
            }
            (StatKind::Trion, EditMode::Vip) => StatBounds::new(0, self.rules.vip_trion_max),
            (stat, EditMode::Standard) => {
                StatBounds::new(self.rules.minimums.get(stat), self.rules.standard_stat_max)
            }
            (stat, EditMode::Vip) => {
                StatBounds::new(self.rules.minimums.get(stat), self.rules.vip_stat_max)
            }
        }
    }

    pub fn summary(&self, stats: &Stats, mode: EditMode, limits: &AccountLimits) -> StatSummary {
        let total = stats.combat_total();
        let ceiling = self.total_ceiling(mode, limits);
        StatSummary {
            total,
            ceiling,
            over_limit: total > ceiling,
        }
    }

    /// Stats below the save requirements, in field order.
    pub fn unmet_requirements(&self, stats: &Stats) -> Vec<StatKind> {
        StatKind::all()
            .into_iter()
            .filter(|&kind| stats.get(kind) < self.rules.save_requirements.get(kind))
            .collect()
    }

    pub fn validate(
        &self,
        draft: &CharacterDraft,
        mode: EditMode,
        limits: &AccountLimits,
    ) -> ViolationSet {
        let mut violations = ViolationSet::new();

        let summary = self.summary(&draft.stats, mode, limits);
        if summary.over_limit {
            violations.push(Violation::StatTotalExceeded {
                total: summary.total,
                ceiling: summary.ceiling,
            });
        }

        for stat in StatKind::all() {
            let value = draft.stats.get(stat);
            let bounds = self.bounds(stat, mode, limits);
            if !bounds.contains(value) {
                violations.push(Violation::StatOutOfRange {
                    stat,
                    value,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }

        let unmet = self.unmet_requirements(&draft.stats);
        if !unmet.is_empty() {
            violations.push(Violation::MinimumRequirementsUnmet { unmet });
        }

        for slot in SlotKind::all() {
            let len = draft.triggers.list(slot).len();
            if len > SLOT_CAPACITY {
                violations.push(Violation::SlotCapacityExceeded { slot, len });
            }
        }

        for slot in SlotKind::all() {
            for name in draft.triggers.occupied(slot) {
                match self.catalog.by_name(name) {
                    None => violations.push(Violation::UnknownTrigger {
                        slot,
                        name: name.to_string(),
                    }),
                    Some(entry)
                        if !self
                            .rules
                            .allowed_categories(slot)
                            .contains(&entry.trigger_type) =>
                    {
                        violations.push(Violation::DisallowedCategory {
                            slot,
                            name: name.to_string(),
                            category: entry.trigger_type,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        if !draft.has_name() {
            violations.push(Violation::NameRequired);
        }

        violations
    }

    pub fn is_savable(&self, draft: &CharacterDraft, mode: EditMode, limits: &AccountLimits) -> bool {
        self.validate(draft, mode, limits).is_empty()
    }
}

/// Validate with the default rule set.
pub fn validate(
    draft: &CharacterDraft,
    mode: EditMode,
    limits: &AccountLimits,
    catalog: &TriggerCatalog,
) -> ViolationSet {
    let rules = StatRules::default();
    Validator::new(&rules, catalog).validate(draft, mode, limits)
}

/// Savability with the default rule set.
pub fn is_savable(
    draft: &CharacterDraft,
    mode: EditMode,
    limits: &AccountLimits,
    catalog: &TriggerCatalog,
) -> bool {
    validate(draft, mode, limits, catalog).is_empty()
}
