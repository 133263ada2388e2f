//! TrionForge domain.
//!
//! Pure types and rules for the character builder: the draft being edited,
//! the trigger catalog, account limits, and the validation engine that
//! decides whether a draft can be saved. Nothing in this crate performs I/O.

pub mod catalog;
pub mod entities;
pub mod error;
pub mod ids;
pub mod validation;
pub mod value_objects;

pub use catalog::{TriggerCatalog, TriggerCatalogEntry, TriggerType};

pub use entities::{CharacterDraft, CharacterRecord, FieldPath, FieldUpdate, FieldValue};

pub use error::DomainError;

pub use ids::{CharacterId, SessionId, UserId};

pub use validation::{
    is_savable, validate, StatBounds, StatRules, StatSummary, Validator, Violation, ViolationSet,
};

pub use value_objects::{
    is_empty_slot, normalize_email, AccountLimits, EditMode, Identity, LimitPolicy, SlotKind,
    StatKind, Stats, TriggerSlots, VipAllowList, FIXED_TRION_KEY, MAX_STAT_TOTAL_KEY,
    SLOT_CAPACITY,
};
