//! Value objects - Immutable objects defined by their attributes

mod edit_mode;
mod limits;
mod stat;
mod trigger_slots;

// Editing mode and VIP gating
pub use edit_mode::{normalize_email, EditMode, Identity, VipAllowList};

// Account limits and their generation policy
pub use limits::{AccountLimits, LimitPolicy, FIXED_TRION_KEY, MAX_STAT_TOTAL_KEY};

pub use stat::{StatKind, Stats};

pub use trigger_slots::{is_empty_slot, SlotKind, TriggerSlots, SLOT_CAPACITY};
