//! The draft being edited, with snapshot history.
//!
//! Every write builds a new draft from the current one and swaps the `Arc`,
//! so snapshots handed out by [`DraftStore::get`] never change underneath
//! their holders. The same snapshots back undo/redo.

use std::collections::VecDeque;
use std::sync::Arc;

use trionforge_domain::{CharacterDraft, DomainError, FieldPath, FieldUpdate, FieldValue};

/// Undo entries kept per store.
pub const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone)]
pub struct DraftStore {
    current: Arc<CharacterDraft>,
    initial: Arc<CharacterDraft>,
    undo: VecDeque<Arc<CharacterDraft>>,
    redo: Vec<Arc<CharacterDraft>>,
    history_limit: usize,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new(CharacterDraft::default())
    }
}

impl DraftStore {
    pub fn new(initial: CharacterDraft) -> Self {
        Self::with_history_limit(initial, HISTORY_LIMIT)
    }

    pub fn with_history_limit(initial: CharacterDraft, history_limit: usize) -> Self {
        let initial = Arc::new(initial);
        Self {
            current: initial.clone(),
            initial,
            undo: VecDeque::new(),
            redo: Vec::new(),
            history_limit,
        }
    }

    /// Read-only snapshot of the current draft.
    pub fn get(&self) -> Arc<CharacterDraft> {
        self.current.clone()
    }

    /// Apply a typed update. On error the draft and history are unchanged.
    pub fn set_field(&mut self, update: FieldUpdate) -> Result<Arc<CharacterDraft>, DomainError> {
        let mut next = CharacterDraft::clone(&self.current);
        next.apply(update)?;
        if next == *self.current {
            return Ok(self.get());
        }
        self.commit(next);
        Ok(self.get())
    }

    /// Apply an update addressed by dotted path, e.g. `"stats.trion"`.
    pub fn set_path(
        &mut self,
        path: &str,
        value: FieldValue,
    ) -> Result<Arc<CharacterDraft>, DomainError> {
        let update = path.parse::<FieldPath>()?.with_value(value)?;
        self.set_field(update)
    }

    /// Adjust the current draft in place without recording history.
    ///
    /// Used for values the session imposes rather than the user edits.
    pub fn amend(&mut self, f: impl FnOnce(&mut CharacterDraft)) {
        let mut next = CharacterDraft::clone(&self.current);
        f(&mut next);
        self.current = Arc::new(next);
    }

    /// Swap in a whole draft. Clears history.
    pub fn replace(&mut self, draft: CharacterDraft) {
        self.current = Arc::new(draft);
        self.undo.clear();
        self.redo.clear();
    }

    /// Back to the draft the store was created with. Clears history.
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Step back one write. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo.pop_back() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.current, previous);
                self.redo.push(current);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.current, next);
                self.push_undo(current);
                true
            }
            None => false,
        }
    }

    fn commit(&mut self, next: CharacterDraft) {
        let previous = std::mem::replace(&mut self.current, Arc::new(next));
        self.push_undo(previous);
        self.redo.clear();
    }

    fn push_undo(&mut self, snapshot: Arc<CharacterDraft>) {
        if self.history_limit == 0 {
            return;
        }
        if self.undo.len() == self.history_limit {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trionforge_domain::{SlotKind, StatKind, SLOT_CAPACITY};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_snapshot_survives_later_writes() {
        let mut store = DraftStore::default();
        store.set_path("stats.trion", FieldValue::Number(3)).unwrap();

        let before = store.get();
        store.set_path("stats.trion", FieldValue::Number(6)).unwrap();

        assert_eq!(before.stats.trion, 3);
        assert_eq!(store.get().stats.trion, 6);
    }

    #[test]
    fn test_write_keeps_untouched_fields() {
        let mut store = DraftStore::default();
        store
            .set_field(FieldUpdate::Slots(SlotKind::Main, names(&["弧月", "旋空"])))
            .unwrap();
        let before = store.get();
        store.set_field(FieldUpdate::Name("太刀川".into())).unwrap();

        assert_eq!(before.name, "");
        assert_eq!(store.get().triggers, before.triggers);
    }

    #[test]
    fn test_invalid_path_leaves_draft_untouched() {
        let mut store = DraftStore::default();
        let before = store.get();

        let err = store
            .set_path("stats.unknown", FieldValue::Number(1))
            .unwrap_err();
        assert_eq!(err, DomainError::invalid_path("stats.unknown"));
        assert!(Arc::ptr_eq(&before, &store.get()));
        assert!(!store.can_undo());
    }

    #[test]
    fn test_store_refuses_fifth_slot() {
        let mut store = DraftStore::default();
        let four = names(&["弧月", "旋空", "シールド", "バッグワーム"]);
        store
            .set_field(FieldUpdate::Slots(SlotKind::Main, four.clone()))
            .unwrap();

        let mut five = four.clone();
        five.push("グラスホッパー".into());
        let err = store
            .set_field(FieldUpdate::Slots(SlotKind::Main, five))
            .unwrap_err();
        assert_eq!(err, DomainError::container_full(5, 4));

        let err = store
            .set_field(FieldUpdate::Slot(SlotKind::Main, SLOT_CAPACITY, "x".into()))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.get().triggers.main, four);
    }

    #[test]
    fn test_slot_write_pads_and_clear_empties() {
        let mut store = DraftStore::default();
        store
            .set_path("triggers.sub.2", FieldValue::Text("シールド".into()))
            .unwrap();
        assert_eq!(store.get().triggers.sub, names(&["", "", "シールド"]));

        store
            .set_path("triggers.sub.2", FieldValue::Text(String::new()))
            .unwrap();
        assert_eq!(store.get().triggers.sub, names(&["", "", ""]));
    }

    #[test]
    fn test_undo_redo_walks_history() {
        let mut store = DraftStore::default();
        store.set_field(FieldUpdate::Stat(StatKind::Attack, 7)).unwrap();
        store.set_field(FieldUpdate::Stat(StatKind::Attack, 9)).unwrap();

        assert!(store.undo());
        assert_eq!(store.get().stats.attack, 7);
        assert!(store.undo());
        assert_eq!(store.get().stats.attack, 0);
        assert!(!store.undo());

        assert!(store.redo());
        assert_eq!(store.get().stats.attack, 7);

        // A new write drops the redo branch.
        store.set_field(FieldUpdate::Stat(StatKind::Attack, 8)).unwrap();
        assert!(!store.can_redo());
        assert!(!store.redo());
        assert_eq!(store.get().stats.attack, 8);
    }

    #[test]
    fn test_no_op_write_adds_no_history() {
        let mut store = DraftStore::default();
        store.set_field(FieldUpdate::Name(String::new())).unwrap();
        assert!(!store.can_undo());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut store = DraftStore::with_history_limit(CharacterDraft::default(), 3);
        for v in 1..=5 {
            store.set_field(FieldUpdate::Stat(StatKind::Speed, v)).unwrap();
        }
        let mut steps = 0;
        while store.undo() {
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert_eq!(store.get().stats.speed, 2);
    }

    #[test]
    fn test_amend_skips_history_and_keeps_snapshots() {
        let mut store = DraftStore::default();
        store.set_field(FieldUpdate::Stat(StatKind::Range, 4)).unwrap();
        let before = store.get();

        store.amend(|d| d.stats.trion = 7);
        assert_eq!(before.stats.trion, 0);
        assert_eq!(store.get().stats.trion, 7);

        assert!(store.undo());
        assert!(!store.can_undo());
        assert_eq!(store.get().stats.range, 0);
    }

    #[test]
    fn test_replace_and_reset_clear_history() {
        let mut store = DraftStore::new(CharacterDraft::new("blank"));
        store.set_field(FieldUpdate::Name("edited".into())).unwrap();

        store.replace(CharacterDraft::new("loaded"));
        assert_eq!(store.get().name, "loaded");
        assert!(!store.can_undo());

        store.set_field(FieldUpdate::Name("again".into())).unwrap();
        store.reset();
        assert_eq!(store.get().name, "blank");
        assert!(!store.can_undo());
        assert!(!store.can_redo());
    }
}
