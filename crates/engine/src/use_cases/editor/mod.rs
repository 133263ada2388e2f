//! Character editor sessions.
//!
//! One session edits one draft for at most one signed-in account. It owns the
//! edit mode and the resolved limits, re-validates after every change, and
//! gates saving on an empty violation set.

mod error;

pub use error::EditorError;

use std::sync::Arc;

use serde::Serialize;
use trionforge_domain::{
    CharacterDraft, CharacterId, CharacterRecord, EditMode, FieldPath, FieldUpdate, FieldValue,
    Identity, StatBounds, StatKind, StatRules, StatSummary, TriggerCatalog, Validator,
    ViolationSet, VipAllowList,
};

use crate::infrastructure::ports::{CharacterRepo, ClockPort};
use crate::stores::DraftStore;
use crate::use_cases::limits::{LimitProvider, ResolvedLimits};

/// Shared collaborators every session needs.
#[derive(Clone)]
pub struct EditorContext {
    pub catalog: Arc<TriggerCatalog>,
    pub rules: Arc<StatRules>,
    pub vip: Arc<VipAllowList>,
    pub limits: Arc<LimitProvider>,
    pub characters: Arc<dyn CharacterRepo>,
    pub clock: Arc<dyn ClockPort>,
}

/// How one stat input should be rendered under the current mode and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatField {
    pub stat: StatKind,
    pub label: &'static str,
    #[serde(flatten)]
    pub bounds: StatBounds,
    /// Single legal value; edits are refused.
    pub locked: bool,
}

/// Everything a client needs to render the editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub identity: Option<Identity>,
    pub mode: EditMode,
    pub vip_eligible: bool,
    pub limits: ResolvedLimits,
    pub draft: CharacterDraft,
    pub fields: Vec<StatField>,
    pub summary: StatSummary,
    pub violations: ViolationSet,
    pub savable: bool,
    pub loaded_character_id: Option<CharacterId>,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub struct EditorSession {
    ctx: EditorContext,
    identity: Option<Identity>,
    mode: EditMode,
    limits: ResolvedLimits,
    draft: DraftStore,
    loaded: Option<CharacterId>,
}

impl EditorSession {
    /// A signed-out session drafting against session-only limits.
    pub fn new(ctx: EditorContext) -> Self {
        let limits = ctx.limits.generate_ephemeral();
        let mut session = Self {
            ctx,
            identity: None,
            mode: EditMode::Standard,
            limits,
            draft: DraftStore::default(),
            loaded: None,
        };
        session.enforce_mode();
        session
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn limits(&self) -> ResolvedLimits {
        self.limits
    }

    pub fn draft(&self) -> Arc<CharacterDraft> {
        self.draft.get()
    }

    pub fn loaded_character(&self) -> Option<CharacterId> {
        self.loaded
    }

    pub fn is_vip_eligible(&self) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| self.ctx.vip.is_eligible(identity))
    }

    /// Attach an account. Resolves its limits and drops VIP mode if the
    /// account is not eligible.
    pub async fn sign_in(&mut self, identity: Identity) {
        let same_account = self.identity.as_ref().map(|i| i.id) == Some(identity.id);
        if !same_account {
            self.loaded = None;
        }

        self.limits = self.ctx.limits.resolve(identity.id).await;
        if self.mode.is_vip() && !self.ctx.vip.is_eligible(&identity) {
            self.mode = EditMode::Standard;
        }
        tracing::info!(
            user_id = %identity.id,
            source = ?self.limits.source,
            mode = %self.mode,
            "Editor session signed in"
        );
        self.identity = Some(identity);
        self.enforce_mode();
    }

    /// Detach the account. The draft is kept; mode returns to standard.
    pub fn sign_out(&mut self) {
        if let Some(identity) = self.identity.take() {
            self.ctx.limits.forget_ephemeral(identity.id);
            tracing::info!(user_id = %identity.id, "Editor session signed out");
        }
        self.mode = EditMode::Standard;
        self.loaded = None;
        self.limits = self.ctx.limits.generate_ephemeral();
        self.enforce_mode();
    }

    pub fn set_mode(&mut self, mode: EditMode) -> Result<(), EditorError> {
        if mode.is_vip() && !self.is_vip_eligible() {
            return Err(EditorError::NotVipEligible);
        }
        self.mode = mode;
        self.enforce_mode();
        Ok(())
    }

    /// Apply one edit and return the resulting violations.
    pub fn update(&mut self, update: FieldUpdate) -> Result<ViolationSet, EditorError> {
        if let FieldUpdate::Stat(stat, _) = update {
            if self.stat_bounds(stat).is_fixed() {
                return Err(EditorError::FieldLocked(update.path()));
            }
        }
        self.draft.set_field(update)?;
        Ok(self.violations())
    }

    /// Apply one edit addressed by dotted path.
    pub fn update_path(
        &mut self,
        path: &str,
        value: FieldValue,
    ) -> Result<ViolationSet, EditorError> {
        let update = path.parse::<FieldPath>()?.with_value(value)?;
        self.update(update)
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.draft.undo();
        self.enforce_mode();
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.draft.redo();
        self.enforce_mode();
        moved
    }

    /// Start a fresh character, detached from any saved record.
    pub fn new_character(&mut self) {
        self.draft.reset();
        self.loaded = None;
        self.enforce_mode();
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(&self.ctx.rules, &self.ctx.catalog)
    }

    fn stat_bounds(&self, stat: StatKind) -> StatBounds {
        self.validator().bounds(stat, self.mode, &self.limits.limits)
    }

    /// Per-stat labels and bounds, trion first.
    pub fn stat_fields(&self) -> Vec<StatField> {
        StatKind::all()
            .into_iter()
            .map(|stat| {
                let bounds = self.stat_bounds(stat);
                StatField {
                    stat,
                    label: stat.display_name(),
                    bounds,
                    locked: bounds.is_fixed(),
                }
            })
            .collect()
    }

    pub fn violations(&self) -> ViolationSet {
        self.validator()
            .validate(&self.draft.get(), self.mode, &self.limits.limits)
    }

    pub fn summary(&self) -> StatSummary {
        self.validator()
            .summary(&self.draft.get().stats, self.mode, &self.limits.limits)
    }

    pub fn is_savable(&self) -> bool {
        self.identity.is_some() && self.violations().is_empty()
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let violations = self.violations();
        EditorSnapshot {
            identity: self.identity.clone(),
            mode: self.mode,
            vip_eligible: self.is_vip_eligible(),
            limits: self.limits,
            draft: CharacterDraft::clone(&self.draft.get()),
            fields: self.stat_fields(),
            summary: self.summary(),
            savable: self.identity.is_some() && violations.is_empty(),
            violations,
            loaded_character_id: self.loaded,
            can_undo: self.draft.can_undo(),
            can_redo: self.draft.can_redo(),
        }
    }

    /// Persist the draft.
    ///
    /// A draft loaded from a record overwrites that record; otherwise a new
    /// record is created. On failure the session is unchanged.
    pub async fn save(&mut self) -> Result<CharacterRecord, EditorError> {
        let identity = self.identity.clone().ok_or(EditorError::NotSignedIn)?;

        let violations = self.violations();
        if !violations.is_empty() {
            tracing::debug!(
                user_id = %identity.id,
                violations = %violations,
                "Rejected save of invalid draft"
            );
            return Err(EditorError::Invalid(violations));
        }

        let draft = self.draft.get();
        let now = self.ctx.clock.now();
        let existing = match self.loaded {
            Some(id) => self
                .ctx
                .characters
                .get(id)
                .await?
                .filter(|record| record.user_id == identity.id),
            None => None,
        };
        let record = match existing {
            Some(mut record) => {
                record.update_from(&draft, now);
                record
            }
            None => CharacterRecord::create(identity.id, &draft, now),
        };

        self.ctx.characters.upsert(&record).await?;
        self.loaded = Some(record.id);
        tracing::info!(
            user_id = %identity.id,
            character_id = %record.id,
            "Saved character"
        );
        Ok(record)
    }

    /// The account's saved characters, most recently updated first.
    pub async fn list_saved(&self) -> Result<Vec<CharacterRecord>, EditorError> {
        let identity = self.identity.as_ref().ok_or(EditorError::NotSignedIn)?;
        Ok(self.ctx.characters.list(identity.id).await?)
    }

    /// Replace the draft with a saved character.
    pub async fn load(&mut self, id: CharacterId) -> Result<ViolationSet, EditorError> {
        let record = self.owned_record(id).await?;
        self.draft.replace(record.to_draft());
        self.loaded = Some(record.id);
        self.enforce_mode();
        tracing::debug!(character_id = %id, "Loaded character into editor");
        Ok(self.violations())
    }

    /// Delete a saved character. The draft stays, detached if it was loaded
    /// from the deleted record.
    pub async fn delete(&mut self, id: CharacterId) -> Result<(), EditorError> {
        let record = self.owned_record(id).await?;
        self.ctx.characters.delete(id).await?;
        if self.loaded == Some(id) {
            self.loaded = None;
        }
        tracing::info!(
            user_id = %record.user_id,
            character_id = %id,
            "Deleted character"
        );
        Ok(())
    }

    async fn owned_record(&self, id: CharacterId) -> Result<CharacterRecord, EditorError> {
        let identity = self.identity.as_ref().ok_or(EditorError::NotSignedIn)?;
        match self.ctx.characters.get(id).await? {
            Some(record) if record.user_id == identity.id => Ok(record),
            _ => Err(EditorError::CharacterNotFound(id)),
        }
    }

    /// Standard mode pins trion to the account's fixed value.
    fn enforce_mode(&mut self) {
        if self.mode.is_vip() {
            return;
        }
        let fixed = self.limits.limits.fixed_trion;
        if self.draft.get().stats.trion != fixed {
            self.draft.amend(|draft| draft.stats.trion = fixed);
        }
    }
}
